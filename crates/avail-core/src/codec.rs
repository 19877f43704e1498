//! Flat byte encoding of availability batches.
//!
//! Each record is `interfaceid: u64`, `fields: u8`, then only the dirty fields in
//! column order: `available: u8`, `error: str`, `errors_from: i32`, `disable_until: i32`.
//! Integers are little-endian. A string is a `u32` length counting a trailing NUL,
//! the bytes, then the NUL; length 0 is an empty string.

use thiserror::Error;

use crate::{Available, InterfaceAvailability, StatusField, StatusFields};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum DecodeError {
    #[error("unexpected end of data at offset {offset}: need {need} bytes")]
    Truncated { offset: usize, need: usize },

    #[error("interface {interface_id}: unknown field bits {raw:#04x}")]
    UnknownFields { interface_id: u64, raw: u8 },

    #[error("interface {interface_id}: invalid availability value {raw}")]
    InvalidAvailable { interface_id: u64, raw: u8 },

    #[error("interface {interface_id}: error text is not NUL terminated")]
    MissingNul { interface_id: u64 },

    #[error("interface {interface_id}: error text is not valid UTF-8")]
    InvalidUtf8 { interface_id: u64 },
}

/// Encode a batch in order. Duplicate interface ids are kept as separate records.
pub fn serialize(batch: &[InterfaceAvailability]) -> Vec<u8> {
    let mut buf = Vec::new();
    for ia in batch {
        serialize_into(&mut buf, ia);
    }
    buf
}

/// Append one record to `buf`.
pub fn serialize_into(buf: &mut Vec<u8>, ia: &InterfaceAvailability) {
    let status = &ia.status;

    buf.extend_from_slice(&ia.interface_id.get().to_le_bytes());
    buf.push(status.dirty.bits());

    for field in status.dirty.iter() {
        match field {
            StatusField::Available => buf.push(status.available.as_u8()),
            StatusField::Error => write_str(buf, &status.error),
            StatusField::ErrorsFrom => buf.extend_from_slice(&status.errors_from.to_le_bytes()),
            StatusField::DisableUntil => buf.extend_from_slice(&status.disable_until.to_le_bytes()),
        }
    }
}

fn write_str(buf: &mut Vec<u8>, s: &str) {
    let len = (s.len() + 1) as u32;
    buf.extend_from_slice(&len.to_le_bytes());
    buf.extend_from_slice(s.as_bytes());
    buf.push(0);
}

/// Decode a whole batch. Fields not present in a record's set keep their defaults.
pub fn deserialize(data: &[u8]) -> Result<Vec<InterfaceAvailability>, DecodeError> {
    let mut reader = Reader { data, offset: 0 };
    let mut out = Vec::new();

    while !reader.is_empty() {
        out.push(reader.record()?);
    }

    Ok(out)
}

struct Reader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    fn is_empty(&self) -> bool {
        self.offset >= self.data.len()
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        let end = self
            .offset
            .checked_add(n)
            .filter(|end| *end <= self.data.len())
            .ok_or(DecodeError::Truncated { offset: self.offset, need: n })?;
        let data = self.data;
        let out = &data[self.offset..end];
        self.offset = end;
        Ok(out)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.array::<1>()?[0])
    }

    fn record(&mut self) -> Result<InterfaceAvailability, DecodeError> {
        let interface_id = u64::from_le_bytes(self.array()?);
        let raw = self.u8()?;
        let fields = StatusFields::from_bits(raw).ok_or(DecodeError::UnknownFields { interface_id, raw })?;

        let mut ia = InterfaceAvailability::new(interface_id);
        for field in fields.iter() {
            match field {
                StatusField::Available => {
                    let raw = self.u8()?;
                    let available =
                        Available::from_u8(raw).ok_or(DecodeError::InvalidAvailable { interface_id, raw })?;
                    ia.set_available(available);
                }
                StatusField::Error => {
                    let error = self.string(interface_id)?;
                    ia.set_error(error);
                }
                StatusField::ErrorsFrom => ia.set_errors_from(i32::from_le_bytes(self.array()?)),
                StatusField::DisableUntil => ia.set_disable_until(i32::from_le_bytes(self.array()?)),
            }
        }

        Ok(ia)
    }

    fn string(&mut self, interface_id: u64) -> Result<String, DecodeError> {
        let len = u32::from_le_bytes(self.array()?) as usize;
        if len == 0 {
            return Ok(String::new());
        }
        let bytes = self.take(len)?;
        let (nul, text) = bytes.split_last().ok_or(DecodeError::MissingNul { interface_id })?;
        if *nul != 0 {
            return Err(DecodeError::MissingNul { interface_id });
        }
        String::from_utf8(text.to_vec()).map_err(|_| DecodeError::InvalidUtf8 { interface_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_record_is_id_and_empty_set() {
        let buf = serialize(&[InterfaceAvailability::new(7)]);
        assert_eq!(buf, vec![7, 0, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn only_dirty_fields_are_written() {
        let mut ia = InterfaceAvailability::new(1);
        ia.set_errors_from(0x0102_0304);
        ia.status.disable_until = 99; // not marked, must not be encoded

        let buf = serialize(&[ia]);
        assert_eq!(buf.len(), 8 + 1 + 4);
        assert_eq!(buf[8], StatusField::ErrorsFrom.bit());
        assert_eq!(&buf[9..], &[0x04, 0x03, 0x02, 0x01]);
    }

    #[test]
    fn error_string_counts_trailing_nul() {
        let mut ia = InterfaceAvailability::new(1);
        ia.set_error("ab");
        let buf = serialize(&[ia]);
        assert_eq!(&buf[9..], &[3, 0, 0, 0, b'a', b'b', 0]);
    }

    #[test]
    fn zero_length_string_decodes_empty() {
        let mut buf = 3u64.to_le_bytes().to_vec();
        buf.push(StatusField::Error.bit());
        buf.extend_from_slice(&0u32.to_le_bytes());

        let out = deserialize(&buf).unwrap();
        assert_eq!(out[0].status.error, "");
        assert!(out[0].dirty().contains(StatusField::Error));
    }

    #[test]
    fn truncated_input_is_rejected() {
        let mut ia = InterfaceAvailability::new(1);
        ia.set_status(Available::Available, "x", 1, 2);
        let buf = serialize(&[ia]);
        let err = deserialize(&buf[..buf.len() - 1]).unwrap_err();
        assert!(matches!(err, DecodeError::Truncated { .. }));
    }

    #[test]
    fn unknown_bits_are_rejected() {
        let mut buf = 9u64.to_le_bytes().to_vec();
        buf.push(0x20);
        assert_eq!(deserialize(&buf), Err(DecodeError::UnknownFields { interface_id: 9, raw: 0x20 }));
    }

    #[test]
    fn bad_availability_is_rejected() {
        let mut buf = 9u64.to_le_bytes().to_vec();
        buf.push(StatusField::Available.bit());
        buf.push(7);
        assert_eq!(deserialize(&buf), Err(DecodeError::InvalidAvailable { interface_id: 9, raw: 7 }));
    }
}
