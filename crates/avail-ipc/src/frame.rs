use std::io::{self, Read, Write};

/// Message code of an availability batch.
pub const AVAILABILITY_REQUEST: u32 = 1;

/// Bytes before the payload: `code: u32`, `size: u32`, both little-endian.
pub const HEADER_SIZE: usize = 8;

pub fn write_message<W: Write>(w: &mut W, code: u32, data: &[u8]) -> io::Result<()> {
    let size = u32::try_from(data.len()).map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "message too large"))?;

    let mut header = [0u8; HEADER_SIZE];
    header[..4].copy_from_slice(&code.to_le_bytes());
    header[4..].copy_from_slice(&size.to_le_bytes());

    w.write_all(&header)?;
    w.write_all(data)?;
    w.flush()
}

pub fn read_message<R: Read>(r: &mut R) -> io::Result<(u32, Vec<u8>)> {
    let mut header = [0u8; HEADER_SIZE];
    r.read_exact(&mut header)?;

    let code = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);
    let size = u32::from_le_bytes([header[4], header[5], header[6], header[7]]) as usize;

    let mut data = vec![0u8; size];
    r.read_exact(&mut data)?;
    Ok((code, data))
}
