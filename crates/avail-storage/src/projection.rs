use avail_core::{InterfaceAvailability, StatusField};

use crate::traits::AvailabilityStore;

pub const INTERFACE_TABLE: &str = "interface";

/// Column length of `interface.error`, in characters.
pub const INTERFACE_ERROR_LEN: usize = 2048;

fn field_len(table: &str, field: &str) -> Option<usize> {
    match (table, field) {
        (INTERFACE_TABLE, "error") => Some(INTERFACE_ERROR_LEN),
        _ => None,
    }
}

/// Drop NUL bytes, cut the value to the column length on a char boundary and double
/// single quotes. SQL text ends at the first NUL, so one must never reach a statement.
pub fn escape_field(table: &str, field: &str, value: &str) -> String {
    let value: String = value.chars().filter(|c| *c != '\0').collect();
    let value = match field_len(table, field).and_then(|len| value.char_indices().nth(len)) {
        Some((cut, _)) => &value[..cut],
        None => value.as_str(),
    };
    value.replace('\'', "''")
}

/// Partial `update` touching only the dirty columns of `ia`.
///
/// Returns `None` for a record with nothing dirty; callers skip it.
pub fn build_update<S: AvailabilityStore + ?Sized>(ia: &InterfaceAvailability, store: &S) -> Option<String> {
    if !ia.is_dirty() {
        return None;
    }

    let status = &ia.status;
    let mut sql = format!("update {} set", INTERFACE_TABLE);
    let mut delim = ' ';

    for field in status.dirty.iter() {
        let column = match field {
            StatusField::Available => format!("available={}", status.available.as_u8()),
            StatusField::Error => {
                let error_esc = store.escape_field(INTERFACE_TABLE, "error", &status.error);
                format!("error='{}'", error_esc)
            }
            StatusField::ErrorsFrom => format!("errors_from={}", status.errors_from),
            StatusField::DisableUntil => format!("disable_until={}", status.disable_until),
        };
        sql.push(delim);
        sql.push_str(&column);
        delim = ',';
    }

    sql.push_str(&format!(" where interfaceid={}", ia.interface_id));
    Some(sql)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use avail_core::Available;

    #[test]
    fn clean_record_builds_nothing() {
        let store = MemoryStore::new();
        assert_eq!(build_update(&InterfaceAvailability::new(5), &store), None);
    }

    #[test]
    fn available_and_error() {
        let store = MemoryStore::new();
        let mut ia = InterfaceAvailability::new(5);
        ia.set_available(Available::Unavailable);
        ia.set_error("timeout");
        assert_eq!(
            build_update(&ia, &store).unwrap(),
            "update interface set available=0,error='timeout' where interfaceid=5"
        );
    }

    #[test]
    fn single_field_touches_one_column() {
        let store = MemoryStore::new();
        let cases = [
            (StatusField::Available, "update interface set available=1 where interfaceid=9"),
            (StatusField::Error, "update interface set error='' where interfaceid=9"),
            (StatusField::ErrorsFrom, "update interface set errors_from=10 where interfaceid=9"),
            (StatusField::DisableUntil, "update interface set disable_until=20 where interfaceid=9"),
        ];
        for (field, expected) in cases {
            let mut ia = InterfaceAvailability::new(9);
            ia.status.available = Available::Available;
            ia.status.errors_from = 10;
            ia.status.disable_until = 20;
            ia.status.dirty.insert(field);
            assert_eq!(build_update(&ia, &store).unwrap(), expected);
        }
    }

    #[test]
    fn full_status_in_column_order() {
        let store = MemoryStore::new();
        let mut ia = InterfaceAvailability::new(2);
        ia.set_status(Available::Available, "", 0, 0);
        assert_eq!(
            build_update(&ia, &store).unwrap(),
            "update interface set available=1,error='',errors_from=0,disable_until=0 where interfaceid=2"
        );
    }

    #[test]
    fn quotes_are_escaped() {
        let store = MemoryStore::new();
        let mut ia = InterfaceAvailability::new(1);
        ia.set_error("can't connect");
        assert_eq!(
            build_update(&ia, &store).unwrap(),
            "update interface set error='can''t connect' where interfaceid=1"
        );
    }

    #[test]
    fn nul_bytes_are_dropped_from_error_text() {
        let store = MemoryStore::new();
        let mut ia = InterfaceAvailability::new(2);
        ia.set_error("bad\0byte\0");
        assert_eq!(
            build_update(&ia, &store).unwrap(),
            "update interface set error='badbyte' where interfaceid=2"
        );
    }

    #[test]
    fn error_is_truncated_to_column_length() {
        let long = "é".repeat(INTERFACE_ERROR_LEN + 10);
        let esc = escape_field(INTERFACE_TABLE, "error", &long);
        assert_eq!(esc.chars().count(), INTERFACE_ERROR_LEN);

        let other = escape_field("hosts", "name", &long);
        assert_eq!(other.chars().count(), INTERFACE_ERROR_LEN + 10);
    }
}
