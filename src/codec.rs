//! Conversions between caller keys/values and the opaque bytes on the wire

use crate::error::{Error, Result};
use crate::proto::TColumnValue;

/// Column family every value is written under.
pub const FAMILY: &[u8] = b"cf";
/// Column qualifier every value is written under.
pub const QUALIFIER: &[u8] = b"a";

pub fn encode_key(key: &str) -> Vec<u8> {
    key.as_bytes().to_vec()
}

/// Row keys are opaque bytes; anything that is not UTF-8 is rendered lossily.
pub fn decode_key(row: &[u8]) -> String {
    String::from_utf8_lossy(row).into_owned()
}

/// Builds the single cell a write carries.
pub fn column_value(value: &str) -> TColumnValue {
    TColumnValue {
        family: FAMILY.to_vec(),
        qualifier: QUALIFIER.to_vec(),
        value: value.as_bytes().to_vec(),
        timestamp: None,
    }
}

/// Decodes the first cell of a row. `row` names the row in the error when
/// there is nothing to decode.
pub fn decode_value(row: &[u8], columns: &[TColumnValue]) -> Result<String> {
    match columns.first() {
        Some(cell) => Ok(String::from_utf8_lossy(&cell.value).into_owned()),
        None => Err(Error::MissingValue(decode_key(row))),
    }
}

/// The smallest key sorting strictly after `row`: the same bytes plus `0x00`.
pub fn closest_row_after(row: &[u8]) -> Vec<u8> {
    let mut next = Vec::with_capacity(row.len() + 1);
    next.extend_from_slice(row);
    next.push(0x00);
    next
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closest_row_after_is_immediate_successor() {
        let rows: [&[u8]; 5] = [b"", b"a", b"row-10", b"\xff\xff", b"a\x00"];
        for row in rows {
            let next = closest_row_after(row);
            assert!(next.as_slice() > row);
            assert_eq!(&next[..row.len()], row);
            assert_eq!(next.len(), row.len() + 1);
            // any one-byte extension of `row` sorts at or after `next`
            for b in 0..=255u8 {
                let mut ext = row.to_vec();
                ext.push(b);
                assert!(ext >= next);
            }
        }
    }

    #[test]
    fn test_closest_row_after_sorts_before_siblings() {
        let next = closest_row_after(b"a");
        assert!(next.as_slice() < &b"a\x01"[..]);
        assert!(next.as_slice() < &b"b"[..]);
    }

    #[test]
    fn test_decode_value_reads_first_cell() {
        let cells = vec![column_value("100"), column_value("ignored")];
        assert_eq!(decode_value(b"a", &cells).unwrap(), "100");
    }

    #[test]
    fn test_decode_value_without_cells() {
        let err = decode_value(b"a", &[]).unwrap_err();
        assert!(matches!(err, Error::MissingValue(ref row) if row == "a"));
    }

    #[test]
    fn test_column_value_uses_fixed_family() {
        let cell = column_value("v");
        assert_eq!(cell.family, FAMILY);
        assert_eq!(cell.qualifier, QUALIFIER);
        assert_eq!(encode_key("k"), b"k".to_vec());
    }
}
