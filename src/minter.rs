//! Sequential box numbers: `PREFIX` + at least three digits.
//!
//! The next number is one more than the count of boxes already numbered
//! under the prefix by the cable type that owns it. Boxes of a type with a
//! longer prefix (`CAT6001` next to `CAT`) are not counted. Counting only
//! makes sense while the prefix is locked, so [`next_number`] takes the lock
//! itself and must be called inside the transaction that inserts the box.

use crate::store::{StoreError, StoreTx};

/// Zero-padded width of the sequence part
pub const SEQUENCE_WIDTH: usize = 3;

pub fn format_number(prefix: &str, sequence: i64) -> String {
    format!("{prefix}{sequence:0width$}", width = SEQUENCE_WIDTH)
}

/// True when `number` is `prefix` followed by one or more ASCII digits
pub fn is_numbered_under(number: &str, prefix: &str) -> bool {
    number
        .strip_prefix(prefix)
        .map_or(false, |rest| !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()))
}

/// Lock `prefix` for this transaction and mint its next box number
pub fn next_number(tx: &mut dyn StoreTx, prefix: &str) -> Result<String, StoreError> {
    tx.lock_prefix(prefix)?;
    let existing = tx.count_numbered_boxes(prefix)?;
    Ok(format_number(prefix, existing + 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_pads_to_three() {
        assert_eq!(format_number("CAT6", 1), "CAT6001");
        assert_eq!(format_number("CAT6", 42), "CAT6042");
        assert_eq!(format_number("FO", 1000), "FO1000");
    }

    #[test]
    fn test_numbered_under() {
        assert!(is_numbered_under("CAT001", "CAT"));
        assert!(is_numbered_under("CAT6001", "CAT6"));
        assert!(!is_numbered_under("CAT6A001", "CAT6"));
        assert!(!is_numbered_under("CAT", "CAT"));
        assert!(!is_numbered_under("UTP001", "CAT"));
    }
}
