//! Column conversion helpers.
//!
//! Amounts are stored as TEXT to keep full decimal precision, and periods as
//! `YYYY-MM`.

use rust_decimal::Decimal;
use std::str::FromStr;

use cashsync_core::period::RefPeriod;

use crate::errors::StorageError;

pub fn parse_decimal(column: &str, value: &str) -> Result<Decimal, StorageError> {
    Decimal::from_str(value).map_err(|e| {
        StorageError::SerializationError(format!("{} holds '{}': {}", column, value, e))
    })
}

pub fn parse_period(value: &str) -> Result<RefPeriod, StorageError> {
    RefPeriod::from_str(value).map_err(|e| {
        StorageError::SerializationError(format!("invalid period '{}': {}", value, e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_helpers() {
        assert_eq!(parse_decimal("amount", "12.50").unwrap().to_string(), "12.50");
        assert!(parse_decimal("amount", "abc").is_err());
        assert_eq!(parse_period("2025-03").unwrap().month(), 3);
        assert!(parse_period("2025-13").is_err());
    }
}
