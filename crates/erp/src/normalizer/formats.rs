//! Lenient field deserializers for upstream payloads.
//!
//! Upstreams send amounts as strings or numbers, ids as strings or numbers,
//! and dates in per-source formats.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use serde_json::Number;
use std::str::FromStr;

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    String(String),
    Number(Number),
    Null,
}

fn parse_decimal_value(value: &str) -> Result<Decimal, String> {
    let trimmed = value.trim();
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .map_err(|e| format!("Invalid decimal value '{}': {}", value, e))
}

fn parse_iso(value: &str) -> Result<NaiveDate, String> {
    let trimmed = value.trim();
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .or_else(|_| NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S").map(|dt| dt.date()))
        .map_err(|_| format!("Invalid date '{}', expected YYYY-MM-DD", value))
}

fn parse_dmy(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value.trim(), "%d/%m/%Y")
        .map_err(|_| format!("Invalid date '{}', expected DD/MM/YYYY", value))
}

fn optional_scalar<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Scalar>::deserialize(deserializer)?;
    Ok(match raw {
        None | Some(Scalar::Null) => None,
        Some(Scalar::String(s)) if s.trim().is_empty() => None,
        Some(Scalar::String(s)) => Some(s.trim().to_string()),
        Some(Scalar::Number(n)) => Some(n.to_string()),
    })
}

pub mod decimal {
    use super::*;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = optional_scalar(deserializer)?
            .ok_or_else(|| serde::de::Error::custom("amount is missing"))?;
        parse_decimal_value(&raw).map_err(serde::de::Error::custom)
    }
}

pub mod option_decimal {
    use super::*;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
    where
        D: Deserializer<'de>,
    {
        optional_scalar(deserializer)?
            .map(|raw| parse_decimal_value(&raw))
            .transpose()
            .map_err(serde::de::Error::custom)
    }
}

/// Identifier sent as a string or a number.
pub mod id {
    use super::*;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        optional_scalar(deserializer)?.ok_or_else(|| serde::de::Error::custom("id is missing"))
    }
}

pub mod option_id {
    use super::*;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        optional_scalar(deserializer)
    }
}

pub mod iso_date {
    use super::*;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse_iso(&raw).map_err(serde::de::Error::custom)
    }
}

pub mod option_iso_date {
    use super::*;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            Some(raw) if !raw.trim().is_empty() => {
                parse_iso(&raw).map(Some).map_err(serde::de::Error::custom)
            }
            _ => Ok(None),
        }
    }
}

pub mod dmy_date {
    use super::*;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse_dmy(&raw).map_err(serde::de::Error::custom)
    }
}

pub mod option_dmy_date {
    use super::*;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            Some(raw) if !raw.trim().is_empty() => {
                parse_dmy(&raw).map(Some).map_err(serde::de::Error::custom)
            }
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[derive(Deserialize)]
    struct WireSample {
        #[serde(with = "decimal")]
        amount: Decimal,
        #[serde(default, with = "option_decimal")]
        paid: Option<Decimal>,
        #[serde(with = "id")]
        id: String,
        #[serde(with = "dmy_date")]
        due: NaiveDate,
        #[serde(default, with = "option_iso_date")]
        settled: Option<NaiveDate>,
    }

    #[test]
    fn test_lenient_scalars() {
        let sample: WireSample = serde_json::from_value(json!({
            "amount": "1.5e3",
            "paid": 12.25,
            "id": 1001,
            "due": "05/02/2025",
            "settled": "2025-02-07T00:00:00"
        }))
        .unwrap();

        assert_eq!(sample.amount, dec!(1500));
        assert_eq!(sample.paid, Some(dec!(12.25)));
        assert_eq!(sample.id, "1001");
        assert_eq!(sample.due, NaiveDate::from_ymd_opt(2025, 2, 5).unwrap());
        assert_eq!(sample.settled, NaiveDate::from_ymd_opt(2025, 2, 7));
    }

    #[test]
    fn test_blank_optionals_are_none() {
        let sample: WireSample = serde_json::from_value(json!({
            "amount": 1,
            "paid": "",
            "id": "A",
            "due": "01/01/2025",
            "settled": null
        }))
        .unwrap();
        assert_eq!(sample.paid, None);
        assert_eq!(sample.settled, None);
    }

    #[test]
    fn test_wrong_date_format_is_rejected() {
        let result = serde_json::from_value::<WireSample>(json!({
            "amount": 1,
            "id": "A",
            "due": "2025-01-01"
        }));
        assert!(result.is_err());
    }
}
