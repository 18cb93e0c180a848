//! Canonical cash-flow models.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::{Error, ValidationError};
use crate::period::RefPeriod;

/// Forecast (expected by the due date) or actual (confirmed at settlement).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordType {
    Forecast,
    Actual,
}

impl RecordType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Forecast => "forecast",
            Self::Actual => "actual",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "forecast" => Ok(Self::Forecast),
            "actual" => Ok(Self::Actual),
            other => Err(Error::Validation(ValidationError::InvalidInput(format!(
                "unknown record type '{}'",
                other
            )))),
        }
    }
}

/// Cash-in category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CashInCategory {
    /// Settled in the month it was due.
    Current,
    /// Settled after the month it was due (late collection).
    Recovery,
    /// Settled before the month it was due (early collection).
    Prepayment,
    /// Forecast of a canonical installment; no settlement decision yet.
    Scheduled,
    /// Origin outside the canonical contract and amortization table.
    Other,
}

impl CashInCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Current => "current",
            Self::Recovery => "recovery",
            Self::Prepayment => "prepayment",
            Self::Scheduled => "scheduled",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for CashInCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CashInCategory {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "current" => Ok(Self::Current),
            "recovery" => Ok(Self::Recovery),
            "prepayment" => Ok(Self::Prepayment),
            "scheduled" => Ok(Self::Scheduled),
            "other" => Ok(Self::Other),
            other => Err(Error::Validation(ValidationError::InvalidInput(format!(
                "unknown cash-in category '{}'",
                other
            )))),
        }
    }
}

/// Natural key: (entity_id, ref_period, category, record_type, origin_id).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashInRecord {
    pub entity_id: String,
    pub ref_period: RefPeriod,
    pub category: CashInCategory,
    pub record_type: RecordType,
    pub amount: Decimal,
    /// Upstream installment id.
    pub origin_id: String,
    pub detail: Option<serde_json::Value>,
}

/// Natural key: (entity_id, ref_period, category, record_type, origin_id).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashOutRecord {
    pub entity_id: String,
    pub ref_period: RefPeriod,
    /// Mapped category, or `uncategorized`.
    pub category: String,
    pub record_type: RecordType,
    pub amount: Decimal,
    /// Upstream payable id.
    pub origin_id: String,
    pub detail: Option<serde_json::Value>,
}

/// Cash position of an entity for a period.
///
/// `closing = opening + Σ cash_in.actual − Σ cash_out.actual`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Balance {
    pub entity_id: String,
    pub ref_period: RefPeriod,
    pub opening: Decimal,
    pub closing: Decimal,
}

impl Balance {
    pub fn compute(
        entity_id: &str,
        ref_period: RefPeriod,
        opening: Decimal,
        cash_in: &[CashInRecord],
        cash_out: &[CashOutRecord],
    ) -> Self {
        let collected: Decimal = cash_in
            .iter()
            .filter(|r| r.record_type == RecordType::Actual)
            .map(|r| r.amount)
            .sum();
        let paid: Decimal = cash_out
            .iter()
            .filter(|r| r.record_type == RecordType::Actual)
            .map(|r| r.amount)
            .sum();
        Self {
            entity_id: entity_id.to_string(),
            ref_period,
            opening,
            closing: opening + collected - paid,
        }
    }
}
