//! Canonical DTOs produced by the schema normalizer.
//!
//! Every upstream shape is mapped into these types before any business rule
//! runs. Fields that some upstreams only return on request are `Option`s.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::contracts::ContractStatus;

/// How an installment came to exist in the upstream receivables system.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallmentOrigin {
    /// Installment of the signed sales contract.
    CanonicalContract,
    /// Installment generated from an amortization table.
    AmortizationTable,
    /// Placeholder generated by a renegotiation; its principal is already
    /// reflected in the renegotiated contract.
    Renegotiation,
    /// Any other upstream origin code, kept verbatim.
    Other(String),
}

impl InstallmentOrigin {
    /// Origins whose cash-in is classified and whose balance is valued.
    pub fn is_canonical(&self) -> bool {
        matches!(self, Self::CanonicalContract | Self::AmortizationTable)
    }

    pub fn from_code(code: &str) -> Self {
        match code.trim().to_ascii_uppercase().as_str() {
            "CT" | "CONTRACT" | "CANONICAL_CONTRACT" => Self::CanonicalContract,
            "TP" | "AMORTIZATION" | "AMORTIZATION_TABLE" => Self::AmortizationTable,
            "RN" | "RENEGOTIATION" => Self::Renegotiation,
            other => Self::Other(other.to_string()),
        }
    }
}

/// Upstream-computed present value components, only returned by expanded responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresentValueBreakdown {
    pub principal: Decimal,
    pub accrued_interest: Decimal,
    pub penalty: Decimal,
    pub monetary_correction: Decimal,
}

impl PresentValueBreakdown {
    pub fn total(&self) -> Decimal {
        self.principal + self.accrued_interest + self.penalty + self.monetary_correction
    }
}

/// A receivable installment of a sales contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Installment {
    /// Upstream identifier, used as `origin_id` of derived records.
    pub id: String,
    pub entity_id: String,
    pub contract_code: String,
    pub origin: InstallmentOrigin,
    pub due_date: NaiveDate,
    pub amount: Decimal,
    pub settlement_date: Option<NaiveDate>,
    pub paid_amount: Option<Decimal>,
    pub present_value: Option<PresentValueBreakdown>,
}

impl Installment {
    pub fn is_settled(&self) -> bool {
        self.settlement_date.is_some()
    }

    /// Amount actually collected, falling back to the nominal amount.
    pub fn collected_amount(&self) -> Decimal {
        self.paid_amount.unwrap_or(self.amount)
    }
}

/// A payable (cash-out) record. Carries no entity id, only a counterparty code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payable {
    pub id: String,
    pub counterparty_code: Option<String>,
    pub document_type: Option<String>,
    pub due_date: NaiveDate,
    pub amount: Decimal,
    pub paid_date: Option<NaiveDate>,
    pub paid_amount: Option<Decimal>,
    pub description: Option<String>,
}

/// Authoritative contract row used to build the resolution index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractRecord {
    pub code: String,
    pub entity_id: String,
    pub status: ContractStatus,
}

/// Business entity row (development, company) as reported upstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityRecord {
    pub id: String,
    pub display_name: String,
}
