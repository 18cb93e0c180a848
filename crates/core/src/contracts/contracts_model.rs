//! Resolution key models.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a contract as reported upstream.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ContractStatus {
    Active,
    Settled,
    Cancelled,
    Suspended,
    /// Unrecognized upstream status, kept verbatim.
    Unknown(String),
}

impl ContractStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Active => "active",
            Self::Settled => "settled",
            Self::Cancelled => "cancelled",
            Self::Suspended => "suspended",
            Self::Unknown(raw) => raw.as_str(),
        }
    }
}

impl From<&str> for ContractStatus {
    fn from(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "active" | "ativo" | "a" => Self::Active,
            "settled" | "quitado" | "paid_off" | "q" => Self::Settled,
            "cancelled" | "canceled" | "cancelado" | "c" => Self::Cancelled,
            "suspended" | "suspenso" | "s" => Self::Suspended,
            _ => Self::Unknown(value.trim().to_string()),
        }
    }
}

impl From<String> for ContractStatus {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<ContractStatus> for String {
    fn from(status: ContractStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for ContractStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Slowly-changing mapping from a transaction-level contract code to its entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionKey {
    pub code: String,
    pub entity_id: String,
    pub status: ContractStatus,
    pub refreshed_at: NaiveDateTime,
}
