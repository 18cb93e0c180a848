//! Ledger models and content hashing.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::period::RefPeriod;

/// One unique upstream fetch. Never updated once inserted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPayloadAudit {
    /// Source and scope, e.g. `RECEIVABLES_API/installments/ENT-1`.
    pub source: String,
    pub period: RefPeriod,
    pub content_hash: String,
    pub fetched_at: NaiveDateTime,
    pub record_count: i64,
    /// Raw body as received, kept for audit.
    pub payload: Option<String>,
}

/// Whether a fetched payload differs from the head of its source and period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerOutcome {
    /// Differs from the head, or no head yet.
    New,
    /// Same hash as the head.
    Unchanged,
}

impl LedgerOutcome {
    pub fn is_unchanged(&self) -> bool {
        matches!(self, Self::Unchanged)
    }
}

/// SHA-256 of the payload, hex encoded.
///
/// Callers hash a canonical serialization (records sorted by id) so that
/// upstream pagination order does not change the hash.
pub fn content_hash(payload: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(payload);
    hex::encode(hasher.finalize())
}
