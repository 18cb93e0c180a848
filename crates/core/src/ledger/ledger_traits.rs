//! Ledger repository trait.

use async_trait::async_trait;

use super::ledger_model::{LedgerOutcome, RawPayloadAudit};
use crate::errors::Result;

/// Append-only store keyed by (source, period, content_hash), plus the head
/// hash of each (source, period).
#[async_trait]
pub trait PayloadLedgerTrait: Send + Sync {
    /// Records a fetch, reports whether it matches the current head, then
    /// moves the head to this hash.
    ///
    /// Audit rows are never duplicated: an already-known (source, period,
    /// hash) only moves the head.
    async fn record(&self, audit: RawPayloadAudit) -> Result<LedgerOutcome>;
}
