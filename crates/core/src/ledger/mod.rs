//! Raw payload ledger - append-only audit and idempotency store for upstream fetches.

mod ledger_model;
mod ledger_traits;

pub use ledger_model::{content_hash, LedgerOutcome, RawPayloadAudit};
pub use ledger_traits::PayloadLedgerTrait;
