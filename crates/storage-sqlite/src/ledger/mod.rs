//! SQLite storage implementation for the raw payload ledger.

mod model;
mod repository;

pub use model::{LedgerHeadDB, RawPayloadAuditDB};
pub use repository::PayloadLedgerRepository;
