//! SQLite storage implementation for the canonical cash-flow tables.

mod model;
mod repository;

pub use model::{BalanceDB, CashInRecordDB, CashOutRecordDB, DelinquencyBucketDB, PortfolioStatsDB};
pub use repository::CanonicalStoreRepository;
