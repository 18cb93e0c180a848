//! Persistence contracts used by the orchestrator.

use async_trait::async_trait;
use rust_decimal::Decimal;

use super::sync_model::{CanonicalBundle, PersistSummary, RunReport};
use crate::errors::Result;
use crate::period::RefPeriod;

/// Canonical tables (cash-in, cash-out, balances, portfolio stats, delinquency).
#[async_trait]
pub trait CanonicalStoreTrait: Send + Sync {
    /// Upserts the bundle and prunes rows of the (entity, period) partition
    /// that are no longer part of it, atomically.
    async fn persist_bundle(&self, bundle: CanonicalBundle) -> Result<PersistSummary>;

    /// Stored closing balance of (entity, period), if that period was synced.
    fn closing_balance(&self, entity_id: &str, period: RefPeriod) -> Result<Option<Decimal>>;

    /// `input_hash` of the last bundle persisted for (entity, period).
    fn input_hash(&self, entity_id: &str, period: RefPeriod) -> Result<Option<String>>;
}

/// Storage for finished run reports.
#[async_trait]
pub trait SyncRunRepositoryTrait: Send + Sync {
    async fn save_run(&self, report: RunReport) -> Result<()>;

    fn get_recent(&self, limit: i64) -> Result<Vec<RunReport>>;
}
