//! Upstream source contracts consumed by the orchestrator.
//!
//! Concrete implementations live in the `cashsync-erp` crate: each one wraps an
//! HTTP adapter, records every successful fetch in the payload ledger, and runs
//! the schema normalizer before handing canonical records back.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::canonical::{ContractRecord, EntityRecord, Installment, Payable};
use crate::errors::Result;
use crate::ledger::LedgerOutcome;
use crate::period::RefPeriod;
use crate::sync::CancellationFlag;

/// Date window sent to upstream endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl FetchWindow {
    pub fn for_period(period: RefPeriod) -> Self {
        Self {
            start: period.first_day(),
            end: period.last_day(),
        }
    }
}

/// Per-call context shared by every fetch of a run.
#[derive(Debug, Clone)]
pub struct FetchContext {
    pub period: RefPeriod,
    pub cancel: CancellationFlag,
}

impl FetchContext {
    pub fn new(period: RefPeriod, cancel: CancellationFlag) -> Self {
        Self { period, cancel }
    }

    pub fn window(&self) -> FetchWindow {
        FetchWindow::for_period(self.period)
    }
}

/// A record the normalizer refused. The rest of the batch is still used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordIssue {
    pub record_id: Option<String>,
    pub message: String,
}

/// Normalized result of one logical fetch.
#[derive(Debug, Clone)]
pub struct Fetched<T> {
    pub records: Vec<T>,
    pub rejected: Vec<RecordIssue>,
    pub ledger: LedgerOutcome,
    pub content_hash: String,
}

impl<T> Fetched<T> {
    pub fn new(records: Vec<T>, ledger: LedgerOutcome, content_hash: impl Into<String>) -> Self {
        Self {
            records,
            rejected: Vec::new(),
            ledger,
            content_hash: content_hash.into(),
        }
    }

    pub fn with_rejected(mut self, rejected: Vec<RecordIssue>) -> Self {
        self.rejected = rejected;
        self
    }
}

/// Upstream that owns entities, contracts and receivable installments.
#[async_trait]
pub trait ReceivablesSource: Send + Sync {
    fn id(&self) -> &str;

    async fn fetch_entities(&self, ctx: &FetchContext) -> Result<Fetched<EntityRecord>>;

    async fn fetch_contracts(&self, ctx: &FetchContext) -> Result<Fetched<ContractRecord>>;

    /// Installment book of one entity as of the end of `ctx.period`.
    async fn fetch_installments(
        &self,
        entity_id: &str,
        ctx: &FetchContext,
    ) -> Result<Fetched<Installment>>;
}

/// Upstream that owns payables. Its records carry no entity id.
#[async_trait]
pub trait PayablesSource: Send + Sync {
    fn id(&self) -> &str;

    /// Payables due or paid within `ctx.period`.
    async fn fetch_payables(&self, ctx: &FetchContext) -> Result<Fetched<Payable>>;
}
