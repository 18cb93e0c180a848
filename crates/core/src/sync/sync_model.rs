//! Run report and canonical bundle models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::aging::DelinquencyBucket;
use crate::cashflow::{Balance, CashInRecord, CashOutRecord, CategorizationAlert};
use crate::period::RefPeriod;
use crate::valuation::PortfolioStats;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunMode {
    Incremental,
    Backfill,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    #[default]
    Running,
    Success,
    Partial,
    Failed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counters {
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// One failure kept verbatim in the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityFailure {
    /// `None` when the failure hit the whole period (e.g. the payables fetch).
    pub entity_id: Option<String>,
    pub period: RefPeriod,
    pub error: String,
    pub fatal: bool,
}

/// Report-ready notice for the downstream reporting layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownstreamSignal {
    pub run_id: String,
    pub period: RefPeriod,
    /// Entities whose canonical rows are current for the period.
    pub entity_ids: Vec<String>,
    pub emitted_at: DateTime<Utc>,
}

/// Outcome of one orchestrator run.
///
/// In backfill mode entity counters count (entity, period) pairs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub id: String,
    pub mode: RunMode,
    pub periods: Vec<RefPeriod>,
    pub status: RunStatus,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub entities: Counters,
    pub records: Counters,
    /// Bounded sample; `failure_count` holds the full number.
    pub failures: Vec<EntityFailure>,
    pub failure_count: usize,
    pub warnings: Vec<CategorizationAlert>,
    pub aborted_reason: Option<String>,
    pub cancelled: bool,
    pub downstream_signal: Option<DownstreamSignal>,
}

impl RunReport {
    pub fn new(mode: RunMode, periods: Vec<RefPeriod>) -> Self {
        Self {
            id: uuid::Uuid::now_v7().to_string(),
            mode,
            periods,
            status: RunStatus::Running,
            started_at: Utc::now(),
            finished_at: None,
            entities: Counters::default(),
            records: Counters::default(),
            failures: Vec::new(),
            failure_count: 0,
            warnings: Vec::new(),
            aborted_reason: None,
            cancelled: false,
            downstream_signal: None,
        }
    }

    pub fn record_failure(&mut self, failure: EntityFailure, sample_size: usize) {
        self.failure_count += 1;
        if self.failures.len() < sample_size {
            self.failures.push(failure);
        }
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted_reason.is_some()
    }

    /// Derives the final status from the counters.
    pub fn finish(&mut self) {
        self.status = if self.aborted_reason.is_some() && !self.cancelled {
            RunStatus::Failed
        } else if self.entities.failed == 0 && !self.cancelled {
            RunStatus::Success
        } else if self.entities.succeeded > 0 {
            RunStatus::Partial
        } else if self.entities.skipped > 0 && !self.cancelled {
            RunStatus::Partial
        } else {
            RunStatus::Failed
        };
        self.finished_at = Some(Utc::now());
    }
}

/// Everything derived for one (entity, period), written in one transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalBundle {
    pub entity_id: String,
    pub period: RefPeriod,
    pub cash_in: Vec<CashInRecord>,
    pub cash_out: Vec<CashOutRecord>,
    pub balance: Balance,
    pub portfolio_stats: PortfolioStats,
    pub delinquency: Vec<DelinquencyBucket>,
    /// Fingerprint of everything the bundle was derived from. Stored with the
    /// rows, it tells the next run whether re-deriving can be skipped.
    pub input_hash: String,
}

impl CanonicalBundle {
    pub fn record_count(&self) -> usize {
        self.cash_in.len() + self.cash_out.len()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistSummary {
    pub upserted: usize,
    pub pruned: usize,
}
