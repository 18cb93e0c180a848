//! Runtime settings of the sync pipeline.
//!
//! Everything here can be re-tuned without a code change. The runner loads
//! these from a JSON file; missing fields take the defaults below.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::constants::{
    DEFAULT_ERROR_SAMPLE_SIZE, DEFAULT_EXCLUSION_PATTERNS, DEFAULT_GRACE_PERIOD_DAYS,
    DEFAULT_MAX_BACKFILL_PERIODS, DEFAULT_MIN_JOIN_COVERAGE, DEFAULT_UNCATEGORIZED_ALERT_RATIO,
    DEFAULT_WORKER_POOL_SIZE,
};
use crate::errors::{Error, Result};
use crate::valuation::ValuationSettings;

/// How payables (which carry no entity id) are attributed to entities.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinStrategy {
    /// Counterparty code looked up in the contract resolution index.
    #[default]
    CounterpartyCode,
    /// No join: cash-out is not produced and payables are counted as skipped.
    Disabled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SyncSettings {
    pub worker_pool_size: usize,
    pub grace_period_days: i64,
    pub max_backfill_periods: usize,
    pub min_join_coverage: f64,
    pub join_strategy: JoinStrategy,
    pub exclusion_patterns: Vec<String>,
    /// Upstream document-type code -> cash-out category.
    pub cash_out_categories: HashMap<String, String>,
    pub uncategorized_alert_ratio: f64,
    pub error_sample_size: usize,
    /// Re-derive entities whose payload hash did not change.
    pub reprocess_unchanged: bool,
    pub valuation: ValuationSettings,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            worker_pool_size: DEFAULT_WORKER_POOL_SIZE,
            grace_period_days: DEFAULT_GRACE_PERIOD_DAYS,
            max_backfill_periods: DEFAULT_MAX_BACKFILL_PERIODS,
            min_join_coverage: DEFAULT_MIN_JOIN_COVERAGE,
            join_strategy: JoinStrategy::default(),
            exclusion_patterns: DEFAULT_EXCLUSION_PATTERNS
                .iter()
                .map(|p| p.to_string())
                .collect(),
            cash_out_categories: HashMap::new(),
            uncategorized_alert_ratio: DEFAULT_UNCATEGORIZED_ALERT_RATIO,
            error_sample_size: DEFAULT_ERROR_SAMPLE_SIZE,
            reprocess_unchanged: false,
            valuation: ValuationSettings::default(),
        }
    }
}

impl SyncSettings {
    pub fn validate(&self) -> Result<()> {
        if self.worker_pool_size == 0 {
            return Err(Error::InvalidConfigValue(
                "worker_pool_size must be at least 1".to_string(),
            ));
        }
        if self.grace_period_days < 0 {
            return Err(Error::InvalidConfigValue(format!(
                "grace_period_days must not be negative, got {}",
                self.grace_period_days
            )));
        }
        if !(0.0..=1.0).contains(&self.min_join_coverage) {
            return Err(Error::InvalidConfigValue(format!(
                "min_join_coverage must be within [0, 1], got {}",
                self.min_join_coverage
            )));
        }
        if !(0.0..=1.0).contains(&self.uncategorized_alert_ratio) {
            return Err(Error::InvalidConfigValue(format!(
                "uncategorized_alert_ratio must be within [0, 1], got {}",
                self.uncategorized_alert_ratio
            )));
        }
        Ok(())
    }
}
