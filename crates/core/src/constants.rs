//! Defaults for the sync pipeline.
//!
//! Every value here is only a default for [`crate::config::SyncSettings`];
//! logic never reads these directly.

/// Days of settlement lag tolerated before an installment counts as overdue.
pub const DEFAULT_GRACE_PERIOD_DAYS: i64 = 3;

/// Maximum number of periods a backfill may cover without `force`.
pub const DEFAULT_MAX_BACKFILL_PERIODS: usize = 24;

/// Minimum fraction of transactional records that must match a resolution key.
pub const DEFAULT_MIN_JOIN_COVERAGE: f64 = 0.01;

/// Concurrent entity pipelines. Measured against the upstream throttling:
/// more workers increased retries and wall-clock time.
pub const DEFAULT_WORKER_POOL_SIZE: usize = 2;

/// Uncategorized share of cash-out volume that raises an alert.
pub const DEFAULT_UNCATEGORIZED_ALERT_RATIO: f64 = 0.10;

/// Number of failures kept verbatim in a run report.
pub const DEFAULT_ERROR_SAMPLE_SIZE: usize = 20;

/// Display-name markers of entities that never count as active.
pub const DEFAULT_EXCLUSION_PATTERNS: &[&str] = &[r"(?i)\b(test|teste|demo)\b"];

/// Decimal places kept for persisted valuation figures.
pub const VALUATION_SCALE: u32 = 6;

/// Category used for cash-out codes with no configured mapping.
pub const UNCATEGORIZED: &str = "uncategorized";
