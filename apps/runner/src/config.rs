//! Runner configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, bail, Context};
use chrono::Utc;

use cashsync_core::config::SyncSettings;
use cashsync_core::entities::EntityFilter;
use cashsync_core::period::{PeriodRange, RefPeriod};
use cashsync_erp::{AuthScheme, RateLimitConfig, SourceConfig};

/// What a single invocation does after the optional index refresh.
#[derive(Debug, Clone)]
pub enum Job {
    Incremental { period: RefPeriod },
    Backfill {
        range: PeriodRange,
        max_periods: Option<usize>,
        force: bool,
    },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: String,
    pub settings: SyncSettings,
    pub receivables: SourceConfig,
    pub payables: SourceConfig,
    pub store_raw_payloads: bool,
    pub refresh_index: bool,
    pub entity_filter: EntityFilter,
    pub job: Job,
}

fn var(name: &str) -> Option<String> {
    env::var(name).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn required(name: &str) -> anyhow::Result<String> {
    var(name).ok_or_else(|| anyhow!("{} is not set", name))
}

fn flag(name: &str) -> bool {
    matches!(
        var(name).as_deref().map(str::to_ascii_lowercase).as_deref(),
        Some("1" | "true" | "yes")
    )
}

fn parsed<T>(name: &str) -> anyhow::Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    var(name)
        .map(|raw| raw.parse::<T>().map_err(|e| anyhow!("{} is invalid: {}", name, e)))
        .transpose()
}

fn period(name: &str) -> anyhow::Result<Option<RefPeriod>> {
    var(name)
        .map(|raw| raw.parse::<RefPeriod>().with_context(|| format!("{} is invalid", name)))
        .transpose()
}

/// The month before the current one.
fn previous_period() -> RefPeriod {
    RefPeriod::of(Utc::now().date_naive()).pred()
}

fn source(prefix: &str, auth: AuthScheme) -> anyhow::Result<SourceConfig> {
    let mut config = SourceConfig::new(required(&format!("{}_URL", prefix))?, auth);
    if let Some(page_size) = parsed::<u32>(&format!("{}_PAGE_SIZE", prefix))? {
        config = config.with_page_size(page_size);
    }
    if let Some(rpm) = parsed::<u32>(&format!("{}_REQUESTS_PER_MINUTE", prefix))? {
        config = config.with_rate_limit(RateLimitConfig {
            requests_per_minute: rpm,
            ..RateLimitConfig::default()
        });
    }
    if let Some(secs) = parsed::<u64>(&format!("{}_TIMEOUT_SECS", prefix))? {
        config = config.with_timeout(Duration::from_secs(secs));
    }
    Ok(config)
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let settings = match var("CASHSYNC_SETTINGS_FILE") {
            Some(path) => {
                let path = PathBuf::from(path);
                let raw = std::fs::read_to_string(&path)
                    .with_context(|| format!("cannot read {}", path.display()))?;
                serde_json::from_str::<SyncSettings>(&raw)
                    .with_context(|| format!("invalid settings in {}", path.display()))?
            }
            None => SyncSettings::default(),
        };

        let receivables = source(
            "CASHSYNC_RECEIVABLES",
            AuthScheme::Bearer {
                token: required("CASHSYNC_RECEIVABLES_TOKEN")?,
            },
        )?;
        let payables = source(
            "CASHSYNC_PAYABLES",
            AuthScheme::DualToken {
                integration_token: required("CASHSYNC_PAYABLES_INTEGRATION_TOKEN")?,
                session_token: required("CASHSYNC_PAYABLES_SESSION_TOKEN")?,
            },
        )?;

        let entity_filter = match var("CASHSYNC_ENTITIES") {
            Some(ids) => EntityFilter::ids(
                ids.split(',')
                    .map(str::trim)
                    .filter(|id| !id.is_empty())
                    .map(str::to_string),
            ),
            None => EntityFilter::All,
        };

        let job = match (period("CASHSYNC_BACKFILL_FROM")?, period("CASHSYNC_BACKFILL_TO")?) {
            (Some(start), Some(end)) => Job::Backfill {
                range: PeriodRange::new(start, end)?,
                max_periods: parsed("CASHSYNC_BACKFILL_MAX_PERIODS")?,
                force: flag("CASHSYNC_BACKFILL_FORCE"),
            },
            (None, None) => Job::Incremental {
                period: period("CASHSYNC_PERIOD")?.unwrap_or_else(previous_period),
            },
            _ => bail!("CASHSYNC_BACKFILL_FROM and CASHSYNC_BACKFILL_TO must be set together"),
        };

        Ok(Self {
            data_dir: var("CASHSYNC_DATA_DIR").unwrap_or_else(|| "./data".to_string()),
            settings,
            receivables,
            payables,
            store_raw_payloads: flag("CASHSYNC_STORE_RAW_PAYLOADS"),
            refresh_index: flag("CASHSYNC_REFRESH_INDEX"),
            entity_filter,
            job,
        })
    }
}
