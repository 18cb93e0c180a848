//! Cashsync ERP Crate
//!
//! Upstream access for the sync core: HTTP adapters for each ERP-style API,
//! the schema normalizer that maps raw payloads onto canonical DTOs, and the
//! gateways that implement the core's source traits.
//!
//! # Architecture
//!
//! ```text
//! +------------------+
//! |   ErpAdapter     |  (auth, date format, pagination, retry, rate limit)
//! +------------------+
//!          |  Vec<RawRecord>
//!          v
//! +------------------+
//! |     Gateway      |  (records the payload in the ledger)
//! +------------------+
//!          |
//!          v
//! +------------------+
//! |   Normalizer     |  (tagged Minimal/Expanded parsing, per-record rejects)
//! +------------------+
//!          |  Fetched<Installment>, Fetched<Payable>, ...
//!          v
//! +------------------+
//! | SyncOrchestrator |  (cashsync-core)
//! +------------------+
//! ```

pub mod config;
pub mod errors;
pub mod gateway;
pub mod models;
pub mod normalizer;
pub mod provider;
pub mod rate_limiter;
pub mod retry;

pub use config::{AuthScheme, SourceConfig};
pub use gateway::{PayablesGateway, ReceivablesGateway};
pub use models::{Endpoint, FetchFilters, RawRecord, ResponseShape};
pub use provider::payables_api::PayablesApiAdapter;
pub use provider::receivables_api::ReceivablesApiAdapter;
pub use provider::ErpAdapter;
pub use rate_limiter::{RateLimitConfig, RateLimiter};
pub use retry::{BackoffStrategy, RetryPolicy, Sleeper, TokioSleeper};
