//! Adapter trait implemented by every upstream API.

use async_trait::async_trait;

use cashsync_core::errors::Result;
use cashsync_core::sources::FetchWindow;
use cashsync_core::sync::CancellationFlag;

use crate::models::{Endpoint, FetchFilters, RawRecord};

/// One upstream HTTP API.
///
/// Implementations own authentication, date formatting, pagination, retries
/// and rate limiting. They return every page of the endpoint concatenated,
/// without interpreting the records.
#[async_trait]
pub trait ErpAdapter: Send + Sync {
    /// Constant identifier such as `"RECEIVABLES_API"`, used in errors,
    /// logs and ledger source names.
    fn id(&self) -> &'static str;

    /// Endpoints this adapter serves.
    fn endpoints(&self) -> &'static [Endpoint];

    async fn fetch(
        &self,
        endpoint: Endpoint,
        window: &FetchWindow,
        filters: &FetchFilters,
        cancel: &CancellationFlag,
    ) -> Result<Vec<RawRecord>>;
}
