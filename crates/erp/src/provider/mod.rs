//! Upstream API adapters.

mod http;
mod traits;

pub mod payables_api;
pub mod receivables_api;

pub(crate) use http::HttpClient;
pub use traits::ErpAdapter;

use cashsync_core::errors::{Error, UpstreamError};

use crate::models::Endpoint;

/// Pages fetched before an endpoint is considered runaway.
pub(crate) const MAX_PAGES: usize = 10_000;

pub(crate) fn unsupported_endpoint(source_id: &str, endpoint: Endpoint) -> Error {
    Error::Upstream(UpstreamError::MalformedRequest {
        source_id: source_id.to_string(),
        message: format!("endpoint '{}' is not served by this source", endpoint),
    })
}

pub(crate) fn page_limit_exceeded(source_id: &str, endpoint: Endpoint) -> Error {
    Error::Upstream(UpstreamError::SchemaMismatch {
        source_id: source_id.to_string(),
        message: format!(
            "endpoint '{}' kept returning pages after {} requests",
            endpoint, MAX_PAGES
        ),
    })
}
