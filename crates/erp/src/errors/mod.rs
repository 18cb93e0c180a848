//! Mapping of HTTP-level failures onto [`UpstreamError`].
//!
//! | Condition | Error | Retry |
//! |-----------|-------|-------|
//! | timeout, connection reset, 5xx, 408 | `Transient` | policy backoff |
//! | 429 | `RateLimited` | longer backoff, `Retry-After` honoured |
//! | 401, 403 | `Auth` | never, aborts the run |
//! | other 4xx | `MalformedRequest` | never |
//! | undecodable body | `SchemaMismatch` | never |

use std::time::Duration;

use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::StatusCode;

pub use cashsync_core::errors::{RetryClass, UpstreamError};

/// Longest body excerpt kept in error messages.
const BODY_EXCERPT_LEN: usize = 200;

fn excerpt(body: &str) -> String {
    let trimmed = body.trim();
    match trimmed.char_indices().nth(BODY_EXCERPT_LEN) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}

/// Classifies a non-success HTTP status.
pub fn classify_status(
    source_id: &str,
    status: StatusCode,
    retry_after: Option<Duration>,
    body: &str,
) -> UpstreamError {
    let source_id = source_id.to_string();
    let message = format!("HTTP {}: {}", status.as_u16(), excerpt(body));

    match status {
        StatusCode::TOO_MANY_REQUESTS => UpstreamError::RateLimited {
            source_id,
            retry_after,
        },
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            UpstreamError::Auth { source_id, message }
        }
        StatusCode::REQUEST_TIMEOUT => UpstreamError::Transient { source_id, message },
        s if s.is_server_error() => UpstreamError::Transient { source_id, message },
        _ => UpstreamError::MalformedRequest { source_id, message },
    }
}

/// Classifies a transport-level `reqwest` failure.
pub fn classify_transport(source_id: &str, err: &reqwest::Error) -> UpstreamError {
    let source_id = source_id.to_string();
    if err.is_decode() {
        return UpstreamError::SchemaMismatch {
            source_id,
            message: err.to_string(),
        };
    }
    if err.is_builder() {
        return UpstreamError::MalformedRequest {
            source_id,
            message: err.to_string(),
        };
    }
    // timeouts, connect errors, resets mid-body
    UpstreamError::Transient {
        source_id,
        message: err.to_string(),
    }
}

/// `Retry-After` in its delta-seconds form. HTTP-date values are ignored.
pub fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

pub fn schema_mismatch(source_id: &str, message: impl Into<String>) -> UpstreamError {
    UpstreamError::SchemaMismatch {
        source_id: source_id.to_string(),
        message: message.into(),
    }
}
