//! Core error types for the cashsync pipeline.
//!
//! This module defines database-agnostic error types. Storage-specific errors
//! (from Diesel, SQLite, etc.) are converted to these types by the storage layer,
//! and HTTP-level failures are classified into [`UpstreamError`] by the adapters.

use chrono::ParseError as ChronoParseError;
use rust_decimal::Decimal;
use std::time::Duration;
use thiserror::Error;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the sync core.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Database operation failed: {0}")]
    Database(#[from] DatabaseError),

    #[error("Upstream request failed: {0}")]
    Upstream(#[from] UpstreamError),

    #[error("Input validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error(
        "Join coverage too low: {matched} of {total} transactional records matched a known \
         resolution key ({coverage:.4} < {threshold})"
    )]
    JoinCoverage {
        matched: usize,
        total: usize,
        coverage: f64,
        threshold: f64,
    },

    #[error(
        "Backfill of {requested} periods exceeds the configured limit of {limit} periods \
         (set force to override)"
    )]
    BackfillLimitExceeded { requested: usize, limit: usize },

    #[error("Valuation failed: {0}")]
    Valuation(String),

    #[error("Invalid configuration value: {0}")]
    InvalidConfigValue(String),

    #[error("Run cancelled")]
    Cancelled,

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl Error {
    /// Fatal errors abort the entire run, not just the current entity.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Upstream(UpstreamError::Auth { .. }))
    }
}

/// Database-agnostic error type for storage operations.
///
/// This enum uses `String` for all error details, allowing the storage layer
/// to convert storage-specific errors (Diesel, SQLite, etc.) into this format.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to establish a database connection.
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Failed to create or configure the connection pool.
    #[error("Failed to create database pool: {0}")]
    PoolCreationFailed(String),

    /// A database query failed to execute.
    #[error("Database query failed: {0}")]
    QueryFailed(String),

    /// The requested record was not found.
    #[error("Record not found: {0}")]
    NotFound(String),

    /// A unique constraint was violated (e.g., duplicate key).
    #[error("Unique constraint violation: {0}")]
    UniqueViolation(String),

    /// Database migration failed.
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Internal/unexpected database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

/// Classification of upstream failures.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RetryClass {
    /// Retry with the policy's regular backoff.
    WithBackoff,
    /// Retry with the longer rate-limit backoff.
    RateLimitBackoff,
    /// Terminal for this request.
    Never,
}

/// Errors raised while talking to an upstream ERP API.
#[derive(Error, Debug, Clone)]
pub enum UpstreamError {
    /// Timeouts, connection resets and 5xx responses.
    #[error("Transient network error from {source_id}: {message}")]
    Transient { source_id: String, message: String },

    /// HTTP 429. `retry_after` is taken from the response header when present.
    #[error("Rate limited by {source_id}")]
    RateLimited {
        source_id: String,
        retry_after: Option<Duration>,
    },

    /// Credentials rejected (401/403). Aborts the whole run.
    #[error("Authentication rejected by {source_id}: {message}")]
    Auth { source_id: String, message: String },

    /// The upstream refused the request as malformed (400/404/422).
    #[error("Malformed request to {source_id}: {message}")]
    MalformedRequest { source_id: String, message: String },

    /// The response body could not be decoded into the expected shape.
    #[error("Schema mismatch from {source_id}: {message}")]
    SchemaMismatch { source_id: String, message: String },
}

impl UpstreamError {
    pub fn retry_class(&self) -> RetryClass {
        match self {
            Self::Transient { .. } => RetryClass::WithBackoff,
            Self::RateLimited { .. } => RetryClass::RateLimitBackoff,
            Self::Auth { .. } | Self::MalformedRequest { .. } | Self::SchemaMismatch { .. } => {
                RetryClass::Never
            }
        }
    }

    pub fn source_id(&self) -> &str {
        match self {
            Self::Transient { source_id, .. }
            | Self::RateLimited { source_id, .. }
            | Self::Auth { source_id, .. }
            | Self::MalformedRequest { source_id, .. }
            | Self::SchemaMismatch { source_id, .. } => source_id,
        }
    }
}

/// Validation errors for upstream records and user input.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Required field '{0}' is missing")]
    MissingField(String),

    #[error("Invalid amount {amount} for record {record_id}")]
    InvalidAmount { record_id: String, amount: Decimal },

    #[error("Failed to parse decimal number: {0}")]
    DecimalParse(#[from] rust_decimal::Error),

    #[error("Failed to parse date/time: {0}")]
    DateTimeParse(#[from] ChronoParseError),
}

// === From implementations for common error types ===

impl From<rust_decimal::Error> for Error {
    fn from(err: rust_decimal::Error) -> Self {
        Error::Validation(ValidationError::DecimalParse(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Validation(ValidationError::InvalidInput(err.to_string()))
    }
}

impl From<ChronoParseError> for Error {
    fn from(err: ChronoParseError) -> Self {
        Error::Validation(ValidationError::DateTimeParse(err))
    }
}

impl From<regex::Error> for Error {
    fn from(err: regex::Error) -> Self {
        Error::InvalidConfigValue(err.to_string())
    }
}

impl From<Error> for String {
    fn from(err: Error) -> Self {
        err.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_retries_with_backoff() {
        let error = UpstreamError::Transient {
            source_id: "RECEIVABLES_API".to_string(),
            message: "connection reset".to_string(),
        };
        assert_eq!(error.retry_class(), RetryClass::WithBackoff);
    }

    #[test]
    fn test_rate_limited_uses_longer_backoff() {
        let error = UpstreamError::RateLimited {
            source_id: "PAYABLES_API".to_string(),
            retry_after: None,
        };
        assert_eq!(error.retry_class(), RetryClass::RateLimitBackoff);
    }

    #[test]
    fn test_auth_is_fatal_and_never_retried() {
        let upstream = UpstreamError::Auth {
            source_id: "PAYABLES_API".to_string(),
            message: "invalid session".to_string(),
        };
        assert_eq!(upstream.retry_class(), RetryClass::Never);
        assert!(Error::from(upstream).is_fatal());
    }

    #[test]
    fn test_join_coverage_is_not_fatal() {
        let error = Error::JoinCoverage {
            matched: 0,
            total: 120,
            coverage: 0.0,
            threshold: 0.01,
        };
        assert!(!error.is_fatal());
        assert!(error.to_string().contains("0 of 120"));
    }

    #[test]
    fn test_backfill_limit_message_names_limit() {
        let error = Error::BackfillLimitExceeded {
            requested: 30,
            limit: 24,
        };
        let message = error.to_string();
        assert!(message.contains("30"));
        assert!(message.contains("limit of 24"));
    }
}
