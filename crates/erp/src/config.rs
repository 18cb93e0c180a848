//! Per-source connection settings.

use std::fmt;
use std::time::Duration;

use crate::rate_limiter::RateLimitConfig;
use crate::retry::RetryPolicy;

const DEFAULT_PAGE_SIZE: u32 = 200;
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Credentials sent with every request.
#[derive(Clone, PartialEq, Eq)]
pub enum AuthScheme {
    /// `Authorization: Bearer <token>`.
    Bearer { token: String },
    /// `X-Integration-Token` plus `X-Session-Token` headers.
    DualToken {
        integration_token: String,
        session_token: String,
    },
}

impl fmt::Debug for AuthScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bearer { .. } => f.write_str("Bearer(<redacted>)"),
            Self::DualToken { .. } => f.write_str("DualToken(<redacted>)"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SourceConfig {
    pub base_url: String,
    pub auth: AuthScheme,
    /// Records requested per page.
    pub page_size: u32,
    pub rate_limit: RateLimitConfig,
    /// Per-request timeout.
    pub timeout: Duration,
    pub retry: RetryPolicy,
    /// Keep raw bodies in the payload ledger.
    pub store_raw_payloads: bool,
}

impl SourceConfig {
    pub fn new(base_url: impl Into<String>, auth: AuthScheme) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth,
            page_size: DEFAULT_PAGE_SIZE,
            rate_limit: RateLimitConfig::default(),
            timeout: DEFAULT_TIMEOUT,
            retry: RetryPolicy::default(),
            store_raw_payloads: false,
        }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_rate_limit(mut self, rate_limit: RateLimitConfig) -> Self {
        self.rate_limit = rate_limit;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_raw_payloads(mut self, store: bool) -> Self {
        self.store_raw_payloads = store;
        self
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_credentials() {
        let auth = AuthScheme::DualToken {
            integration_token: "int-secret".to_string(),
            session_token: "sess-secret".to_string(),
        };
        let rendered = format!("{:?}", SourceConfig::new("https://erp.example", auth));
        assert!(!rendered.contains("secret"));
    }

    #[test]
    fn test_url_joins_without_double_slash() {
        let config = SourceConfig::new(
            "https://erp.example/api/",
            AuthScheme::Bearer {
                token: "t".to_string(),
            },
        );
        assert_eq!(config.url("/installments"), "https://erp.example/api/installments");
    }
}
