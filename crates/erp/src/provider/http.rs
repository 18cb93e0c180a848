//! Shared request plumbing: rate limit, retry, status classification, decode.

use std::sync::Arc;

use log::debug;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;

use cashsync_core::errors::{Error, Result};
use cashsync_core::sync::CancellationFlag;

use crate::config::{AuthScheme, SourceConfig};
use crate::errors::{classify_status, classify_transport, parse_retry_after, schema_mismatch};
use crate::rate_limiter::RateLimiter;
use crate::retry::{RetryPolicy, Sleeper};

pub(crate) const INTEGRATION_TOKEN_HEADER: &str = "X-Integration-Token";
pub(crate) const SESSION_TOKEN_HEADER: &str = "X-Session-Token";

pub(crate) struct HttpClient {
    source_id: &'static str,
    client: Client,
    auth: AuthScheme,
    limiter: RateLimiter,
    retry: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl HttpClient {
    pub(crate) fn new(
        source_id: &'static str,
        config: &SourceConfig,
        sleeper: Arc<dyn Sleeper>,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::InvalidConfigValue(format!("{}: {}", source_id, e)))?;

        Ok(Self {
            source_id,
            client,
            auth: config.auth.clone(),
            limiter: RateLimiter::new(source_id, config.rate_limit.clone()),
            retry: config.retry.clone(),
            sleeper,
        })
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth {
            AuthScheme::Bearer { token } => request.bearer_auth(token),
            AuthScheme::DualToken {
                integration_token,
                session_token,
            } => request
                .header(INTEGRATION_TOKEN_HEADER, integration_token)
                .header(SESSION_TOKEN_HEADER, session_token),
        }
    }

    /// GETs `url` and decodes the JSON body, retrying per the source policy.
    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
        cancel: &CancellationFlag,
    ) -> Result<T> {
        self.retry
            .execute(self.sleeper.as_ref(), cancel, || self.attempt(url, query, cancel))
            .await
    }

    async fn attempt<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
        cancel: &CancellationFlag,
    ) -> Result<T> {
        self.limiter.acquire(cancel).await?;
        debug!("{} GET {} {:?}", self.source_id, url, query);

        let response = self
            .authorize(self.client.get(url).query(query))
            .send()
            .await
            .map_err(|e| classify_transport(self.source_id, &e))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = parse_retry_after(response.headers());
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(self.source_id, status, retry_after, &body).into());
        }

        let body = response
            .text()
            .await
            .map_err(|e| classify_transport(self.source_id, &e))?;

        serde_json::from_str(&body)
            .map_err(|e| Error::Upstream(schema_mismatch(self.source_id, e.to_string())))
    }
}
