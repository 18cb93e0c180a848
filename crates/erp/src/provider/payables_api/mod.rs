//! Payables API adapter.
//!
//! Dual-token header auth, `DD/MM/YYYY` dates and page-number pagination.
//! Responses look like `{"data": [...], "hasNext": true}`; pages start at 1.

use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, info};
use serde::Deserialize;

use cashsync_core::errors::Result;
use cashsync_core::sources::FetchWindow;
use cashsync_core::sync::CancellationFlag;

use crate::config::SourceConfig;
use crate::models::{Endpoint, FetchFilters, RawRecord};
use crate::provider::{page_limit_exceeded, unsupported_endpoint, ErpAdapter, HttpClient, MAX_PAGES};
use crate::retry::{Sleeper, TokioSleeper};

const SOURCE_ID: &str = "PAYABLES_API";
const DMY_DATE: &str = "%d/%m/%Y";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Page {
    #[serde(default)]
    data: Vec<RawRecord>,
    #[serde(default)]
    has_next: bool,
}

pub struct PayablesApiAdapter {
    http: HttpClient,
    config: SourceConfig,
}

impl PayablesApiAdapter {
    pub fn new(config: SourceConfig) -> Result<Self> {
        Self::with_sleeper(config, Arc::new(TokioSleeper))
    }

    pub fn with_sleeper(config: SourceConfig, sleeper: Arc<dyn Sleeper>) -> Result<Self> {
        Ok(Self {
            http: HttpClient::new(SOURCE_ID, &config, sleeper)?,
            config,
        })
    }
}

#[async_trait]
impl ErpAdapter for PayablesApiAdapter {
    fn id(&self) -> &'static str {
        SOURCE_ID
    }

    fn endpoints(&self) -> &'static [Endpoint] {
        &[Endpoint::Payables]
    }

    async fn fetch(
        &self,
        endpoint: Endpoint,
        window: &FetchWindow,
        _filters: &FetchFilters,
        cancel: &CancellationFlag,
    ) -> Result<Vec<RawRecord>> {
        if endpoint != Endpoint::Payables {
            return Err(unsupported_endpoint(SOURCE_ID, endpoint));
        }

        let url = self.config.url(endpoint.as_str());
        let start = window.start.format(DMY_DATE).to_string();
        let end = window.end.format(DMY_DATE).to_string();

        let mut records = Vec::new();
        for page_number in 1..=MAX_PAGES {
            let query = [
                ("startDate", start.clone()),
                ("endDate", end.clone()),
                ("page", page_number.to_string()),
                ("pageSize", self.config.page_size.to_string()),
            ];

            let page: Page = self.http.get_json(&url, &query, cancel).await?;
            let received = page.data.len();
            records.extend(page.data);
            debug!("{} page {}: {} records", SOURCE_ID, page_number, received);

            if !page.has_next || received == 0 {
                info!("{}: fetched {} payables", SOURCE_ID, records.len());
                return Ok(records);
            }
        }

        Err(page_limit_exceeded(SOURCE_ID, endpoint))
    }
}
