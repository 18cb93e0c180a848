//! Gateways: adapters plus ledger plus normalizer, behind the core source traits.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use log::debug;

use cashsync_core::canonical::{ContractRecord, EntityRecord, Installment, Payable};
use cashsync_core::errors::Result;
use cashsync_core::ledger::{content_hash, PayloadLedgerTrait, RawPayloadAudit};
use cashsync_core::sources::{FetchContext, Fetched, PayablesSource, ReceivablesSource};

use crate::models::{Endpoint, FetchFilters, RawRecord};
use crate::normalizer::{self, Normalized};
use crate::provider::ErpAdapter;

/// Order-independent serialization of a batch: each record as compact JSON
/// (object keys sorted), then the records sorted.
pub fn canonical_payload(records: &[RawRecord]) -> Result<String> {
    let mut parts = records
        .iter()
        .map(|r| serde_json::to_string(&r.0))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    parts.sort_unstable();
    Ok(format!("[{}]", parts.join(",")))
}

/// Ledger source name, e.g. `RECEIVABLES_API/installments/ENT-1`.
pub fn ledger_source(source_id: &str, endpoint: Endpoint, scope: Option<&str>) -> String {
    match scope {
        Some(scope) => format!("{}/{}/{}", source_id, endpoint, scope),
        None => format!("{}/{}", source_id, endpoint),
    }
}

struct Recorder {
    adapter: Arc<dyn ErpAdapter>,
    ledger: Arc<dyn PayloadLedgerTrait>,
    store_raw_payloads: bool,
}

impl Recorder {
    /// Fetches, records the payload in the ledger, then normalizes.
    async fn fetch<T>(
        &self,
        endpoint: Endpoint,
        filters: FetchFilters,
        ctx: &FetchContext,
        normalize: impl FnOnce(&[RawRecord]) -> Normalized<T> + Send,
    ) -> Result<Fetched<T>> {
        let raw = self
            .adapter
            .fetch(endpoint, &ctx.window(), &filters, &ctx.cancel)
            .await?;

        let payload = canonical_payload(&raw)?;
        let hash = content_hash(payload.as_bytes());
        let source = ledger_source(self.adapter.id(), endpoint, filters.entity_id.as_deref());

        let outcome = self
            .ledger
            .record(RawPayloadAudit {
                source: source.clone(),
                period: ctx.period,
                content_hash: hash.clone(),
                fetched_at: Utc::now().naive_utc(),
                record_count: raw.len() as i64,
                payload: self.store_raw_payloads.then_some(payload),
            })
            .await?;
        debug!("{} {}: {} records, {:?}", source, ctx.period, raw.len(), outcome);

        let normalized = normalize(&raw);
        Ok(Fetched::new(normalized.records, outcome, hash).with_rejected(normalized.rejected))
    }
}

/// Entities, contracts and installments from the receivables upstream.
pub struct ReceivablesGateway {
    recorder: Recorder,
    request_present_value: bool,
}

impl ReceivablesGateway {
    pub fn new(adapter: Arc<dyn ErpAdapter>, ledger: Arc<dyn PayloadLedgerTrait>) -> Self {
        Self {
            recorder: Recorder {
                adapter,
                ledger,
                store_raw_payloads: false,
            },
            request_present_value: true,
        }
    }

    pub fn with_raw_payloads(mut self, store: bool) -> Self {
        self.recorder.store_raw_payloads = store;
        self
    }

    /// Whether to ask for upstream-computed present values.
    pub fn with_present_value(mut self, request: bool) -> Self {
        self.request_present_value = request;
        self
    }
}

#[async_trait]
impl ReceivablesSource for ReceivablesGateway {
    fn id(&self) -> &str {
        self.recorder.adapter.id()
    }

    async fn fetch_entities(&self, ctx: &FetchContext) -> Result<Fetched<EntityRecord>> {
        self.recorder
            .fetch(Endpoint::Entities, FetchFilters::default(), ctx, normalizer::normalize_entities)
            .await
    }

    async fn fetch_contracts(&self, ctx: &FetchContext) -> Result<Fetched<ContractRecord>> {
        self.recorder
            .fetch(Endpoint::Contracts, FetchFilters::default(), ctx, normalizer::normalize_contracts)
            .await
    }

    async fn fetch_installments(
        &self,
        entity_id: &str,
        ctx: &FetchContext,
    ) -> Result<Fetched<Installment>> {
        let mut filters = FetchFilters::for_entity(entity_id);
        if self.request_present_value {
            filters = filters.expanded();
        }
        self.recorder
            .fetch(Endpoint::Installments, filters, ctx, |raw| {
                normalizer::normalize_installments(entity_id, raw)
            })
            .await
    }
}

/// Payables from the payables upstream.
pub struct PayablesGateway {
    recorder: Recorder,
}

impl PayablesGateway {
    pub fn new(adapter: Arc<dyn ErpAdapter>, ledger: Arc<dyn PayloadLedgerTrait>) -> Self {
        Self {
            recorder: Recorder {
                adapter,
                ledger,
                store_raw_payloads: false,
            },
        }
    }

    pub fn with_raw_payloads(mut self, store: bool) -> Self {
        self.recorder.store_raw_payloads = store;
        self
    }
}

#[async_trait]
impl PayablesSource for PayablesGateway {
    fn id(&self) -> &str {
        self.recorder.adapter.id()
    }

    async fn fetch_payables(&self, ctx: &FetchContext) -> Result<Fetched<Payable>> {
        self.recorder
            .fetch(Endpoint::Payables, FetchFilters::default(), ctx, normalizer::normalize_payables)
            .await
    }
}
