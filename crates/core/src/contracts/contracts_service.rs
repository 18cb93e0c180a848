//! Resolution index refresh job.
//!
//! Runs on a slower cadence than the daily sync. Sync runs only read what it writes.

use chrono::Utc;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

use super::contracts_model::ResolutionKey;
use super::contracts_traits::ResolutionKeyRepositoryTrait;
use super::resolution_index::{ContractResolutionIndex, EntityActivityRules};
use crate::entities::{Entity, EntityRepositoryTrait};
use crate::errors::Result;
use crate::sources::{FetchContext, ReceivablesSource};

/// Outcome of one refresh.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshSummary {
    pub entities: usize,
    pub active_entities: usize,
    pub keys: usize,
    pub rejected_records: usize,
}

pub struct ContractIndexService {
    entity_repository: Arc<dyn EntityRepositoryTrait>,
    key_repository: Arc<dyn ResolutionKeyRepositoryTrait>,
    rules: EntityActivityRules,
}

impl ContractIndexService {
    pub fn new(
        entity_repository: Arc<dyn EntityRepositoryTrait>,
        key_repository: Arc<dyn ResolutionKeyRepositoryTrait>,
        rules: EntityActivityRules,
    ) -> Self {
        Self {
            entity_repository,
            key_repository,
            rules,
        }
    }

    /// Re-reads entities and contracts upstream and rewrites both tables.
    pub async fn refresh(
        &self,
        source: &dyn ReceivablesSource,
        ctx: &FetchContext,
    ) -> Result<RefreshSummary> {
        info!("Refreshing contract resolution index from {}", source.id());

        let entities = source.fetch_entities(ctx).await?;
        let contracts = source.fetch_contracts(ctx).await?;
        let now = Utc::now().naive_utc();

        let mut seen_codes = HashSet::new();
        let mut keys = Vec::with_capacity(contracts.records.len());
        for contract in contracts.records {
            if !seen_codes.insert(contract.code.trim().to_ascii_uppercase()) {
                warn!(
                    "Duplicate contract code '{}' from {}; keeping the first occurrence",
                    contract.code,
                    source.id()
                );
                continue;
            }
            keys.push(ResolutionKey {
                code: contract.code,
                entity_id: contract.entity_id,
                status: contract.status,
                refreshed_at: now,
            });
        }

        let index = ContractResolutionIndex::from_keys(keys.iter().cloned());
        let entity_rows: Vec<Entity> = entities
            .records
            .into_iter()
            .map(|record| {
                let active = self
                    .rules
                    .is_active(&record.id, &record.display_name, &index);
                Entity {
                    id: record.id,
                    display_name: record.display_name,
                    active,
                    source: source.id().to_string(),
                    updated_at: now,
                }
            })
            .collect();

        let summary = RefreshSummary {
            entities: entity_rows.len(),
            active_entities: entity_rows.iter().filter(|e| e.active).count(),
            keys: keys.len(),
            rejected_records: entities.rejected.len() + contracts.rejected.len(),
        };

        self.entity_repository.upsert_entities(entity_rows).await?;
        self.key_repository.upsert_keys(keys).await?;

        info!(
            "Resolution index refreshed: {} entities ({} active), {} keys, {} rejected records",
            summary.entities, summary.active_entities, summary.keys, summary.rejected_records
        );
        Ok(summary)
    }
}
