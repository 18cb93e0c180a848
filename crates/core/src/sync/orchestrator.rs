//! Sync orchestrator.
//!
//! Fans the per-entity pipeline (fetch -> resolve -> classify -> aging and
//! valuation -> persist) out over a bounded worker pool and folds the outcomes
//! into a [`RunReport`].

use std::sync::Arc;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use log::{debug, error, info, warn};
use rust_decimal::Decimal;

use super::cancellation::CancellationFlag;
use super::snapshot::PeriodSnapshot;
use super::sync_model::{
    CanonicalBundle, DownstreamSignal, EntityFailure, RunMode, RunReport, RunStatus,
};
use super::sync_traits::{CanonicalStoreTrait, SyncRunRepositoryTrait};
use crate::aging::AgingCalculator;
use crate::canonical::Installment;
use crate::cashflow::{
    build_cash_in_records, build_cash_out_records, uncategorized_alert, Balance,
    CashOutCategoryMap, CategorizationAlert,
};
use crate::config::SyncSettings;
use crate::contracts::{ContractResolutionIndex, ResolutionKey, ResolutionKeyRepositoryTrait};
use crate::entities::{Entity, EntityFilter, EntityRepositoryTrait};
use crate::errors::{Error, Result};
use crate::ledger::content_hash;
use crate::period::{PeriodRange, RefPeriod};
use crate::sources::{FetchContext, Fetched, PayablesSource, ReceivablesSource};
use crate::valuation::calculate_portfolio_stats;

/// Collaborators of the orchestrator.
#[derive(Clone)]
pub struct SyncDependencies {
    pub receivables: Arc<dyn ReceivablesSource>,
    pub payables: Arc<dyn PayablesSource>,
    pub entity_repository: Arc<dyn EntityRepositoryTrait>,
    pub key_repository: Arc<dyn ResolutionKeyRepositoryTrait>,
    pub store: Arc<dyn CanonicalStoreTrait>,
    pub run_repository: Option<Arc<dyn SyncRunRepositoryTrait>>,
}

/// What happened to one entity in one period.
#[derive(Debug)]
enum EntityOutcome {
    Synced {
        records: usize,
        rejected: usize,
        alert: Option<CategorizationAlert>,
    },
    /// Upstream payloads unchanged since the last successful sync.
    Unchanged { rejected: usize },
}

struct EntityRun {
    entity_id: String,
    /// Installments received before the pipeline failed, if any.
    fetched: usize,
    outcome: Result<EntityOutcome>,
}

pub struct SyncOrchestrator {
    deps: SyncDependencies,
    settings: SyncSettings,
    categories: CashOutCategoryMap,
    aging: AgingCalculator,
    /// Hash of the settings; a change invalidates every stored `input_hash`.
    settings_digest: String,
    cancel: CancellationFlag,
}

impl SyncOrchestrator {
    pub fn new(deps: SyncDependencies, settings: SyncSettings) -> Result<Self> {
        settings.validate()?;
        // serde_json maps are ordered, so the digest is stable across processes.
        let settings_digest = content_hash(serde_json::to_value(&settings)?.to_string().as_bytes());
        Ok(Self {
            categories: CashOutCategoryMap::new(&settings.cash_out_categories),
            aging: AgingCalculator::new(settings.grace_period_days),
            settings_digest,
            deps,
            settings,
            cancel: CancellationFlag::new(),
        })
    }

    /// Cancelling this flag stops new entities from starting and abandons
    /// in-flight retries. Entities already persisted keep their writes.
    pub fn cancellation_flag(&self) -> CancellationFlag {
        self.cancel.clone()
    }

    pub fn settings(&self) -> &SyncSettings {
        &self.settings
    }

    /// Syncs one period. A run that is not `Failed` carries a downstream signal.
    pub async fn run_incremental_sync(
        &self,
        period: RefPeriod,
        filter: EntityFilter,
    ) -> Result<RunReport> {
        info!("Starting incremental sync for {}", period);
        let mut report = RunReport::new(RunMode::Incremental, vec![period]);
        let run_cancel = self.cancel.child();
        let entities = self.select_entities(&filter)?;

        let synced = self
            .sync_period(
                period,
                &entities,
                self.settings.reprocess_unchanged,
                &run_cancel,
                &mut report,
            )
            .await;

        report.finish();
        if report.status != RunStatus::Failed && !synced.is_empty() {
            report.downstream_signal = Some(DownstreamSignal {
                run_id: report.id.clone(),
                period,
                entity_ids: synced,
                emitted_at: Utc::now(),
            });
        }
        self.complete(report).await
    }

    /// Re-derives a range of periods in ascending order. Never signals downstream.
    ///
    /// Fails before any I/O when the range exceeds `max_periods` (the configured
    /// limit when `None`) unless `force` is set. `force` also re-derives
    /// entities whose upstream payloads are unchanged.
    pub async fn run_backfill(
        &self,
        range: PeriodRange,
        filter: EntityFilter,
        max_periods: Option<usize>,
        force: bool,
    ) -> Result<RunReport> {
        let limit = max_periods.unwrap_or(self.settings.max_backfill_periods);
        let requested = range.len();
        if requested > limit && !force {
            return Err(Error::BackfillLimitExceeded { requested, limit });
        }
        if requested > limit {
            warn!(
                "Forcing backfill of {} periods over the limit of {}",
                requested, limit
            );
        }

        info!(
            "Starting backfill {}..{} ({} periods)",
            range.start, range.end, requested
        );
        let periods = range.periods();
        let mut report = RunReport::new(RunMode::Backfill, periods.clone());
        let run_cancel = self.cancel.child();
        let entities = self.select_entities(&filter)?;
        let reprocess = force || self.settings.reprocess_unchanged;

        for period in periods {
            if report.is_aborted() || run_cancel.is_cancelled() {
                report.entities.skipped += entities.len();
                continue;
            }
            self.sync_period(period, &entities, reprocess, &run_cancel, &mut report)
                .await;
        }
        mark_cancelled(&run_cancel, &mut report);

        report.finish();
        self.complete(report).await
    }

    fn select_entities(&self, filter: &EntityFilter) -> Result<Vec<Entity>> {
        let active = self.deps.entity_repository.list(true)?;
        let selected: Vec<Entity> = active.into_iter().filter(|e| filter.matches(&e.id)).collect();

        if let EntityFilter::Ids(ids) = filter {
            for id in ids {
                if !selected.iter().any(|e| &e.id == id) {
                    warn!("Entity {} is unknown or inactive and will not be synced", id);
                }
            }
        }
        debug!("Selected {} entities", selected.len());
        Ok(selected)
    }

    /// Runs every selected entity for one period. Returns the ids whose rows
    /// are current for the period.
    async fn sync_period(
        &self,
        period: RefPeriod,
        entities: &[Entity],
        reprocess_unchanged: bool,
        run_cancel: &CancellationFlag,
        report: &mut RunReport,
    ) -> Vec<String> {
        let sample_size = self.settings.error_sample_size;
        let ctx = FetchContext::new(period, run_cancel.clone());

        let snapshot = match self.build_snapshot(&ctx).await {
            Ok(snapshot) => snapshot,
            Err(Error::Cancelled) => {
                report.entities.skipped += entities.len();
                mark_cancelled(run_cancel, report);
                return Vec::new();
            }
            Err(e) => {
                error!("Failed to prepare period {}: {}", period, e);
                self.note_abort(&e, run_cancel, report);
                report.entities.failed += entities.len();
                report.record_failure(
                    EntityFailure {
                        entity_id: None,
                        period,
                        fatal: e.is_fatal(),
                        error: e.to_string(),
                    },
                    sample_size,
                );
                return Vec::new();
            }
        };
        report.records.skipped += snapshot.skipped_payables;

        let runs: Vec<EntityRun> = stream::iter(entities.iter())
            .map(|entity| self.run_entity(entity, &snapshot, &ctx, reprocess_unchanged))
            .buffer_unordered(self.settings.worker_pool_size)
            .collect()
            .await;

        let mut current = Vec::new();
        for run in runs {
            match run.outcome {
                Ok(EntityOutcome::Synced {
                    records,
                    rejected,
                    alert,
                }) => {
                    report.entities.succeeded += 1;
                    report.records.succeeded += records;
                    report.records.skipped += rejected;
                    report.warnings.extend(alert);
                    current.push(run.entity_id);
                }
                Ok(EntityOutcome::Unchanged { rejected }) => {
                    report.entities.skipped += 1;
                    report.records.skipped += rejected;
                    current.push(run.entity_id);
                }
                Err(Error::Cancelled) => {
                    report.entities.skipped += 1;
                }
                Err(e) => {
                    if e.is_fatal() {
                        error!("Fatal error on entity {}: {}", run.entity_id, e);
                    } else {
                        error!("Entity {} failed for {}: {}", run.entity_id, period, e);
                    }
                    self.note_abort(&e, run_cancel, report);
                    report.entities.failed += 1;
                    report.records.failed += run.fetched;
                    report.record_failure(
                        EntityFailure {
                            entity_id: Some(run.entity_id),
                            period,
                            fatal: e.is_fatal(),
                            error: e.to_string(),
                        },
                        sample_size,
                    );
                }
            }
        }

        mark_cancelled(run_cancel, report);

        current.sort();
        info!(
            "Period {} done: {} entities current, {} failures so far",
            period,
            current.len(),
            report.failure_count
        );
        current
    }

    /// Fatal errors stop the run: no further entity starts.
    fn note_abort(&self, err: &Error, run_cancel: &CancellationFlag, report: &mut RunReport) {
        if err.is_fatal() && !report.is_aborted() {
            report.aborted_reason = Some(err.to_string());
            run_cancel.cancel();
        }
    }

    async fn build_snapshot(&self, ctx: &FetchContext) -> Result<PeriodSnapshot> {
        let keys = self.deps.key_repository.load_all()?;
        let context_digest = format!("{}|{}", resolution_digest(&keys), self.settings_digest);
        let index = ContractResolutionIndex::from_keys(keys);
        if index.is_empty() {
            warn!("Contract resolution index is empty; refresh it before syncing");
        }

        let payables = self.deps.payables.fetch_payables(ctx).await?;
        debug!(
            "Fetched {} payables for {} ({} rejected)",
            payables.records.len(),
            ctx.period,
            payables.rejected.len()
        );

        PeriodSnapshot::build(
            ctx.period,
            index,
            payables,
            self.settings.join_strategy,
            self.settings.min_join_coverage,
            &context_digest,
        )
    }

    async fn run_entity(
        &self,
        entity: &Entity,
        snapshot: &PeriodSnapshot,
        ctx: &FetchContext,
        reprocess_unchanged: bool,
    ) -> EntityRun {
        let mut run = EntityRun {
            entity_id: entity.id.clone(),
            fetched: 0,
            outcome: Err(Error::Cancelled),
        };
        if ctx.cancel.is_cancelled() {
            return run;
        }

        let installments = match self
            .deps
            .receivables
            .fetch_installments(&entity.id, ctx)
            .await
        {
            Ok(fetched) => fetched,
            Err(e) => {
                if e.is_fatal() {
                    // Stop entities that have not started yet.
                    ctx.cancel.cancel();
                }
                run.outcome = Err(e);
                return run;
            }
        };
        run.fetched = installments.records.len();
        for issue in &installments.rejected {
            debug!(
                "Skipped record {:?} of {}: {}",
                issue.record_id, entity.id, issue.message
            );
        }

        run.outcome = self
            .derive_and_persist(entity, snapshot, ctx, reprocess_unchanged, installments)
            .await;
        run
    }

    async fn derive_and_persist(
        &self,
        entity: &Entity,
        snapshot: &PeriodSnapshot,
        ctx: &FetchContext,
        reprocess_unchanged: bool,
        installments: Fetched<Installment>,
    ) -> Result<EntityOutcome> {
        let period = snapshot.period;
        let rejected = installments.rejected.len();

        // resolve; a failed join is never masked by the unchanged skip
        let payables = snapshot.payables_for(&entity.id)?;

        let opening = self
            .deps
            .store
            .closing_balance(&entity.id, period.pred())?
            .unwrap_or(Decimal::ZERO);
        let input_hash = content_hash(
            format!(
                "{}|{}|{}",
                installments.content_hash, snapshot.input_digest, opening
            )
            .as_bytes(),
        );

        // Unchanged only counts when the same inputs were persisted before.
        if !reprocess_unchanged
            && installments.ledger.is_unchanged()
            && snapshot.payables_ledger.is_unchanged()
            && self
                .deps
                .store
                .input_hash(&entity.id, period)?
                .as_deref()
                == Some(input_hash.as_str())
        {
            debug!("Entity {} unchanged for {}, skipping", entity.id, period);
            return Ok(EntityOutcome::Unchanged { rejected });
        }

        // classify
        let cash_in = build_cash_in_records(&entity.id, period, &installments.records);
        let cash_out = build_cash_out_records(&entity.id, period, payables, &self.categories);
        let alert = uncategorized_alert(
            &entity.id,
            period,
            &cash_out,
            payables,
            self.settings.uncategorized_alert_ratio,
        );

        // aging and valuation
        let delinquency = self
            .aging
            .calculate(&installments.records, period)
            .into_rows(&entity.id, period);
        let portfolio_stats = calculate_portfolio_stats(
            &entity.id,
            period,
            &installments.records,
            &snapshot.index,
            &self.settings.valuation,
        )?;

        let balance = Balance::compute(&entity.id, period, opening, &cash_in, &cash_out);

        ctx.cancel.check()?;

        let bundle = CanonicalBundle {
            entity_id: entity.id.clone(),
            period,
            cash_in,
            cash_out,
            balance,
            portfolio_stats,
            delinquency,
            input_hash,
        };
        let records = bundle.record_count();
        let summary = self.deps.store.persist_bundle(bundle).await?;
        debug!(
            "Persisted {} {}: {} rows upserted, {} pruned",
            entity.id, period, summary.upserted, summary.pruned
        );

        Ok(EntityOutcome::Synced {
            records,
            rejected,
            alert,
        })
    }

    async fn complete(&self, report: RunReport) -> Result<RunReport> {
        info!(
            "Run {} finished with status {:?}: entities {}/{}/{} (ok/skipped/failed), records {}/{}/{}",
            report.id,
            report.status,
            report.entities.succeeded,
            report.entities.skipped,
            report.entities.failed,
            report.records.succeeded,
            report.records.skipped,
            report.records.failed
        );
        if let Some(reason) = &report.aborted_reason {
            warn!("Run {} aborted: {}", report.id, reason);
        }
        if let Some(repository) = &self.deps.run_repository {
            if let Err(e) = repository.save_run(report.clone()).await {
                error!("Failed to store run report {}: {}", report.id, e);
            }
        }
        Ok(report)
    }
}

/// Hash of the resolution keys, independent of load order and refresh time.
fn resolution_digest(keys: &[ResolutionKey]) -> String {
    let mut lines: Vec<String> = keys
        .iter()
        .map(|k| format!("{}:{}:{}", k.code, k.entity_id, k.status.as_str()))
        .collect();
    lines.sort_unstable();
    content_hash(lines.join("\n").as_bytes())
}

fn mark_cancelled(run_cancel: &CancellationFlag, report: &mut RunReport) {
    if run_cancel.is_cancelled() && !report.is_aborted() {
        warn!("Run {} cancelled", report.id);
        report.cancelled = true;
        report.aborted_reason = Some("cancelled".to_string());
    }
}
