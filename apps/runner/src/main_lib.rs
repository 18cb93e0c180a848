use std::sync::Arc;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cashsync_core::contracts::{ContractIndexService, EntityActivityRules};
use cashsync_core::period::RefPeriod;
use cashsync_core::sources::{FetchContext, PayablesSource, ReceivablesSource};
use cashsync_core::sync::{RunReport, SyncDependencies, SyncOrchestrator, SyncRunRepositoryTrait};
use cashsync_erp::{PayablesApiAdapter, PayablesGateway, ReceivablesApiAdapter, ReceivablesGateway};
use cashsync_storage_sqlite::{
    create_pool, init, run_migrations, spawn_writer, CanonicalStoreRepository, EntityRepository,
    PayloadLedgerRepository, ResolutionKeyRepository, SyncRunRepository,
};

use crate::config::{Config, Job};

pub fn init_tracing() {
    let log_format = std::env::var("CASHSYNC_LOG_FORMAT").unwrap_or_else(|_| "text".into());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if log_format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_current_span(false))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init();
    }
}

pub struct Runtime {
    pub orchestrator: SyncOrchestrator,
    pub index_service: ContractIndexService,
    pub receivables: Arc<dyn ReceivablesSource>,
    pub runs: Arc<dyn SyncRunRepositoryTrait>,
}

pub fn build_runtime(config: &Config) -> anyhow::Result<Runtime> {
    let db_path = init(&config.data_dir)?;
    let pool = create_pool(&db_path)?;
    run_migrations(&pool)?;
    let writer = spawn_writer((*pool).clone());
    tracing::info!("Database ready at {}", db_path);

    let entity_repository = Arc::new(EntityRepository::new(pool.clone(), writer.clone()));
    let key_repository = Arc::new(ResolutionKeyRepository::new(pool.clone(), writer.clone()));
    let ledger = Arc::new(PayloadLedgerRepository::new(writer.clone()));
    let store = Arc::new(CanonicalStoreRepository::new(pool.clone(), writer.clone()));
    let run_repository: Arc<dyn SyncRunRepositoryTrait> =
        Arc::new(SyncRunRepository::new(pool.clone(), writer));

    let receivables: Arc<dyn ReceivablesSource> = Arc::new(
        ReceivablesGateway::new(
            Arc::new(ReceivablesApiAdapter::new(config.receivables.clone())?),
            ledger.clone(),
        )
        .with_raw_payloads(config.store_raw_payloads),
    );
    let payables: Arc<dyn PayablesSource> = Arc::new(
        PayablesGateway::new(
            Arc::new(PayablesApiAdapter::new(config.payables.clone())?),
            ledger,
        )
        .with_raw_payloads(config.store_raw_payloads),
    );

    let index_service = ContractIndexService::new(
        entity_repository.clone(),
        key_repository.clone(),
        EntityActivityRules::new(&config.settings.exclusion_patterns)?,
    );

    let orchestrator = SyncOrchestrator::new(
        SyncDependencies {
            receivables: receivables.clone(),
            payables,
            entity_repository,
            key_repository,
            store,
            run_repository: Some(run_repository.clone()),
        },
        config.settings.clone(),
    )?;

    Ok(Runtime {
        orchestrator,
        index_service,
        receivables,
        runs: run_repository,
    })
}

/// Optionally refreshes the resolution index, then runs the configured job.
pub async fn run_job(runtime: &Runtime, config: &Config) -> anyhow::Result<RunReport> {
    match runtime.runs.get_recent(1)?.first() {
        Some(previous) => tracing::info!(
            "Previous run {} ({:?}) started {} ended {:?}: {} synced, {} skipped, {} failed",
            previous.id,
            previous.mode,
            previous.started_at,
            previous.status,
            previous.entities.succeeded,
            previous.entities.skipped,
            previous.entities.failed
        ),
        None => tracing::info!("No previous sync run recorded"),
    }

    if config.refresh_index {
        let period: RefPeriod = match &config.job {
            Job::Incremental { period } => *period,
            Job::Backfill { range, .. } => range.end,
        };
        let ctx = FetchContext::new(period, runtime.orchestrator.cancellation_flag());
        let summary = runtime
            .index_service
            .refresh(runtime.receivables.as_ref(), &ctx)
            .await?;
        tracing::info!(
            "Resolution index refreshed: {} entities ({} active), {} keys, {} rejected",
            summary.entities,
            summary.active_entities,
            summary.keys,
            summary.rejected_records
        );
    }

    let report = match &config.job {
        Job::Incremental { period } => {
            runtime
                .orchestrator
                .run_incremental_sync(*period, config.entity_filter.clone())
                .await?
        }
        Job::Backfill {
            range,
            max_periods,
            force,
        } => {
            runtime
                .orchestrator
                .run_backfill(*range, config.entity_filter.clone(), *max_periods, *force)
                .await?
        }
    };

    tracing::info!(
        "Run {} finished with status {:?}: {} entities synced, {} failed",
        report.id,
        report.status,
        report.entities.succeeded,
        report.entities.failed
    );
    Ok(report)
}
