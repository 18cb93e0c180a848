//! Orchestrator tests with fake upstreams and in-memory repositories.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::*;
use crate::canonical::{ContractRecord, EntityRecord, Installment, InstallmentOrigin, Payable};
use crate::cashflow::{CashInCategory, RecordType};
use crate::config::{JoinStrategy, SyncSettings};
use crate::contracts::{ContractStatus, ResolutionKey, ResolutionKeyRepositoryTrait};
use crate::entities::{Entity, EntityFilter, EntityRepositoryTrait};
use crate::errors::{Error, Result, UpstreamError};
use crate::ledger::LedgerOutcome;
use crate::period::{PeriodRange, RefPeriod};
use crate::sources::{FetchContext, Fetched, PayablesSource, ReceivablesSource};

// =============================================================================
// Fakes
// =============================================================================

struct FakeReceivables {
    installments: HashMap<String, Vec<Installment>>,
    errors: Mutex<HashMap<String, UpstreamError>>,
    ledger: Mutex<LedgerOutcome>,
    calls: AtomicUsize,
}

impl FakeReceivables {
    fn new(installments: Vec<Installment>) -> Self {
        let mut by_entity: HashMap<String, Vec<Installment>> = HashMap::new();
        for installment in installments {
            by_entity
                .entry(installment.entity_id.clone())
                .or_default()
                .push(installment);
        }
        Self {
            installments: by_entity,
            errors: Mutex::new(HashMap::new()),
            ledger: Mutex::new(LedgerOutcome::New),
            calls: AtomicUsize::new(0),
        }
    }

    fn fail_entity(&self, entity_id: &str, error: UpstreamError) {
        self.errors
            .lock()
            .unwrap()
            .insert(entity_id.to_string(), error);
    }

    fn recover_entity(&self, entity_id: &str) {
        self.errors.lock().unwrap().remove(entity_id);
    }

    fn set_ledger(&self, outcome: LedgerOutcome) {
        *self.ledger.lock().unwrap() = outcome;
    }
}

#[async_trait]
impl ReceivablesSource for FakeReceivables {
    fn id(&self) -> &str {
        "FAKE_RECEIVABLES"
    }

    async fn fetch_entities(&self, _ctx: &FetchContext) -> Result<Fetched<EntityRecord>> {
        Ok(Fetched::new(Vec::new(), LedgerOutcome::New, "entities"))
    }

    async fn fetch_contracts(&self, _ctx: &FetchContext) -> Result<Fetched<ContractRecord>> {
        Ok(Fetched::new(Vec::new(), LedgerOutcome::New, "contracts"))
    }

    async fn fetch_installments(
        &self,
        entity_id: &str,
        ctx: &FetchContext,
    ) -> Result<Fetched<Installment>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        ctx.cancel.check()?;
        if let Some(error) = self.errors.lock().unwrap().get(entity_id) {
            return Err(error.clone().into());
        }
        let records = self
            .installments
            .get(entity_id)
            .cloned()
            .unwrap_or_default();
        let ledger = *self.ledger.lock().unwrap();
        Ok(Fetched::new(records, ledger, format!("hash-{}", entity_id)))
    }
}

struct FakePayables {
    payables: Mutex<Vec<Payable>>,
    ledger: Mutex<LedgerOutcome>,
    calls: AtomicUsize,
}

impl FakePayables {
    fn new(payables: Vec<Payable>) -> Self {
        Self {
            payables: Mutex::new(payables),
            ledger: Mutex::new(LedgerOutcome::New),
            calls: AtomicUsize::new(0),
        }
    }

    fn replace(&self, payables: Vec<Payable>) {
        *self.payables.lock().unwrap() = payables;
    }
}

#[async_trait]
impl PayablesSource for FakePayables {
    fn id(&self) -> &str {
        "FAKE_PAYABLES"
    }

    async fn fetch_payables(&self, ctx: &FetchContext) -> Result<Fetched<Payable>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let records: Vec<Payable> = self
            .payables
            .lock()
            .unwrap()
            .iter()
            .filter(|p| {
                ctx.period.contains(p.due_date)
                    || p.paid_date.is_some_and(|d| ctx.period.contains(d))
            })
            .cloned()
            .collect();
        let hash = records
            .iter()
            .map(|p| format!("{}:{:?}:{}", p.id, p.counterparty_code, p.amount))
            .collect::<Vec<_>>()
            .join(",");
        let ledger = *self.ledger.lock().unwrap();
        Ok(Fetched::new(records, ledger, hash))
    }
}

struct InMemoryEntities(Vec<Entity>);

#[async_trait]
impl EntityRepositoryTrait for InMemoryEntities {
    async fn upsert_entities(&self, entities: Vec<Entity>) -> Result<usize> {
        Ok(entities.len())
    }

    fn list(&self, active_only: bool) -> Result<Vec<Entity>> {
        Ok(self
            .0
            .iter()
            .filter(|e| !active_only || e.active)
            .cloned()
            .collect())
    }
}

struct InMemoryKeys(Vec<ResolutionKey>);

#[async_trait]
impl ResolutionKeyRepositoryTrait for InMemoryKeys {
    async fn upsert_keys(&self, keys: Vec<ResolutionKey>) -> Result<usize> {
        Ok(keys.len())
    }

    fn load_all(&self) -> Result<Vec<ResolutionKey>> {
        Ok(self.0.clone())
    }
}

#[derive(Default)]
struct InMemoryStore {
    bundles: Mutex<HashMap<(String, RefPeriod), CanonicalBundle>>,
    persist_calls: AtomicUsize,
}

impl InMemoryStore {
    fn bundle(&self, entity_id: &str, period: RefPeriod) -> Option<CanonicalBundle> {
        self.bundles
            .lock()
            .unwrap()
            .get(&(entity_id.to_string(), period))
            .cloned()
    }
}

#[async_trait]
impl CanonicalStoreTrait for InMemoryStore {
    async fn persist_bundle(&self, bundle: CanonicalBundle) -> Result<PersistSummary> {
        self.persist_calls.fetch_add(1, Ordering::SeqCst);
        let upserted = bundle.record_count();
        self.bundles
            .lock()
            .unwrap()
            .insert((bundle.entity_id.clone(), bundle.period), bundle);
        Ok(PersistSummary {
            upserted,
            pruned: 0,
        })
    }

    fn closing_balance(&self, entity_id: &str, period: RefPeriod) -> Result<Option<Decimal>> {
        Ok(self.bundle(entity_id, period).map(|b| b.balance.closing))
    }

    fn input_hash(&self, entity_id: &str, period: RefPeriod) -> Result<Option<String>> {
        Ok(self.bundle(entity_id, period).map(|b| b.input_hash))
    }
}

#[derive(Default)]
struct InMemoryRuns(Mutex<Vec<RunReport>>);

#[async_trait]
impl SyncRunRepositoryTrait for InMemoryRuns {
    async fn save_run(&self, report: RunReport) -> Result<()> {
        self.0.lock().unwrap().push(report);
        Ok(())
    }

    fn get_recent(&self, limit: i64) -> Result<Vec<RunReport>> {
        Ok(self
            .0
            .lock()
            .unwrap()
            .iter()
            .rev()
            .take(limit as usize)
            .cloned()
            .collect())
    }
}

// =============================================================================
// Fixtures
// =============================================================================

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn period(s: &str) -> RefPeriod {
    s.parse().unwrap()
}

fn entity(id: &str) -> Entity {
    Entity {
        id: id.to_string(),
        display_name: format!("Development {}", id),
        active: true,
        source: "FAKE_RECEIVABLES".to_string(),
        updated_at: Utc::now().naive_utc(),
    }
}

fn key(code: &str, entity_id: &str) -> ResolutionKey {
    ResolutionKey {
        code: code.to_string(),
        entity_id: entity_id.to_string(),
        status: ContractStatus::Active,
        refreshed_at: Utc::now().naive_utc(),
    }
}

fn installment(
    id: &str,
    entity_id: &str,
    contract: &str,
    due: &str,
    settled: Option<&str>,
    amount: Decimal,
) -> Installment {
    Installment {
        id: id.to_string(),
        entity_id: entity_id.to_string(),
        contract_code: contract.to_string(),
        origin: InstallmentOrigin::CanonicalContract,
        due_date: date(due),
        amount,
        settlement_date: settled.map(date),
        paid_amount: None,
        present_value: None,
    }
}

fn payable(id: &str, code: &str, due: &str, paid: Option<&str>, amount: Decimal) -> Payable {
    Payable {
        id: id.to_string(),
        counterparty_code: Some(code.to_string()),
        document_type: Some("NF".to_string()),
        due_date: date(due),
        amount,
        paid_date: paid.map(date),
        paid_amount: None,
        description: None,
    }
}

fn settings() -> SyncSettings {
    let mut settings = SyncSettings::default();
    settings.valuation.discount_rate = Some(dec!(0.10));
    settings
        .cash_out_categories
        .insert("NF".to_string(), "suppliers".to_string());
    settings
}

struct Harness {
    receivables: Arc<FakeReceivables>,
    payables: Arc<FakePayables>,
    store: Arc<InMemoryStore>,
    runs: Arc<InMemoryRuns>,
    orchestrator: SyncOrchestrator,
}

fn harness_with(
    entities: Vec<Entity>,
    installments: Vec<Installment>,
    payables: Vec<Payable>,
    settings: SyncSettings,
) -> Harness {
    let receivables = Arc::new(FakeReceivables::new(installments));
    let payables = Arc::new(FakePayables::new(payables));
    let store = Arc::new(InMemoryStore::default());
    let runs = Arc::new(InMemoryRuns::default());
    let keys = vec![key("CA-1", "ENT-A"), key("CB-1", "ENT-B"), key("CC-1", "ENT-C")];

    let deps = SyncDependencies {
        receivables: receivables.clone(),
        payables: payables.clone(),
        entity_repository: Arc::new(InMemoryEntities(entities)),
        key_repository: Arc::new(InMemoryKeys(keys)),
        store: store.clone(),
        run_repository: Some(runs.clone()),
    };
    Harness {
        receivables,
        payables,
        store,
        runs,
        orchestrator: SyncOrchestrator::new(deps, settings).unwrap(),
    }
}

fn harness() -> Harness {
    harness_with(
        vec![entity("ENT-A"), entity("ENT-B")],
        vec![
            installment("I-A1", "ENT-A", "CA-1", "2025-01-15", Some("2025-01-20"), dec!(1000)),
            installment("I-A2", "ENT-A", "CA-1", "2025-03-15", None, dec!(1000)),
            installment("I-B1", "ENT-B", "CB-1", "2024-12-10", Some("2025-01-05"), dec!(500)),
        ],
        vec![
            payable("P-1", "CA-1", "2025-01-10", Some("2025-01-10"), dec!(300)),
            payable("P-2", "CB-1", "2025-01-12", None, dec!(200)),
        ],
        settings(),
    )
}

// =============================================================================
// Incremental sync
// =============================================================================

#[tokio::test]
async fn test_incremental_sync_persists_every_entity() {
    let h = harness();
    let report = h
        .orchestrator
        .run_incremental_sync(period("2025-01"), EntityFilter::All)
        .await
        .unwrap();

    assert_eq!(report.status, RunStatus::Success);
    assert_eq!(report.entities.succeeded, 2);
    assert_eq!(report.entities.failed, 0);

    let signal = report.downstream_signal.as_ref().unwrap();
    assert_eq!(signal.period, period("2025-01"));
    assert_eq!(signal.entity_ids, vec!["ENT-A".to_string(), "ENT-B".to_string()]);

    let a = h.store.bundle("ENT-A", period("2025-01")).unwrap();
    assert_eq!(a.balance.closing, dec!(700));
    assert_eq!(a.cash_in.len(), 2);
    assert_eq!(a.cash_out.len(), 2);
    assert!(a
        .cash_in
        .iter()
        .any(|r| r.record_type == RecordType::Actual && r.category == CashInCategory::Current));
    assert_eq!(a.delinquency.len(), 5);
    assert_eq!(a.portfolio_stats.active_count, 1);

    let b = h.store.bundle("ENT-B", period("2025-01")).unwrap();
    assert_eq!(b.balance.closing, dec!(500));
    assert_eq!(b.cash_in[0].category, CashInCategory::Recovery);
    assert_eq!(b.cash_out.len(), 1);
    assert_eq!(b.cash_out[0].record_type, RecordType::Forecast);

    assert_eq!(h.payables.calls.load(Ordering::SeqCst), 1);
    assert_eq!(h.runs.get_recent(10).unwrap().len(), 1);
}

#[tokio::test]
async fn test_unchanged_payloads_are_skipped() {
    let h = harness();
    h.orchestrator
        .run_incremental_sync(period("2025-01"), EntityFilter::All)
        .await
        .unwrap();
    assert_eq!(h.store.persist_calls.load(Ordering::SeqCst), 2);

    h.receivables.set_ledger(LedgerOutcome::Unchanged);
    *h.payables.ledger.lock().unwrap() = LedgerOutcome::Unchanged;

    let second = h
        .orchestrator
        .run_incremental_sync(period("2025-01"), EntityFilter::All)
        .await
        .unwrap();
    assert_eq!(second.entities.skipped, 2);
    assert_eq!(second.records.succeeded, 0);
    assert_eq!(h.store.persist_calls.load(Ordering::SeqCst), 2);
    assert_eq!(second.status, RunStatus::Success);
    assert_eq!(second.downstream_signal.unwrap().entity_ids.len(), 2);
}

#[tokio::test]
async fn test_failed_join_is_not_skipped_on_replay() {
    let h = harness();
    let first = h
        .orchestrator
        .run_incremental_sync(period("2025-01"), EntityFilter::All)
        .await
        .unwrap();
    assert_eq!(first.status, RunStatus::Success);

    h.payables.replace(vec![
        payable("P-9", "UNKNOWN-1", "2025-01-10", Some("2025-01-10"), dec!(900)),
        payable("P-8", "UNKNOWN-2", "2025-01-11", None, dec!(10)),
    ]);
    let second = h
        .orchestrator
        .run_incremental_sync(period("2025-01"), EntityFilter::All)
        .await
        .unwrap();
    assert_eq!(second.status, RunStatus::Failed);
    assert_eq!(second.entities.failed, 2);

    // Same inputs again: the ledger now reports them as unchanged.
    h.receivables.set_ledger(LedgerOutcome::Unchanged);
    *h.payables.ledger.lock().unwrap() = LedgerOutcome::Unchanged;
    let third = h
        .orchestrator
        .run_incremental_sync(period("2025-01"), EntityFilter::All)
        .await
        .unwrap();

    assert_eq!(third.status, RunStatus::Failed);
    assert_eq!(third.entities.failed, 2);
    assert_eq!(third.entities.skipped, 0);
    assert!(third.failures[0].error.contains("Join coverage too low"));
    assert!(third.downstream_signal.is_none());
    assert_eq!(h.store.persist_calls.load(Ordering::SeqCst), 2);
    assert_eq!(
        h.store.bundle("ENT-A", period("2025-01")).unwrap().balance.closing,
        dec!(700)
    );
}

#[tokio::test]
async fn test_unchanged_ledger_without_persisted_inputs_is_reprocessed() {
    let h = harness();
    h.receivables.fail_entity(
        "ENT-A",
        UpstreamError::MalformedRequest {
            source_id: "FAKE_RECEIVABLES".to_string(),
            message: "HTTP 422".to_string(),
        },
    );
    let first = h
        .orchestrator
        .run_incremental_sync(period("2025-01"), EntityFilter::All)
        .await
        .unwrap();
    assert_eq!(first.entities.failed, 1);

    h.receivables.recover_entity("ENT-A");
    h.receivables.set_ledger(LedgerOutcome::Unchanged);
    *h.payables.ledger.lock().unwrap() = LedgerOutcome::Unchanged;
    let second = h
        .orchestrator
        .run_incremental_sync(period("2025-01"), EntityFilter::All)
        .await
        .unwrap();

    assert_eq!(second.status, RunStatus::Success);
    assert_eq!(second.entities.succeeded, 1);
    assert_eq!(second.entities.skipped, 1);
    assert!(h.store.bundle("ENT-A", period("2025-01")).is_some());
}

#[tokio::test]
async fn test_entity_filter_limits_the_run() {
    let h = harness();
    let report = h
        .orchestrator
        .run_incremental_sync(period("2025-01"), EntityFilter::ids(["ENT-B", "ENT-Z"]))
        .await
        .unwrap();
    assert_eq!(report.entities.succeeded, 1);
    assert!(h.store.bundle("ENT-A", period("2025-01")).is_none());
}

#[tokio::test]
async fn test_entity_failure_is_isolated() {
    let h = harness();
    h.receivables.fail_entity(
        "ENT-A",
        UpstreamError::MalformedRequest {
            source_id: "FAKE_RECEIVABLES".to_string(),
            message: "HTTP 422".to_string(),
        },
    );

    let report = h
        .orchestrator
        .run_incremental_sync(period("2025-01"), EntityFilter::All)
        .await
        .unwrap();

    assert_eq!(report.status, RunStatus::Partial);
    assert_eq!(report.entities.succeeded, 1);
    assert_eq!(report.entities.failed, 1);
    assert_eq!(report.failures[0].entity_id.as_deref(), Some("ENT-A"));
    assert!(report.aborted_reason.is_none());
    assert_eq!(
        report.downstream_signal.unwrap().entity_ids,
        vec!["ENT-B".to_string()]
    );
}

#[tokio::test]
async fn test_auth_error_aborts_the_run() {
    let mut settings = settings();
    settings.worker_pool_size = 1;
    let h = harness_with(
        vec![entity("ENT-A"), entity("ENT-B"), entity("ENT-C")],
        Vec::new(),
        Vec::new(),
        settings,
    );
    h.receivables.fail_entity(
        "ENT-A",
        UpstreamError::Auth {
            source_id: "FAKE_RECEIVABLES".to_string(),
            message: "HTTP 401".to_string(),
        },
    );

    let report = h
        .orchestrator
        .run_incremental_sync(period("2025-01"), EntityFilter::All)
        .await
        .unwrap();

    assert_eq!(report.status, RunStatus::Failed);
    assert!(report.aborted_reason.is_some());
    assert_eq!(report.entities.failed, 1);
    assert_eq!(report.entities.skipped, 2);
    assert_eq!(h.receivables.calls.load(Ordering::SeqCst), 1);
    assert!(report.failures[0].fatal);
    assert!(report.downstream_signal.is_none());
    assert_eq!(h.store.persist_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_low_join_coverage_fails_explicitly() {
    let h = harness_with(
        vec![entity("ENT-A")],
        vec![installment("I-A1", "ENT-A", "CA-1", "2025-01-15", None, dec!(100))],
        vec![
            payable("P-1", "UNKNOWN-1", "2025-01-10", None, dec!(10)),
            payable("P-2", "UNKNOWN-2", "2025-01-11", None, dec!(10)),
        ],
        settings(),
    );

    let report = h
        .orchestrator
        .run_incremental_sync(period("2025-01"), EntityFilter::All)
        .await
        .unwrap();

    assert_eq!(report.status, RunStatus::Failed);
    assert!(report.failures[0].error.contains("Join coverage too low"));
    assert_eq!(report.records.skipped, 2);
    assert!(h.store.bundle("ENT-A", period("2025-01")).is_none());
}

#[tokio::test]
async fn test_disabled_join_skips_cash_out() {
    let mut settings = settings();
    settings.join_strategy = JoinStrategy::Disabled;
    let h = harness_with(
        vec![entity("ENT-A")],
        vec![installment("I-A1", "ENT-A", "CA-1", "2025-01-15", None, dec!(100))],
        vec![payable("P-1", "CA-1", "2025-01-10", None, dec!(10))],
        settings,
    );

    let report = h
        .orchestrator
        .run_incremental_sync(period("2025-01"), EntityFilter::All)
        .await
        .unwrap();

    assert_eq!(report.status, RunStatus::Success);
    assert_eq!(report.records.skipped, 1);
    assert!(h
        .store
        .bundle("ENT-A", period("2025-01"))
        .unwrap()
        .cash_out
        .is_empty());
}

#[tokio::test]
async fn test_uncategorized_volume_raises_warning() {
    let mut p = payable("P-1", "CA-1", "2025-01-10", None, dec!(100));
    p.document_type = Some("RPA".to_string());
    let h = harness_with(vec![entity("ENT-A")], Vec::new(), vec![p], settings());

    let report = h
        .orchestrator
        .run_incremental_sync(period("2025-01"), EntityFilter::All)
        .await
        .unwrap();

    assert_eq!(report.warnings.len(), 1);
    assert_eq!(report.warnings[0].unmapped_codes, vec!["RPA".to_string()]);
}

#[tokio::test]
async fn test_missing_discount_rate_fails_the_entity() {
    let mut settings = settings();
    settings.valuation.discount_rate = None;
    let h = harness_with(
        vec![entity("ENT-A")],
        vec![installment("I-A1", "ENT-A", "CA-1", "2025-06-15", None, dec!(100))],
        Vec::new(),
        settings,
    );

    let report = h
        .orchestrator
        .run_incremental_sync(period("2025-01"), EntityFilter::All)
        .await
        .unwrap();

    assert_eq!(report.entities.failed, 1);
    assert!(report.failures[0].error.starts_with("Valuation failed"));
}

#[tokio::test]
async fn test_cancelled_run_starts_no_entity() {
    let h = harness();
    h.orchestrator.cancellation_flag().cancel();

    let report = h
        .orchestrator
        .run_incremental_sync(period("2025-01"), EntityFilter::All)
        .await
        .unwrap();

    assert!(report.cancelled);
    assert_eq!(report.entities.skipped, 2);
    assert_eq!(report.status, RunStatus::Failed);
    assert_eq!(h.receivables.calls.load(Ordering::SeqCst), 0);
    assert_eq!(h.store.persist_calls.load(Ordering::SeqCst), 0);
}

// =============================================================================
// Backfill
// =============================================================================

#[tokio::test]
async fn test_backfill_over_limit_fails_before_io() {
    let h = harness();
    let range = PeriodRange::new(period("2023-01"), period("2025-06")).unwrap();
    assert_eq!(range.len(), 30);

    let result = h
        .orchestrator
        .run_backfill(range, EntityFilter::All, None, false)
        .await;

    match result {
        Err(Error::BackfillLimitExceeded { requested, limit }) => {
            assert_eq!(requested, 30);
            assert_eq!(limit, 24);
        }
        other => panic!("expected BackfillLimitExceeded, got {:?}", other.map(|r| r.status)),
    }
    assert_eq!(h.payables.calls.load(Ordering::SeqCst), 0);
    assert_eq!(h.receivables.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_backfill_over_limit_runs_with_force() {
    let h = harness_with(vec![entity("ENT-A")], Vec::new(), Vec::new(), settings());
    let range = PeriodRange::new(period("2023-01"), period("2025-06")).unwrap();

    let report = h
        .orchestrator
        .run_backfill(range, EntityFilter::All, None, true)
        .await
        .unwrap();

    assert_eq!(report.periods.len(), 30);
    assert_eq!(report.entities.succeeded, 30);
    assert!(report.downstream_signal.is_none());
}

#[tokio::test]
async fn test_backfill_chains_opening_balances() {
    let h = harness_with(
        vec![entity("ENT-A")],
        vec![
            installment("I-1", "ENT-A", "CA-1", "2025-01-10", Some("2025-01-10"), dec!(100)),
            installment("I-2", "ENT-A", "CA-1", "2025-02-10", Some("2025-02-10"), dec!(200)),
            installment("I-3", "ENT-A", "CA-1", "2025-03-10", Some("2025-03-10"), dec!(300)),
        ],
        vec![payable("P-1", "CA-1", "2025-02-05", Some("2025-02-05"), dec!(50))],
        settings(),
    );
    let range = PeriodRange::new(period("2025-01"), period("2025-03")).unwrap();

    let report = h
        .orchestrator
        .run_backfill(range, EntityFilter::All, None, false)
        .await
        .unwrap();
    assert_eq!(report.status, RunStatus::Success);
    assert!(report.downstream_signal.is_none());

    let jan = h.store.bundle("ENT-A", period("2025-01")).unwrap().balance;
    let feb = h.store.bundle("ENT-A", period("2025-02")).unwrap().balance;
    let mar = h.store.bundle("ENT-A", period("2025-03")).unwrap().balance;
    assert_eq!(jan.closing, dec!(100));
    assert_eq!(feb.opening, dec!(100));
    assert_eq!(feb.closing, dec!(250));
    assert_eq!(mar.opening, dec!(250));
    assert_eq!(mar.closing, dec!(550));
}
