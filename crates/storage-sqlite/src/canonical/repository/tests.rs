use rust_decimal_macros::dec;
use serde_json::json;

use cashsync_core::aging::AgingReport;
use cashsync_core::cashflow::{CashInCategory, RecordType};

use super::*;
use crate::test_support::setup_db;

fn period() -> RefPeriod {
    "2025-01".parse().unwrap()
}

fn cash_in(origin_id: &str, record_type: RecordType, amount: Decimal) -> CashInRecord {
    CashInRecord {
        entity_id: "ENT-1".to_string(),
        ref_period: period(),
        category: CashInCategory::Current,
        record_type,
        amount,
        origin_id: origin_id.to_string(),
        detail: Some(json!({"contractCode": "C-1"})),
    }
}

fn cash_out(origin_id: &str, amount: Decimal) -> CashOutRecord {
    CashOutRecord {
        entity_id: "ENT-1".to_string(),
        ref_period: period(),
        category: "construction".to_string(),
        record_type: RecordType::Actual,
        amount,
        origin_id: origin_id.to_string(),
        detail: None,
    }
}

fn bundle(cash_in: Vec<CashInRecord>, cash_out: Vec<CashOutRecord>) -> CanonicalBundle {
    let balance = Balance::compute("ENT-1", period(), dec!(100), &cash_in, &cash_out);
    CanonicalBundle {
        entity_id: "ENT-1".to_string(),
        period: period(),
        cash_in,
        cash_out,
        balance,
        portfolio_stats: PortfolioStats {
            entity_id: "ENT-1".to_string(),
            ref_period: period(),
            present_value: dec!(1234.567891),
            weighted_avg_term: dec!(45.5),
            duration: dec!(0.124658),
            active_count: 2,
            total_count: 3,
        },
        delinquency: AgingReport::default().into_rows("ENT-1", period()),
        input_hash: "inputs-1".to_string(),
    }
}

#[tokio::test]
async fn test_persisting_the_same_bundle_twice_is_idempotent() {
    let (pool, writer, _dir) = setup_db();
    let store = CanonicalStoreRepository::new(pool, writer);
    let b = bundle(
        vec![
            cash_in("I-1", RecordType::Forecast, dec!(500)),
            cash_in("I-1", RecordType::Actual, dec!(500)),
        ],
        vec![cash_out("P-1", dec!(200))],
    );

    store.persist_bundle(b.clone()).await.unwrap();
    let first_in = store.cash_in("ENT-1", period()).unwrap();
    let second = store.persist_bundle(b).await.unwrap();

    assert_eq!(second.pruned, 0);
    assert_eq!(store.cash_in("ENT-1", period()).unwrap(), first_in);
    assert_eq!(first_in.len(), 2);
    assert_eq!(store.cash_out("ENT-1", period()).unwrap().len(), 1);
    assert_eq!(store.delinquency("ENT-1", period()).unwrap().len(), 5);
    assert_eq!(
        store.closing_balance("ENT-1", period()).unwrap(),
        Some(dec!(400))
    );
}

#[tokio::test]
async fn test_rows_missing_from_a_replay_are_pruned() {
    let (pool, writer, _dir) = setup_db();
    let store = CanonicalStoreRepository::new(pool, writer);

    store
        .persist_bundle(bundle(
            vec![
                cash_in("I-1", RecordType::Actual, dec!(500)),
                cash_in("I-2", RecordType::Actual, dec!(300)),
            ],
            vec![cash_out("P-1", dec!(200)), cash_out("P-2", dec!(50))],
        ))
        .await
        .unwrap();

    let summary = store
        .persist_bundle(bundle(
            vec![cash_in("I-1", RecordType::Actual, dec!(450))],
            vec![cash_out("P-1", dec!(200))],
        ))
        .await
        .unwrap();

    assert_eq!(summary.pruned, 2);
    let remaining = store.cash_in("ENT-1", period()).unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].amount, dec!(450));
    assert_eq!(remaining[0].detail, Some(json!({"contractCode": "C-1"})));

    let balance = store.balance("ENT-1", period()).unwrap().unwrap();
    assert_eq!(balance.closing, dec!(350));
}

#[tokio::test]
async fn test_stats_round_trip_and_other_partitions_are_untouched() {
    let (pool, writer, _dir) = setup_db();
    let store = CanonicalStoreRepository::new(pool, writer);

    store
        .persist_bundle(bundle(vec![cash_in("I-1", RecordType::Actual, dec!(1))], vec![]))
        .await
        .unwrap();

    let mut next = bundle(vec![], vec![]);
    next.period = period().succ();
    next.balance.ref_period = period().succ();
    next.portfolio_stats.ref_period = period().succ();
    next.delinquency = AgingReport::default().into_rows("ENT-1", period().succ());
    store.persist_bundle(next).await.unwrap();

    assert_eq!(store.cash_in("ENT-1", period()).unwrap().len(), 1);
    let stats = store.portfolio_stats("ENT-1", period()).unwrap().unwrap();
    assert_eq!(stats.present_value, dec!(1234.567891));
    assert_eq!(stats.total_count, 3);
    assert_eq!(store.closing_balance("ENT-2", period()).unwrap(), None);
}

#[tokio::test]
async fn test_input_hash_is_stored_with_the_bundle() {
    let (pool, writer, _dir) = setup_db();
    let store = CanonicalStoreRepository::new(pool, writer);
    assert_eq!(store.input_hash("ENT-1", period()).unwrap(), None);

    store.persist_bundle(bundle(vec![], vec![])).await.unwrap();
    assert_eq!(
        store.input_hash("ENT-1", period()).unwrap().as_deref(),
        Some("inputs-1")
    );

    let mut replay = bundle(vec![], vec![]);
    replay.input_hash = "inputs-2".to_string();
    store.persist_bundle(replay).await.unwrap();
    assert_eq!(
        store.input_hash("ENT-1", period()).unwrap().as_deref(),
        Some("inputs-2")
    );
    assert_eq!(store.input_hash("ENT-2", period()).unwrap(), None);
}
