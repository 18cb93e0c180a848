//! Canonical store: per-(entity, period) replace-by-upsert.

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::upsert::excluded;
use diesel::SqliteConnection;
use log::debug;
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::sync::Arc;

use cashsync_core::aging::DelinquencyBucket;
use cashsync_core::cashflow::{Balance, CashInRecord, CashOutRecord};
use cashsync_core::period::RefPeriod;
use cashsync_core::sync::{CanonicalBundle, CanonicalStoreTrait, PersistSummary};
use cashsync_core::valuation::PortfolioStats;
use cashsync_core::Result;

use super::model::{
    BalanceDB, CashInRecordDB, CashOutRecordDB, DelinquencyBucketDB, PortfolioStatsDB,
};
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::schema::{balances, cash_in_records, cash_out_records, delinquency_buckets, portfolio_stats};
use crate::utils::parse_decimal;

/// (category, record_type, origin_id) within one partition.
type RecordKey = (String, String, String);

pub struct CanonicalStoreRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl CanonicalStoreRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }

    pub fn cash_in(&self, entity_id: &str, period: RefPeriod) -> Result<Vec<CashInRecord>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = cash_in_records::table
            .filter(cash_in_records::entity_id.eq(entity_id))
            .filter(cash_in_records::ref_period.eq(period.to_string()))
            .order((cash_in_records::origin_id.asc(), cash_in_records::record_type.asc()))
            .select(CashInRecordDB::as_select())
            .load(&mut conn)
            .map_err(StorageError::from)?;
        rows.into_iter()
            .map(|row| CashInRecord::try_from(row).map_err(Into::into))
            .collect()
    }

    pub fn cash_out(&self, entity_id: &str, period: RefPeriod) -> Result<Vec<CashOutRecord>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = cash_out_records::table
            .filter(cash_out_records::entity_id.eq(entity_id))
            .filter(cash_out_records::ref_period.eq(period.to_string()))
            .order((cash_out_records::origin_id.asc(), cash_out_records::record_type.asc()))
            .select(CashOutRecordDB::as_select())
            .load(&mut conn)
            .map_err(StorageError::from)?;
        rows.into_iter()
            .map(|row| CashOutRecord::try_from(row).map_err(Into::into))
            .collect()
    }

    pub fn balance(&self, entity_id: &str, period: RefPeriod) -> Result<Option<Balance>> {
        let mut conn = get_connection(&self.pool)?;
        let row = balances::table
            .filter(balances::entity_id.eq(entity_id))
            .filter(balances::ref_period.eq(period.to_string()))
            .select(BalanceDB::as_select())
            .first(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        Ok(row.map(Balance::try_from).transpose()?)
    }

    pub fn portfolio_stats(
        &self,
        entity_id: &str,
        period: RefPeriod,
    ) -> Result<Option<PortfolioStats>> {
        let mut conn = get_connection(&self.pool)?;
        let row = portfolio_stats::table
            .filter(portfolio_stats::entity_id.eq(entity_id))
            .filter(portfolio_stats::ref_period.eq(period.to_string()))
            .select(PortfolioStatsDB::as_select())
            .first(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        Ok(row.map(PortfolioStats::try_from).transpose()?)
    }

    pub fn delinquency(&self, entity_id: &str, period: RefPeriod) -> Result<Vec<DelinquencyBucket>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = delinquency_buckets::table
            .filter(delinquency_buckets::entity_id.eq(entity_id))
            .filter(delinquency_buckets::ref_period.eq(period.to_string()))
            .order(delinquency_buckets::bucket_label.asc())
            .select(DelinquencyBucketDB::as_select())
            .load(&mut conn)
            .map_err(StorageError::from)?;
        rows.into_iter()
            .map(|row| DelinquencyBucket::try_from(row).map_err(Into::into))
            .collect()
    }
}

fn persist_cash_in(
    conn: &mut SqliteConnection,
    entity: &str,
    period: &str,
    rows: &[CashInRecordDB],
) -> std::result::Result<(usize, usize), StorageError> {
    use cash_in_records::dsl as t;

    let mut upserted = 0;
    for row in rows {
        upserted += diesel::insert_into(t::cash_in_records)
            .values(row)
            .on_conflict((t::entity_id, t::ref_period, t::category, t::record_type, t::origin_id))
            .do_update()
            .set((
                t::amount.eq(excluded(t::amount)),
                t::detail.eq(excluded(t::detail)),
                t::updated_at.eq(excluded(t::updated_at)),
            ))
            .execute(conn)?;
    }

    let keep: HashSet<RecordKey> = rows
        .iter()
        .map(|r| (r.category.clone(), r.record_type.clone(), r.origin_id.clone()))
        .collect();
    let existing: Vec<RecordKey> = t::cash_in_records
        .filter(t::entity_id.eq(entity))
        .filter(t::ref_period.eq(period))
        .select((t::category, t::record_type, t::origin_id))
        .load(conn)?;

    let mut pruned = 0;
    for (category, record_type, origin_id) in existing.into_iter().filter(|k| !keep.contains(k)) {
        pruned += diesel::delete(
            t::cash_in_records
                .filter(t::entity_id.eq(entity))
                .filter(t::ref_period.eq(period))
                .filter(t::category.eq(category))
                .filter(t::record_type.eq(record_type))
                .filter(t::origin_id.eq(origin_id)),
        )
        .execute(conn)?;
    }
    Ok((upserted, pruned))
}

fn persist_cash_out(
    conn: &mut SqliteConnection,
    entity: &str,
    period: &str,
    rows: &[CashOutRecordDB],
) -> std::result::Result<(usize, usize), StorageError> {
    use cash_out_records::dsl as t;

    let mut upserted = 0;
    for row in rows {
        upserted += diesel::insert_into(t::cash_out_records)
            .values(row)
            .on_conflict((t::entity_id, t::ref_period, t::category, t::record_type, t::origin_id))
            .do_update()
            .set((
                t::amount.eq(excluded(t::amount)),
                t::detail.eq(excluded(t::detail)),
                t::updated_at.eq(excluded(t::updated_at)),
            ))
            .execute(conn)?;
    }

    let keep: HashSet<RecordKey> = rows
        .iter()
        .map(|r| (r.category.clone(), r.record_type.clone(), r.origin_id.clone()))
        .collect();
    let existing: Vec<RecordKey> = t::cash_out_records
        .filter(t::entity_id.eq(entity))
        .filter(t::ref_period.eq(period))
        .select((t::category, t::record_type, t::origin_id))
        .load(conn)?;

    let mut pruned = 0;
    for (category, record_type, origin_id) in existing.into_iter().filter(|k| !keep.contains(k)) {
        pruned += diesel::delete(
            t::cash_out_records
                .filter(t::entity_id.eq(entity))
                .filter(t::ref_period.eq(period))
                .filter(t::category.eq(category))
                .filter(t::record_type.eq(record_type))
                .filter(t::origin_id.eq(origin_id)),
        )
        .execute(conn)?;
    }
    Ok((upserted, pruned))
}

fn persist_delinquency(
    conn: &mut SqliteConnection,
    entity: &str,
    period: &str,
    rows: &[DelinquencyBucketDB],
) -> std::result::Result<(usize, usize), StorageError> {
    use delinquency_buckets::dsl as t;

    let mut upserted = 0;
    for row in rows {
        upserted += diesel::insert_into(t::delinquency_buckets)
            .values(row)
            .on_conflict((t::entity_id, t::ref_period, t::bucket_label))
            .do_update()
            .set((
                t::amount.eq(excluded(t::amount)),
                t::installment_count.eq(excluded(t::installment_count)),
                t::updated_at.eq(excluded(t::updated_at)),
            ))
            .execute(conn)?;
    }

    let keep: Vec<&str> = rows.iter().map(|r| r.bucket_label.as_str()).collect();
    let pruned = diesel::delete(
        t::delinquency_buckets
            .filter(t::entity_id.eq(entity))
            .filter(t::ref_period.eq(period))
            .filter(t::bucket_label.ne_all(keep)),
    )
    .execute(conn)?;
    Ok((upserted, pruned))
}

#[async_trait]
impl CanonicalStoreTrait for CanonicalStoreRepository {
    async fn persist_bundle(&self, bundle: CanonicalBundle) -> Result<PersistSummary> {
        let now = Utc::now().naive_utc();
        let entity = bundle.entity_id.clone();
        let period = bundle.period.to_string();

        let cash_in: Vec<_> = bundle
            .cash_in
            .iter()
            .map(|r| CashInRecordDB::from_domain(r, now))
            .collect();
        let cash_out: Vec<_> = bundle
            .cash_out
            .iter()
            .map(|r| CashOutRecordDB::from_domain(r, now))
            .collect();
        let balance = BalanceDB::from_domain(&bundle.balance, &bundle.input_hash, now);
        let stats = PortfolioStatsDB::from_domain(&bundle.portfolio_stats, now);
        let buckets: Vec<_> = bundle
            .delinquency
            .iter()
            .map(|b| DelinquencyBucketDB::from_domain(b, now))
            .collect();

        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<PersistSummary> {
                let (in_upserted, in_pruned) = persist_cash_in(conn, &entity, &period, &cash_in)?;
                let (out_upserted, out_pruned) =
                    persist_cash_out(conn, &entity, &period, &cash_out)?;
                let (bucket_upserted, bucket_pruned) =
                    persist_delinquency(conn, &entity, &period, &buckets)?;

                diesel::insert_into(balances::table)
                    .values(&balance)
                    .on_conflict((balances::entity_id, balances::ref_period))
                    .do_update()
                    .set((
                        balances::opening.eq(excluded(balances::opening)),
                        balances::closing.eq(excluded(balances::closing)),
                        balances::updated_at.eq(excluded(balances::updated_at)),
                        balances::input_hash.eq(excluded(balances::input_hash)),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;

                diesel::insert_into(portfolio_stats::table)
                    .values(&stats)
                    .on_conflict((portfolio_stats::entity_id, portfolio_stats::ref_period))
                    .do_update()
                    .set((
                        portfolio_stats::present_value.eq(excluded(portfolio_stats::present_value)),
                        portfolio_stats::weighted_avg_term
                            .eq(excluded(portfolio_stats::weighted_avg_term)),
                        portfolio_stats::duration.eq(excluded(portfolio_stats::duration)),
                        portfolio_stats::active_count.eq(excluded(portfolio_stats::active_count)),
                        portfolio_stats::total_count.eq(excluded(portfolio_stats::total_count)),
                        portfolio_stats::updated_at.eq(excluded(portfolio_stats::updated_at)),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;

                let summary = PersistSummary {
                    upserted: in_upserted + out_upserted + bucket_upserted + 2,
                    pruned: in_pruned + out_pruned + bucket_pruned,
                };
                debug!("Persisted {} {}: {:?}", entity, period, summary);
                Ok(summary)
            })
            .await
    }

    fn closing_balance(&self, entity_id: &str, period: RefPeriod) -> Result<Option<Decimal>> {
        let mut conn = get_connection(&self.pool)?;
        let closing = balances::table
            .filter(balances::entity_id.eq(entity_id))
            .filter(balances::ref_period.eq(period.to_string()))
            .select(balances::closing)
            .first::<String>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        Ok(closing
            .map(|raw| parse_decimal("balances.closing", &raw))
            .transpose()?)
    }

    fn input_hash(&self, entity_id: &str, period: RefPeriod) -> Result<Option<String>> {
        let mut conn = get_connection(&self.pool)?;
        let hash = balances::table
            .filter(balances::entity_id.eq(entity_id))
            .filter(balances::ref_period.eq(period.to_string()))
            .select(balances::input_hash)
            .first::<Option<String>>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        Ok(hash.flatten())
    }
}

#[cfg(test)]
mod tests;
