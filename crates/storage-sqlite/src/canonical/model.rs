//! Database models for canonical records.
//!
//! Decimal columns are TEXT; periods are `YYYY-MM`.

use chrono::NaiveDateTime;
use diesel::prelude::*;
use std::str::FromStr;

use cashsync_core::aging::DelinquencyBucket;
use cashsync_core::cashflow::{Balance, CashInCategory, CashInRecord, CashOutRecord, RecordType};
use cashsync_core::valuation::PortfolioStats;

use crate::errors::StorageError;
use crate::utils::{parse_decimal, parse_period};

fn parse_detail(detail: Option<String>) -> Result<Option<serde_json::Value>, StorageError> {
    Ok(detail.map(|raw| serde_json::from_str(&raw)).transpose()?)
}

fn parse_record_type(raw: &str) -> Result<RecordType, StorageError> {
    RecordType::from_str(raw).map_err(|e| StorageError::SerializationError(e.to_string()))
}

#[derive(Queryable, Selectable, Insertable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::cash_in_records)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct CashInRecordDB {
    pub entity_id: String,
    pub ref_period: String,
    pub category: String,
    pub record_type: String,
    pub origin_id: String,
    pub amount: String,
    pub detail: Option<String>,
    pub updated_at: NaiveDateTime,
}

impl CashInRecordDB {
    pub fn from_domain(record: &CashInRecord, updated_at: NaiveDateTime) -> Self {
        Self {
            entity_id: record.entity_id.clone(),
            ref_period: record.ref_period.to_string(),
            category: record.category.as_str().to_string(),
            record_type: record.record_type.as_str().to_string(),
            origin_id: record.origin_id.clone(),
            amount: record.amount.to_string(),
            detail: record.detail.as_ref().map(|d| d.to_string()),
            updated_at,
        }
    }
}

impl TryFrom<CashInRecordDB> for CashInRecord {
    type Error = StorageError;

    fn try_from(db: CashInRecordDB) -> Result<Self, Self::Error> {
        Ok(Self {
            ref_period: parse_period(&db.ref_period)?,
            category: CashInCategory::from_str(&db.category)
                .map_err(|e| StorageError::SerializationError(e.to_string()))?,
            record_type: parse_record_type(&db.record_type)?,
            amount: parse_decimal("cash_in_records.amount", &db.amount)?,
            detail: parse_detail(db.detail)?,
            entity_id: db.entity_id,
            origin_id: db.origin_id,
        })
    }
}

#[derive(Queryable, Selectable, Insertable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::cash_out_records)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct CashOutRecordDB {
    pub entity_id: String,
    pub ref_period: String,
    pub category: String,
    pub record_type: String,
    pub origin_id: String,
    pub amount: String,
    pub detail: Option<String>,
    pub updated_at: NaiveDateTime,
}

impl CashOutRecordDB {
    pub fn from_domain(record: &CashOutRecord, updated_at: NaiveDateTime) -> Self {
        Self {
            entity_id: record.entity_id.clone(),
            ref_period: record.ref_period.to_string(),
            category: record.category.clone(),
            record_type: record.record_type.as_str().to_string(),
            origin_id: record.origin_id.clone(),
            amount: record.amount.to_string(),
            detail: record.detail.as_ref().map(|d| d.to_string()),
            updated_at,
        }
    }
}

impl TryFrom<CashOutRecordDB> for CashOutRecord {
    type Error = StorageError;

    fn try_from(db: CashOutRecordDB) -> Result<Self, Self::Error> {
        Ok(Self {
            ref_period: parse_period(&db.ref_period)?,
            record_type: parse_record_type(&db.record_type)?,
            amount: parse_decimal("cash_out_records.amount", &db.amount)?,
            detail: parse_detail(db.detail)?,
            entity_id: db.entity_id,
            category: db.category,
            origin_id: db.origin_id,
        })
    }
}

#[derive(Queryable, Selectable, Insertable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::balances)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct BalanceDB {
    pub entity_id: String,
    pub ref_period: String,
    pub opening: String,
    pub closing: String,
    pub updated_at: NaiveDateTime,
    pub input_hash: Option<String>,
}

impl BalanceDB {
    pub fn from_domain(balance: &Balance, input_hash: &str, updated_at: NaiveDateTime) -> Self {
        Self {
            entity_id: balance.entity_id.clone(),
            ref_period: balance.ref_period.to_string(),
            opening: balance.opening.to_string(),
            closing: balance.closing.to_string(),
            updated_at,
            input_hash: Some(input_hash.to_string()),
        }
    }
}

impl TryFrom<BalanceDB> for Balance {
    type Error = StorageError;

    fn try_from(db: BalanceDB) -> Result<Self, Self::Error> {
        Ok(Self {
            ref_period: parse_period(&db.ref_period)?,
            opening: parse_decimal("balances.opening", &db.opening)?,
            closing: parse_decimal("balances.closing", &db.closing)?,
            entity_id: db.entity_id,
        })
    }
}

#[derive(Queryable, Selectable, Insertable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::portfolio_stats)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PortfolioStatsDB {
    pub entity_id: String,
    pub ref_period: String,
    pub present_value: String,
    pub weighted_avg_term: String,
    pub duration: String,
    pub active_count: i64,
    pub total_count: i64,
    pub updated_at: NaiveDateTime,
}

impl PortfolioStatsDB {
    pub fn from_domain(stats: &PortfolioStats, updated_at: NaiveDateTime) -> Self {
        Self {
            entity_id: stats.entity_id.clone(),
            ref_period: stats.ref_period.to_string(),
            present_value: stats.present_value.to_string(),
            weighted_avg_term: stats.weighted_avg_term.to_string(),
            duration: stats.duration.to_string(),
            active_count: stats.active_count,
            total_count: stats.total_count,
            updated_at,
        }
    }
}

impl TryFrom<PortfolioStatsDB> for PortfolioStats {
    type Error = StorageError;

    fn try_from(db: PortfolioStatsDB) -> Result<Self, Self::Error> {
        Ok(Self {
            ref_period: parse_period(&db.ref_period)?,
            present_value: parse_decimal("portfolio_stats.present_value", &db.present_value)?,
            weighted_avg_term: parse_decimal(
                "portfolio_stats.weighted_avg_term",
                &db.weighted_avg_term,
            )?,
            duration: parse_decimal("portfolio_stats.duration", &db.duration)?,
            active_count: db.active_count,
            total_count: db.total_count,
            entity_id: db.entity_id,
        })
    }
}

#[derive(Queryable, Selectable, Insertable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::delinquency_buckets)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct DelinquencyBucketDB {
    pub entity_id: String,
    pub ref_period: String,
    pub bucket_label: String,
    pub amount: String,
    pub installment_count: i64,
    pub updated_at: NaiveDateTime,
}

impl DelinquencyBucketDB {
    pub fn from_domain(bucket: &DelinquencyBucket, updated_at: NaiveDateTime) -> Self {
        Self {
            entity_id: bucket.entity_id.clone(),
            ref_period: bucket.ref_period.to_string(),
            bucket_label: bucket.bucket_label.clone(),
            amount: bucket.amount.to_string(),
            installment_count: bucket.count,
            updated_at,
        }
    }
}

impl TryFrom<DelinquencyBucketDB> for DelinquencyBucket {
    type Error = StorageError;

    fn try_from(db: DelinquencyBucketDB) -> Result<Self, Self::Error> {
        Ok(Self {
            ref_period: parse_period(&db.ref_period)?,
            amount: parse_decimal("delinquency_buckets.amount", &db.amount)?,
            count: db.installment_count,
            entity_id: db.entity_id,
            bucket_label: db.bucket_label,
        })
    }
}
