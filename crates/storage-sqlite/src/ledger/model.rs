//! Database model for raw payload audit rows.

use chrono::NaiveDateTime;
use diesel::prelude::*;

use cashsync_core::ledger::RawPayloadAudit;

use crate::errors::StorageError;
use crate::utils::parse_period;

#[derive(Queryable, Selectable, Insertable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::raw_payload_audit)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct RawPayloadAuditDB {
    pub source: String,
    pub period: String,
    pub content_hash: String,
    pub fetched_at: NaiveDateTime,
    pub record_count: i64,
    pub payload: Option<String>,
}

impl From<RawPayloadAudit> for RawPayloadAuditDB {
    fn from(audit: RawPayloadAudit) -> Self {
        Self {
            source: audit.source,
            period: audit.period.to_string(),
            content_hash: audit.content_hash,
            fetched_at: audit.fetched_at,
            record_count: audit.record_count,
            payload: audit.payload,
        }
    }
}

impl TryFrom<RawPayloadAuditDB> for RawPayloadAudit {
    type Error = StorageError;

    fn try_from(db: RawPayloadAuditDB) -> Result<Self, Self::Error> {
        Ok(Self {
            source: db.source,
            period: parse_period(&db.period)?,
            content_hash: db.content_hash,
            fetched_at: db.fetched_at,
            record_count: db.record_count,
            payload: db.payload,
        })
    }
}

/// Current head hash of a (source, period).
#[derive(Queryable, Selectable, Insertable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::ledger_heads)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct LedgerHeadDB {
    pub source: String,
    pub period: String,
    pub content_hash: String,
    pub updated_at: NaiveDateTime,
}

impl From<&RawPayloadAuditDB> for LedgerHeadDB {
    fn from(row: &RawPayloadAuditDB) -> Self {
        Self {
            source: row.source.clone(),
            period: row.period.clone(),
            content_hash: row.content_hash.clone(),
            updated_at: row.fetched_at,
        }
    }
}
