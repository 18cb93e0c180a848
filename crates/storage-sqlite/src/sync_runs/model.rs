//! Database model for sync runs.
//!
//! Summary columns are denormalized for querying; the full report is kept as JSON.

use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::Serialize;

use cashsync_core::sync::RunReport;

use crate::errors::StorageError;

#[derive(Queryable, Selectable, Insertable, AsChangeset, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::sync_runs)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SyncRunDB {
    pub id: String,
    pub mode: String,
    pub status: String,
    pub started_at: NaiveDateTime,
    pub finished_at: Option<NaiveDateTime>,
    pub report_json: String,
}

/// Serde name of a unit enum variant, e.g. `"PARTIAL"`.
fn variant_name<T: Serialize>(value: &T) -> Result<String, StorageError> {
    match serde_json::to_value(value)? {
        serde_json::Value::String(name) => Ok(name),
        other => Ok(other.to_string()),
    }
}

impl TryFrom<&RunReport> for SyncRunDB {
    type Error = StorageError;

    fn try_from(report: &RunReport) -> Result<Self, Self::Error> {
        Ok(Self {
            id: report.id.clone(),
            mode: variant_name(&report.mode)?,
            status: variant_name(&report.status)?,
            started_at: report.started_at.naive_utc(),
            finished_at: report.finished_at.map(|t| t.naive_utc()),
            report_json: serde_json::to_string(report)?,
        })
    }
}

impl TryFrom<SyncRunDB> for RunReport {
    type Error = StorageError;

    fn try_from(db: SyncRunDB) -> Result<Self, Self::Error> {
        Ok(serde_json::from_str(&db.report_json)?)
    }
}
