//! Database model for resolution keys.

use chrono::NaiveDateTime;
use diesel::prelude::*;

use cashsync_core::contracts::{ContractStatus, ResolutionKey};

#[derive(Queryable, Selectable, Insertable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::resolution_keys)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ResolutionKeyDB {
    pub code: String,
    pub entity_id: String,
    pub status: String,
    pub refreshed_at: NaiveDateTime,
}

impl From<ResolutionKey> for ResolutionKeyDB {
    fn from(key: ResolutionKey) -> Self {
        Self {
            code: key.code,
            entity_id: key.entity_id,
            status: key.status.into(),
            refreshed_at: key.refreshed_at,
        }
    }
}

impl From<ResolutionKeyDB> for ResolutionKey {
    fn from(db: ResolutionKeyDB) -> Self {
        Self {
            code: db.code,
            entity_id: db.entity_id,
            status: ContractStatus::from(db.status),
            refreshed_at: db.refreshed_at,
        }
    }
}
