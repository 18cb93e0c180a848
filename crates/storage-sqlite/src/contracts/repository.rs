use async_trait::async_trait;
use diesel::prelude::*;
use diesel::SqliteConnection;
use std::sync::Arc;

use cashsync_core::contracts::{ResolutionKey, ResolutionKeyRepositoryTrait};
use cashsync_core::Result;

use super::model::ResolutionKeyDB;
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::schema::resolution_keys;

pub struct ResolutionKeyRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl ResolutionKeyRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl ResolutionKeyRepositoryTrait for ResolutionKeyRepository {
    async fn upsert_keys(&self, keys: Vec<ResolutionKey>) -> Result<usize> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                let mut affected = 0;
                for key in keys {
                    let row = ResolutionKeyDB::from(key);
                    affected += diesel::insert_into(resolution_keys::table)
                        .values(&row)
                        .on_conflict(resolution_keys::code)
                        .do_update()
                        .set((
                            resolution_keys::entity_id.eq(&row.entity_id),
                            resolution_keys::status.eq(&row.status),
                            resolution_keys::refreshed_at.eq(row.refreshed_at),
                        ))
                        .execute(conn)
                        .map_err(StorageError::from)?;
                }
                Ok(affected)
            })
            .await
    }

    fn load_all(&self) -> Result<Vec<ResolutionKey>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = resolution_keys::table
            .select(ResolutionKeyDB::as_select())
            .load(&mut conn)
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(ResolutionKey::from).collect())
    }
}
