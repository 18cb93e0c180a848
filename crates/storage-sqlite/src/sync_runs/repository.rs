use async_trait::async_trait;
use diesel::prelude::*;
use diesel::SqliteConnection;
use std::sync::Arc;

use cashsync_core::sync::{RunReport, SyncRunRepositoryTrait};
use cashsync_core::Result;

use super::model::SyncRunDB;
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::schema::sync_runs;

pub struct SyncRunRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl SyncRunRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }

    pub fn get_by_id(&self, run_id: &str) -> Result<Option<RunReport>> {
        let mut conn = get_connection(&self.pool)?;
        let row = sync_runs::table
            .find(run_id)
            .select(SyncRunDB::as_select())
            .first(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        Ok(row.map(RunReport::try_from).transpose()?)
    }
}

#[async_trait]
impl SyncRunRepositoryTrait for SyncRunRepository {
    async fn save_run(&self, report: RunReport) -> Result<()> {
        let row = SyncRunDB::try_from(&report)?;
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<()> {
                diesel::insert_into(sync_runs::table)
                    .values(&row)
                    .on_conflict(sync_runs::id)
                    .do_update()
                    .set(&row)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }

    fn get_recent(&self, limit: i64) -> Result<Vec<RunReport>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = sync_runs::table
            .order(sync_runs::started_at.desc())
            .limit(limit)
            .select(SyncRunDB::as_select())
            .load(&mut conn)
            .map_err(StorageError::from)?;
        rows.into_iter()
            .map(|row| RunReport::try_from(row).map_err(Into::into))
            .collect()
    }
}
