use async_trait::async_trait;
use diesel::prelude::*;
use diesel::SqliteConnection;
use std::sync::Arc;

use cashsync_core::entities::{Entity, EntityRepositoryTrait};
use cashsync_core::Result;

use super::model::EntityDB;
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::schema::entities;

pub struct EntityRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl EntityRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl EntityRepositoryTrait for EntityRepository {
    async fn upsert_entities(&self, new_entities: Vec<Entity>) -> Result<usize> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                let mut affected = 0;
                for entity in new_entities {
                    let row = EntityDB::from(entity);
                    affected += diesel::insert_into(entities::table)
                        .values(&row)
                        .on_conflict(entities::id)
                        .do_update()
                        .set(&row)
                        .execute(conn)
                        .map_err(StorageError::from)?;
                }
                Ok(affected)
            })
            .await
    }

    fn list(&self, active_only: bool) -> Result<Vec<Entity>> {
        let mut conn = get_connection(&self.pool)?;
        let mut query = entities::table.into_boxed();
        if active_only {
            query = query.filter(entities::active.eq(true));
        }
        let rows = query
            .order(entities::id.asc())
            .select(EntityDB::as_select())
            .load(&mut conn)
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(Entity::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::setup_db;
    use chrono::Utc;

    fn entity(id: &str, active: bool) -> Entity {
        Entity {
            id: id.to_string(),
            display_name: format!("Entity {}", id),
            active,
            source: "RECEIVABLES_API".to_string(),
            updated_at: Utc::now().naive_utc(),
        }
    }

    #[tokio::test]
    async fn test_upsert_replaces_by_id() {
        let (pool, writer, _dir) = setup_db();
        let repo = EntityRepository::new(pool, writer);

        repo.upsert_entities(vec![entity("A", true), entity("B", true)])
            .await
            .unwrap();
        repo.upsert_entities(vec![entity("B", false)]).await.unwrap();

        let all = repo.list(false).unwrap();
        assert_eq!(all.len(), 2);
        let active: Vec<_> = repo.list(true).unwrap().into_iter().map(|e| e.id).collect();
        assert_eq!(active, vec!["A"]);
    }
}
