//! Database model for entities.

use chrono::NaiveDateTime;
use diesel::prelude::*;

use cashsync_core::entities::Entity;

#[derive(Queryable, Selectable, Insertable, AsChangeset, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::entities)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct EntityDB {
    pub id: String,
    pub display_name: String,
    pub active: bool,
    pub source: String,
    pub updated_at: NaiveDateTime,
}

impl From<Entity> for EntityDB {
    fn from(entity: Entity) -> Self {
        Self {
            id: entity.id,
            display_name: entity.display_name,
            active: entity.active,
            source: entity.source,
            updated_at: entity.updated_at,
        }
    }
}

impl From<EntityDB> for Entity {
    fn from(db: EntityDB) -> Self {
        Self {
            id: db.id,
            display_name: db.display_name,
            active: db.active,
            source: db.source,
            updated_at: db.updated_at,
        }
    }
}
