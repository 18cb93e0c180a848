//! Entity repository trait.

use async_trait::async_trait;

use super::entities_model::Entity;
use crate::errors::Result;

/// Persistence contract for entities.
///
/// Entities are written only by the resolution index refresh; sync runs read them.
#[async_trait]
pub trait EntityRepositoryTrait: Send + Sync {
    /// Inserts or replaces entities by id. Returns the number of rows written.
    async fn upsert_entities(&self, entities: Vec<Entity>) -> Result<usize>;

    /// Lists entities, optionally only active ones.
    fn list(&self, active_only: bool) -> Result<Vec<Entity>>;
}
