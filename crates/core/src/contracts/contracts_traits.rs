//! Resolution key repository trait.

use async_trait::async_trait;

use super::contracts_model::ResolutionKey;
use crate::errors::Result;

/// Persistence contract for the resolution index.
#[async_trait]
pub trait ResolutionKeyRepositoryTrait: Send + Sync {
    /// Upserts keys by code. Returns the number of rows written.
    async fn upsert_keys(&self, keys: Vec<ResolutionKey>) -> Result<usize>;

    /// Loads every known key. Read once per sync run.
    fn load_all(&self) -> Result<Vec<ResolutionKey>>;
}
