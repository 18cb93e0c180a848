//! Entities module - business entities that cash flow is aggregated under.

mod entities_model;
mod entities_traits;

// Re-export the public interface
pub use entities_model::{Entity, EntityFilter};
pub use entities_traits::EntityRepositoryTrait;
