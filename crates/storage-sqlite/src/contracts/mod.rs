//! SQLite storage implementation for the contract resolution index.

mod model;
mod repository;

pub use model::ResolutionKeyDB;
pub use repository::ResolutionKeyRepository;
