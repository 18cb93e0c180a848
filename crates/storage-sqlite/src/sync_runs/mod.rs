//! SQLite storage implementation for sync run reports.

mod model;
mod repository;

pub use model::SyncRunDB;
pub use repository::SyncRunRepository;
