//! SQLite storage implementation for cashsync.
//!
//! This crate is the only place where Diesel is used. It implements the
//! repository traits defined in `cashsync-core`:
//! - connection pooling, pragmas and embedded migrations
//! - the single writer actor every write goes through
//! - repositories for entities, resolution keys, the payload ledger, the
//!   canonical store and run reports
//!
//! ```text
//!   core (domain, orchestrator)
//!              │ traits
//!              ▼
//!   storage-sqlite (this crate)
//!              │
//!              ▼
//!          SQLite DB
//! ```

pub mod db;
pub mod errors;
pub mod schema;
mod utils;

pub mod canonical;
pub mod contracts;
pub mod entities;
pub mod ledger;
pub mod sync_runs;

#[cfg(test)]
mod test_support;

pub use db::{
    create_pool, get_connection, get_db_path, init, run_migrations, spawn_writer, DbConnection,
    DbPool, WriteHandle,
};
pub use errors::{IntoCore, StorageError};

pub use canonical::CanonicalStoreRepository;
pub use contracts::ResolutionKeyRepository;
pub use entities::EntityRepository;
pub use ledger::PayloadLedgerRepository;
pub use sync_runs::SyncRunRepository;

pub use cashsync_core::errors::{DatabaseError, Error, Result};
