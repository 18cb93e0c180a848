//! Cashsync Core - canonical cash-flow model, business rules and sync orchestration.
//!
//! This crate is storage- and transport-agnostic. It defines the traits that
//! the `cashsync-erp` crate (upstream sources) and the `cashsync-storage-sqlite`
//! crate (persistence) implement.

pub mod aging;
pub mod canonical;
pub mod cashflow;
pub mod config;
pub mod constants;
pub mod contracts;
pub mod entities;
pub mod errors;
pub mod ledger;
pub mod period;
pub mod sources;
pub mod sync;
pub mod valuation;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
