//! Contracts module - the resolution index joining transactional records to entities.
//!
//! Some upstream transactional endpoints (payables) expose only an opaque
//! counterparty code. The index maps contract codes to entities and is used as
//! an indirect join, gated by a runtime coverage check.

mod contracts_model;
mod contracts_service;
mod contracts_traits;
mod resolution_index;

pub use contracts_model::{ContractStatus, ResolutionKey};
pub use contracts_service::{ContractIndexService, RefreshSummary};
pub use contracts_traits::ResolutionKeyRepositoryTrait;
pub use resolution_index::{
    ContractResolutionIndex, EntityActivityRules, IndexEntry, JoinCoverage, ResolvedPayables,
};
