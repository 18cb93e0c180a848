//! Sync orchestration: per-period snapshots, per-entity pipelines and run reports.

mod cancellation;
mod orchestrator;
mod snapshot;
mod sync_model;
mod sync_traits;

#[cfg(test)]
mod orchestrator_tests;

pub use cancellation::CancellationFlag;
pub use orchestrator::{SyncDependencies, SyncOrchestrator};
pub use snapshot::{PayablesJoin, PeriodSnapshot};
pub use sync_model::{
    CanonicalBundle, Counters, DownstreamSignal, EntityFailure, PersistSummary, RunMode,
    RunReport, RunStatus,
};
pub use sync_traits::{CanonicalStoreTrait, SyncRunRepositoryTrait};
