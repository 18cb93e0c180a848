//! Immutable per-period inputs shared by every entity pipeline of a run.

use log::{info, warn};
use std::sync::Arc;

use crate::canonical::Payable;
use crate::config::JoinStrategy;
use crate::contracts::{ContractResolutionIndex, JoinCoverage, ResolvedPayables};
use crate::errors::{Error, Result};
use crate::ledger::{content_hash, LedgerOutcome};
use crate::period::RefPeriod;
use crate::sources::Fetched;

/// Result of attributing the period's payables to entities.
#[derive(Debug, Clone)]
pub enum PayablesJoin {
    Resolved(ResolvedPayables),
    /// Join disabled by configuration; no cash-out is produced.
    Disabled,
    /// Coverage below the threshold. Every entity's resolution step fails.
    CoverageFailed { coverage: JoinCoverage, threshold: f64 },
}

#[derive(Debug, Clone)]
pub struct PeriodSnapshot {
    pub period: RefPeriod,
    pub index: Arc<ContractResolutionIndex>,
    pub payables: Arc<PayablesJoin>,
    /// Ledger outcome of the period's payables fetch.
    pub payables_ledger: LedgerOutcome,
    /// Hash over the payables payload and `context_digest` (index and settings).
    pub input_digest: String,
    /// Payables that will not reach any entity (rejected, unmatched or join disabled).
    pub skipped_payables: usize,
}

impl PeriodSnapshot {
    pub fn build(
        period: RefPeriod,
        index: ContractResolutionIndex,
        payables: Fetched<Payable>,
        strategy: JoinStrategy,
        min_coverage: f64,
        context_digest: &str,
    ) -> Result<Self> {
        let rejected = payables.rejected.len();
        let total = payables.records.len();

        let (join, unattributed) = match strategy {
            JoinStrategy::Disabled => {
                info!(
                    "Payables join disabled; {} payables for {} are skipped",
                    total, period
                );
                (PayablesJoin::Disabled, total)
            }
            JoinStrategy::CounterpartyCode => {
                match index.resolve_payables(&payables.records, min_coverage) {
                    Ok(resolved) => {
                        let unmatched = resolved.unmatched;
                        (PayablesJoin::Resolved(resolved), unmatched)
                    }
                    Err(Error::JoinCoverage {
                        matched,
                        total,
                        coverage,
                        threshold,
                    }) => {
                        warn!(
                            "Payables join for {} failed: {}/{} matched ({:.4} < {})",
                            period, matched, total, coverage, threshold
                        );
                        (
                            PayablesJoin::CoverageFailed {
                                coverage: JoinCoverage { matched, total },
                                threshold,
                            },
                            total,
                        )
                    }
                    Err(e) => return Err(e),
                }
            }
        };

        let input_digest =
            content_hash(format!("{}|{}", payables.content_hash, context_digest).as_bytes());

        Ok(Self {
            period,
            index: Arc::new(index),
            payables: Arc::new(join),
            payables_ledger: payables.ledger,
            input_digest,
            skipped_payables: rejected + unattributed,
        })
    }

    /// Payables attributed to `entity_id`.
    pub fn payables_for(&self, entity_id: &str) -> Result<&[Payable]> {
        match self.payables.as_ref() {
            PayablesJoin::Resolved(resolved) => Ok(resolved.for_entity(entity_id)),
            PayablesJoin::Disabled => Ok(&[]),
            PayablesJoin::CoverageFailed {
                coverage,
                threshold,
            } => coverage.ensure_at_least(*threshold).map(|_| &[][..]),
        }
    }
}
