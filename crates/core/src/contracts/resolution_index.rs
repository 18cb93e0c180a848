//! In-memory resolution index and join coverage gate.

use log::{debug, warn};
use regex::Regex;
use std::collections::HashMap;

use super::contracts_model::{ContractStatus, ResolutionKey};
use crate::canonical::Payable;
use crate::errors::{Error, Result};

/// Resolved target of a contract code.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexEntry {
    pub entity_id: String,
    pub status: ContractStatus,
}

/// How many transactional records matched a known key.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct JoinCoverage {
    pub matched: usize,
    pub total: usize,
}

impl JoinCoverage {
    /// `None` when there were no records to join.
    pub fn ratio(&self) -> Option<f64> {
        if self.total == 0 {
            None
        } else {
            Some(self.matched as f64 / self.total as f64)
        }
    }

    /// Fails with [`Error::JoinCoverage`] when coverage is below `threshold`.
    ///
    /// An empty record set has nothing to join and passes.
    pub fn ensure_at_least(&self, threshold: f64) -> Result<()> {
        match self.ratio() {
            Some(coverage) if coverage < threshold => Err(Error::JoinCoverage {
                matched: self.matched,
                total: self.total,
                coverage,
                threshold,
            }),
            _ => Ok(()),
        }
    }
}

/// Payables grouped by resolved entity.
#[derive(Debug, Clone, Default)]
pub struct ResolvedPayables {
    by_entity: HashMap<String, Vec<Payable>>,
    pub unmatched: usize,
    pub coverage: JoinCoverage,
}

impl ResolvedPayables {
    pub fn for_entity(&self, entity_id: &str) -> &[Payable] {
        self.by_entity
            .get(entity_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn entity_count(&self) -> usize {
        self.by_entity.len()
    }
}

/// Lookup from contract code to entity, built from the authoritative contracts endpoint.
#[derive(Debug, Clone, Default)]
pub struct ContractResolutionIndex {
    entries: HashMap<String, IndexEntry>,
}

fn normalize_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

impl ContractResolutionIndex {
    pub fn from_keys<I>(keys: I) -> Self
    where
        I: IntoIterator<Item = ResolutionKey>,
    {
        let entries = keys
            .into_iter()
            .filter(|key| !key.code.trim().is_empty())
            .map(|key| {
                (
                    normalize_code(&key.code),
                    IndexEntry {
                        entity_id: key.entity_id,
                        status: key.status,
                    },
                )
            })
            .collect();
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn resolve(&self, code: &str) -> Option<&IndexEntry> {
        self.entries.get(&normalize_code(code))
    }

    pub fn contract_status(&self, code: &str) -> Option<&ContractStatus> {
        self.resolve(code).map(|entry| &entry.status)
    }

    /// True if at least one key of the entity is active.
    pub fn has_active_key(&self, entity_id: &str) -> bool {
        self.entries
            .values()
            .any(|entry| entry.entity_id == entity_id && entry.status.is_active())
    }

    /// Fraction of codes that match any known key. Absent codes count as unmatched.
    pub fn coverage<'a, I>(&self, codes: I) -> JoinCoverage
    where
        I: IntoIterator<Item = Option<&'a str>>,
    {
        let mut coverage = JoinCoverage::default();
        for code in codes {
            coverage.total += 1;
            if code.and_then(|c| self.resolve(c)).is_some() {
                coverage.matched += 1;
            }
        }
        coverage
    }

    /// Joins payables to entities through their counterparty code.
    ///
    /// Coverage is checked before any grouping so an unusable join fails
    /// explicitly instead of producing an empty result.
    pub fn resolve_payables(
        &self,
        payables: &[Payable],
        min_coverage: f64,
    ) -> Result<ResolvedPayables> {
        let coverage = self.coverage(payables.iter().map(|p| p.counterparty_code.as_deref()));
        coverage.ensure_at_least(min_coverage)?;

        let mut resolved = ResolvedPayables {
            coverage,
            ..Default::default()
        };
        for payable in payables {
            match payable
                .counterparty_code
                .as_deref()
                .and_then(|code| self.resolve(code))
            {
                Some(entry) => resolved
                    .by_entity
                    .entry(entry.entity_id.clone())
                    .or_default()
                    .push(payable.clone()),
                None => resolved.unmatched += 1,
            }
        }

        if let Some(ratio) = coverage.ratio() {
            debug!(
                "Payables join: {}/{} matched ({:.2}%), {} entities",
                coverage.matched,
                coverage.total,
                ratio * 100.0,
                resolved.by_entity.len()
            );
            if resolved.unmatched > 0 {
                warn!(
                    "{} payables have no known counterparty contract and are excluded",
                    resolved.unmatched
                );
            }
        }
        Ok(resolved)
    }
}

/// Rules deciding whether an entity is active.
#[derive(Debug, Clone)]
pub struct EntityActivityRules {
    exclusions: Vec<Regex>,
}

impl EntityActivityRules {
    pub fn new(patterns: &[String]) -> Result<Self> {
        let exclusions = patterns
            .iter()
            .map(|p| Regex::new(p))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self { exclusions })
    }

    pub fn is_excluded(&self, display_name: &str) -> bool {
        self.exclusions.iter().any(|re| re.is_match(display_name))
    }

    /// Active means at least one active key and no exclusion marker in the name.
    pub fn is_active(
        &self,
        entity_id: &str,
        display_name: &str,
        index: &ContractResolutionIndex,
    ) -> bool {
        index.has_active_key(entity_id) && !self.is_excluded(display_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use rust_decimal_macros::dec;

    fn key(code: &str, entity: &str, status: ContractStatus) -> ResolutionKey {
        ResolutionKey {
            code: code.to_string(),
            entity_id: entity.to_string(),
            status,
            refreshed_at: Utc::now().naive_utc(),
        }
    }

    fn payable(id: &str, code: Option<&str>) -> Payable {
        Payable {
            id: id.to_string(),
            counterparty_code: code.map(str::to_string),
            document_type: Some("NF".to_string()),
            due_date: NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
            amount: dec!(100),
            paid_date: None,
            paid_amount: None,
            description: None,
        }
    }

    fn index() -> ContractResolutionIndex {
        ContractResolutionIndex::from_keys(vec![
            key("C-001", "ENT-1", ContractStatus::Active),
            key("c-002 ", "ENT-1", ContractStatus::Settled),
            key("C-003", "ENT-2", ContractStatus::Cancelled),
        ])
    }

    #[test]
    fn test_resolve_normalizes_codes() {
        let index = index();
        assert_eq!(index.resolve(" c-001").unwrap().entity_id, "ENT-1");
        assert_eq!(index.resolve("C-002").unwrap().status, ContractStatus::Settled);
        assert!(index.resolve("C-999").is_none());
    }

    #[test]
    fn test_has_active_key() {
        let index = index();
        assert!(index.has_active_key("ENT-1"));
        assert!(!index.has_active_key("ENT-2"));
    }

    #[test]
    fn test_zero_overlap_raises_join_coverage_error() {
        let index = index();
        let payables: Vec<Payable> = (0..50)
            .map(|i| payable(&format!("P-{}", i), Some("SUPPLIER-42")))
            .collect();

        let err = index.resolve_payables(&payables, 0.01).unwrap_err();
        match err {
            Error::JoinCoverage { matched, total, .. } => {
                assert_eq!(matched, 0);
                assert_eq!(total, 50);
            }
            other => panic!("expected JoinCoverage, got {:?}", other),
        }
    }

    #[test]
    fn test_coverage_below_one_percent_fails() {
        let index = index();
        let mut payables: Vec<Payable> = (0..199)
            .map(|i| payable(&format!("P-{}", i), None))
            .collect();
        payables.push(payable("P-match", Some("C-001")));

        // 1 of 200 = 0.5%
        assert!(matches!(
            index.resolve_payables(&payables, 0.01),
            Err(Error::JoinCoverage { .. })
        ));
    }

    #[test]
    fn test_sufficient_coverage_groups_by_entity() {
        let index = index();
        let payables = vec![
            payable("P-1", Some("C-001")),
            payable("P-2", Some("C-002")),
            payable("P-3", Some("C-003")),
            payable("P-4", Some("UNKNOWN")),
        ];

        let resolved = index.resolve_payables(&payables, 0.01).unwrap();
        assert_eq!(resolved.for_entity("ENT-1").len(), 2);
        assert_eq!(resolved.for_entity("ENT-2").len(), 1);
        assert!(resolved.for_entity("ENT-3").is_empty());
        assert_eq!(resolved.unmatched, 1);
        assert_eq!(resolved.coverage.matched, 3);
    }

    #[test]
    fn test_empty_payables_is_not_an_error() {
        let resolved = index().resolve_payables(&[], 0.01).unwrap();
        assert_eq!(resolved.entity_count(), 0);
        assert_eq!(resolved.coverage.ratio(), None);
    }

    #[test]
    fn test_activity_rules_exclude_test_markers() {
        let rules =
            EntityActivityRules::new(&[r"(?i)\b(test|teste|demo)\b".to_string()]).unwrap();
        let index = index();
        assert!(rules.is_active("ENT-1", "Residencial Aurora", &index));
        assert!(!rules.is_active("ENT-1", "Empreendimento TESTE", &index));
        assert!(!rules.is_active("ENT-2", "Residencial Boreal", &index));
    }

    #[test]
    fn test_invalid_exclusion_pattern_is_config_error() {
        let result = EntityActivityRules::new(&["(unclosed".to_string()]);
        assert!(matches!(result, Err(Error::InvalidConfigValue(_))));
    }
}
