//! Cash-in classification and cash-out categorization.

use chrono::NaiveDate;
use log::{debug, warn};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap, HashSet};

use super::cashflow_model::{CashInCategory, CashInRecord, CashOutRecord, RecordType};
use crate::canonical::{Installment, Payable};
use crate::constants::UNCATEGORIZED;
use crate::period::RefPeriod;

/// Compares settlement and due months. `None` while unsettled.
pub fn classify_settlement(
    due_date: NaiveDate,
    settlement_date: Option<NaiveDate>,
) -> Option<CashInCategory> {
    let settled = RefPeriod::of(settlement_date?);
    let due = RefPeriod::of(due_date);
    Some(match settled.cmp(&due) {
        Ordering::Equal => CashInCategory::Current,
        Ordering::Greater => CashInCategory::Recovery,
        Ordering::Less => CashInCategory::Prepayment,
    })
}

/// Category of an installment's actual record. `None` while unsettled.
pub fn classify_installment(installment: &Installment) -> Option<CashInCategory> {
    if !installment.origin.is_canonical() {
        return installment.settlement_date.map(|_| CashInCategory::Other);
    }
    classify_settlement(installment.due_date, installment.settlement_date)
}

fn installment_detail(installment: &Installment) -> serde_json::Value {
    json!({
        "contractCode": installment.contract_code,
        "origin": installment.origin,
        "dueDate": installment.due_date,
        "settlementDate": installment.settlement_date,
        "nominalAmount": installment.amount,
    })
}

/// Forecast records for installments due in `period`, actual records for
/// installments settled in `period`.
pub fn build_cash_in_records(
    entity_id: &str,
    period: RefPeriod,
    installments: &[Installment],
) -> Vec<CashInRecord> {
    let mut seen = HashSet::new();
    let mut records = Vec::new();

    for installment in installments {
        if !seen.insert(installment.id.as_str()) {
            warn!(
                "Duplicate installment id '{}' for entity {}; keeping the first occurrence",
                installment.id, entity_id
            );
            continue;
        }

        if period.contains(installment.due_date) {
            let category = if installment.origin.is_canonical() {
                CashInCategory::Scheduled
            } else {
                CashInCategory::Other
            };
            records.push(CashInRecord {
                entity_id: entity_id.to_string(),
                ref_period: period,
                category,
                record_type: RecordType::Forecast,
                amount: installment.amount,
                origin_id: installment.id.clone(),
                detail: Some(installment_detail(installment)),
            });
        }

        let settled_in_period = installment
            .settlement_date
            .is_some_and(|date| period.contains(date));
        if settled_in_period {
            if let Some(category) = classify_installment(installment) {
                records.push(CashInRecord {
                    entity_id: entity_id.to_string(),
                    ref_period: period,
                    category,
                    record_type: RecordType::Actual,
                    amount: installment.collected_amount(),
                    origin_id: installment.id.clone(),
                    detail: Some(installment_detail(installment)),
                });
            }
        }
    }

    debug!(
        "Classified {} installments of {} into {} cash-in records for {}",
        installments.len(),
        entity_id,
        records.len(),
        period
    );
    records
}

/// Mapping from upstream document-type codes to cash-out categories.
#[derive(Debug, Clone, Default)]
pub struct CashOutCategoryMap {
    mappings: HashMap<String, String>,
}

impl CashOutCategoryMap {
    pub fn new(mappings: &HashMap<String, String>) -> Self {
        Self {
            mappings: mappings
                .iter()
                .map(|(code, category)| (code.trim().to_ascii_uppercase(), category.clone()))
                .collect(),
        }
    }

    /// Mapped category, or `uncategorized` for missing and unknown codes.
    pub fn categorize(&self, document_type: Option<&str>) -> String {
        document_type
            .and_then(|code| self.mappings.get(&code.trim().to_ascii_uppercase()))
            .cloned()
            .unwrap_or_else(|| UNCATEGORIZED.to_string())
    }
}

fn payable_detail(payable: &Payable) -> serde_json::Value {
    json!({
        "counterpartyCode": payable.counterparty_code,
        "documentType": payable.document_type,
        "dueDate": payable.due_date,
        "paidDate": payable.paid_date,
        "description": payable.description,
    })
}

/// Forecast records for payables due in `period`, actual records for
/// payables paid in `period`.
pub fn build_cash_out_records(
    entity_id: &str,
    period: RefPeriod,
    payables: &[Payable],
    categories: &CashOutCategoryMap,
) -> Vec<CashOutRecord> {
    let mut seen = HashSet::new();
    let mut records = Vec::new();

    for payable in payables {
        if !seen.insert(payable.id.as_str()) {
            warn!(
                "Duplicate payable id '{}' for entity {}; keeping the first occurrence",
                payable.id, entity_id
            );
            continue;
        }
        let category = categories.categorize(payable.document_type.as_deref());

        if period.contains(payable.due_date) {
            records.push(CashOutRecord {
                entity_id: entity_id.to_string(),
                ref_period: period,
                category: category.clone(),
                record_type: RecordType::Forecast,
                amount: payable.amount,
                origin_id: payable.id.clone(),
                detail: Some(payable_detail(payable)),
            });
        }
        if payable.paid_date.is_some_and(|date| period.contains(date)) {
            records.push(CashOutRecord {
                entity_id: entity_id.to_string(),
                ref_period: period,
                category,
                record_type: RecordType::Actual,
                amount: payable.paid_amount.unwrap_or(payable.amount),
                origin_id: payable.id.clone(),
                detail: Some(payable_detail(payable)),
            });
        }
    }
    records
}

/// Raised when too much cash-out volume falls into `uncategorized`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorizationAlert {
    pub entity_id: String,
    pub ref_period: RefPeriod,
    pub uncategorized_amount: Decimal,
    pub total_amount: Decimal,
    pub ratio: f64,
    pub threshold: f64,
    /// Document-type codes that had no mapping.
    pub unmapped_codes: Vec<String>,
}

/// Checks the uncategorized share of cash-out volume (by absolute amount).
pub fn uncategorized_alert(
    entity_id: &str,
    period: RefPeriod,
    records: &[CashOutRecord],
    payables: &[Payable],
    threshold: f64,
) -> Option<CategorizationAlert> {
    let total: Decimal = records.iter().map(|r| r.amount.abs()).sum();
    if total.is_zero() {
        return None;
    }
    let uncategorized: Decimal = records
        .iter()
        .filter(|r| r.category == UNCATEGORIZED)
        .map(|r| r.amount.abs())
        .sum();
    let ratio = (uncategorized / total).to_f64().unwrap_or(0.0);
    if ratio <= threshold {
        return None;
    }

    let uncategorized_ids: HashSet<&str> = records
        .iter()
        .filter(|r| r.category == UNCATEGORIZED)
        .map(|r| r.origin_id.as_str())
        .collect();
    let unmapped_codes: BTreeSet<String> = payables
        .iter()
        .filter(|p| uncategorized_ids.contains(p.id.as_str()))
        .map(|p| {
            p.document_type
                .clone()
                .unwrap_or_else(|| "<missing>".to_string())
        })
        .collect();

    warn!(
        "Entity {} {}: {:.1}% of cash-out volume is uncategorized (threshold {:.1}%), codes: {:?}",
        entity_id,
        period,
        ratio * 100.0,
        threshold * 100.0,
        unmapped_codes
    );
    Some(CategorizationAlert {
        entity_id: entity_id.to_string(),
        ref_period: period,
        uncategorized_amount: uncategorized,
        total_amount: total,
        ratio,
        threshold,
        unmapped_codes: unmapped_codes.into_iter().collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canonical::InstallmentOrigin;
    use rust_decimal_macros::dec;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn installment(id: &str, due: &str, settled: Option<&str>) -> Installment {
        Installment {
            id: id.to_string(),
            entity_id: "ENT-1".to_string(),
            contract_code: "C-1".to_string(),
            origin: InstallmentOrigin::CanonicalContract,
            due_date: date(due),
            amount: dec!(1000),
            settlement_date: settled.map(date),
            paid_amount: None,
            present_value: None,
        }
    }

    fn payable(id: &str, doc: Option<&str>, due: &str, paid: Option<&str>, amount: Decimal) -> Payable {
        Payable {
            id: id.to_string(),
            counterparty_code: Some("C-1".to_string()),
            document_type: doc.map(str::to_string),
            due_date: date(due),
            amount,
            paid_date: paid.map(date),
            paid_amount: None,
            description: None,
        }
    }

    #[test]
    fn test_settled_same_month_is_current() {
        let inst = installment("I-1", "2025-01-15", Some("2025-01-20"));
        assert_eq!(classify_installment(&inst), Some(CashInCategory::Current));
    }

    #[test]
    fn test_settled_later_month_is_recovery() {
        let inst = installment("I-1", "2025-01-15", Some("2025-03-10"));
        assert_eq!(classify_installment(&inst), Some(CashInCategory::Recovery));
    }

    #[test]
    fn test_settled_earlier_month_is_prepayment() {
        let inst = installment("I-1", "2025-02-15", Some("2025-01-28"));
        assert_eq!(classify_installment(&inst), Some(CashInCategory::Prepayment));
    }

    #[test]
    fn test_unsettled_has_no_category() {
        let inst = installment("I-1", "2025-02-15", None);
        assert_eq!(classify_installment(&inst), None);
    }

    #[test]
    fn test_non_canonical_origin_is_other() {
        let mut inst = installment("I-1", "2025-01-15", Some("2025-03-10"));
        inst.origin = InstallmentOrigin::Renegotiation;
        assert_eq!(classify_installment(&inst), Some(CashInCategory::Other));
    }

    #[test]
    fn test_cash_in_records_for_period() {
        let period: RefPeriod = "2025-01".parse().unwrap();
        let mut late = installment("I-3", "2024-11-10", Some("2025-01-05"));
        late.paid_amount = Some(dec!(1030));
        let installments = vec![
            installment("I-1", "2025-01-15", Some("2025-01-20")),
            installment("I-2", "2025-01-25", None),
            late,
            installment("I-4", "2025-03-10", None),
        ];

        let records = build_cash_in_records("ENT-1", period, &installments);

        let forecasts: Vec<_> = records
            .iter()
            .filter(|r| r.record_type == RecordType::Forecast)
            .collect();
        assert_eq!(forecasts.len(), 2);
        assert!(forecasts.iter().all(|r| r.category == CashInCategory::Scheduled));

        let actuals: Vec<_> = records
            .iter()
            .filter(|r| r.record_type == RecordType::Actual)
            .collect();
        assert_eq!(actuals.len(), 2);
        let recovery = actuals.iter().find(|r| r.origin_id == "I-3").unwrap();
        assert_eq!(recovery.category, CashInCategory::Recovery);
        assert_eq!(recovery.amount, dec!(1030));
    }

    #[test]
    fn test_duplicate_installments_are_dropped() {
        let period: RefPeriod = "2025-01".parse().unwrap();
        let installments = vec![
            installment("I-1", "2025-01-15", None),
            installment("I-1", "2025-01-15", None),
        ];
        assert_eq!(build_cash_in_records("ENT-1", period, &installments).len(), 1);
    }

    #[test]
    fn test_unmapped_codes_go_to_uncategorized() {
        let mut mappings = HashMap::new();
        mappings.insert("nf".to_string(), "suppliers".to_string());
        let map = CashOutCategoryMap::new(&mappings);

        assert_eq!(map.categorize(Some("NF")), "suppliers");
        assert_eq!(map.categorize(Some("RPA")), UNCATEGORIZED);
        assert_eq!(map.categorize(None), UNCATEGORIZED);
    }

    #[test]
    fn test_cash_out_records_and_alert() {
        let period: RefPeriod = "2025-01".parse().unwrap();
        let mut mappings = HashMap::new();
        mappings.insert("NF".to_string(), "suppliers".to_string());
        let map = CashOutCategoryMap::new(&mappings);

        let payables = vec![
            payable("P-1", Some("NF"), "2025-01-10", Some("2025-01-10"), dec!(800)),
            payable("P-2", Some("RPA"), "2025-01-20", None, dec!(200)),
            payable("P-3", Some("NF"), "2025-02-05", None, dec!(5000)),
        ];

        let records = build_cash_out_records("ENT-1", period, &payables, &map);
        assert_eq!(records.len(), 3);
        assert_eq!(
            records
                .iter()
                .filter(|r| r.category == UNCATEGORIZED)
                .count(),
            1
        );

        let alert = uncategorized_alert("ENT-1", period, &records, &payables, 0.10).unwrap();
        assert_eq!(alert.uncategorized_amount, dec!(200));
        assert_eq!(alert.total_amount, dec!(1800));
        assert_eq!(alert.unmapped_codes, vec!["RPA".to_string()]);

        assert!(uncategorized_alert("ENT-1", period, &records, &payables, 0.5).is_none());
    }

    #[test]
    fn test_no_alert_without_cash_out() {
        let period: RefPeriod = "2025-01".parse().unwrap();
        assert!(uncategorized_alert("ENT-1", period, &[], &[], 0.10).is_none());
    }
}
