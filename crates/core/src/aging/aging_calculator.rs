use chrono::NaiveDate;
use log::debug;

use super::aging_model::{AgingBucket, AgingReport};
use crate::canonical::Installment;
use crate::period::RefPeriod;

/// Days past due of an installment as seen at the end of `period`.
///
/// Unpaid installments due on or before the reference date age until that
/// date. Installments settled within `period` after their due date age until
/// settlement. Anything else has no delinquency for the period.
pub fn overdue_days(installment: &Installment, period: RefPeriod) -> Option<i64> {
    let reference: NaiveDate = period.last_day();
    match installment.settlement_date {
        None if installment.due_date <= reference => {
            Some((reference - installment.due_date).num_days())
        }
        Some(settled) if period.contains(settled) && settled > installment.due_date => {
            Some((settled - installment.due_date).num_days())
        }
        _ => None,
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AgingCalculator {
    grace_days: i64,
}

impl AgingCalculator {
    pub fn new(grace_days: i64) -> Self {
        Self {
            grace_days: grace_days.max(0),
        }
    }

    pub fn grace_days(&self) -> i64 {
        self.grace_days
    }

    /// Buckets the canonical-origin installments of one entity.
    pub fn calculate(&self, installments: &[Installment], period: RefPeriod) -> AgingReport {
        let mut report = AgingReport::default();
        for installment in installments.iter().filter(|i| i.origin.is_canonical()) {
            let Some(days) = overdue_days(installment, period) else {
                continue;
            };
            if let Some(bucket) = AgingBucket::for_days(days, self.grace_days) {
                report.add(bucket, installment.amount);
            }
        }
        debug!(
            "Aging for {}: {} overdue installments totalling {}",
            period, report.total.count, report.total.amount
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canonical::InstallmentOrigin;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn installment(id: &str, due: &str, settled: Option<&str>, amount: Decimal) -> Installment {
        Installment {
            id: id.to_string(),
            entity_id: "ENT-1".to_string(),
            contract_code: "C-1".to_string(),
            origin: InstallmentOrigin::CanonicalContract,
            due_date: date(due),
            amount,
            settlement_date: settled.map(date),
            paid_amount: None,
            present_value: None,
        }
    }

    fn january() -> RefPeriod {
        "2025-01".parse().unwrap()
    }

    #[test]
    fn test_overdue_by_exactly_grace_is_excluded() {
        // Reference date 2025-01-31.
        let inst = installment("I-1", "2025-01-28", None, dec!(100));
        assert_eq!(overdue_days(&inst, january()), Some(3));
        let report = AgingCalculator::new(3).calculate(&[inst], january());
        assert_eq!(report.total.count, 0);
    }

    #[test]
    fn test_overdue_by_grace_plus_one_is_first_bucket() {
        let inst = installment("I-1", "2025-01-27", None, dec!(100));
        let report = AgingCalculator::new(3).calculate(&[inst], january());
        assert_eq!(report.get(AgingBucket::UpTo30).count, 1);
        assert_eq!(report.get(AgingBucket::UpTo30).amount, dec!(100));
    }

    #[test]
    fn test_late_payment_ages_until_settlement() {
        let inst = installment("I-1", "2024-11-15", Some("2025-01-20"), dec!(250));
        assert_eq!(overdue_days(&inst, january()), Some(66));
        let report = AgingCalculator::new(3).calculate(&[inst], january());
        assert_eq!(report.get(AgingBucket::Days61To90).amount, dec!(250));
    }

    #[test]
    fn test_not_yet_due_and_paid_on_time_are_ignored() {
        let installments = vec![
            installment("I-1", "2025-02-10", None, dec!(100)),
            installment("I-2", "2025-01-10", Some("2025-01-10"), dec!(100)),
            installment("I-3", "2024-10-10", Some("2024-12-10"), dec!(100)),
        ];
        let report = AgingCalculator::new(3).calculate(&installments, january());
        assert_eq!(report.total.count, 0);
        assert_eq!(report.buckets.len(), 5);
    }

    #[test]
    fn test_total_equals_bucket_sum() {
        let installments = vec![
            installment("I-1", "2025-01-01", None, dec!(100)),
            installment("I-2", "2024-12-01", None, dec!(200)),
            installment("I-3", "2024-06-01", None, dec!(300)),
            installment("I-4", "2023-01-01", None, dec!(400)),
        ];
        let report = AgingCalculator::new(3).calculate(&installments, january());
        let sum: Decimal = report.buckets.values().map(|b| b.amount).sum();
        assert_eq!(sum, report.total.amount);
        assert_eq!(report.total.amount, dec!(1000));
        assert_eq!(report.get(AgingBucket::Over180).count, 2);
    }

    #[test]
    fn test_renegotiation_placeholders_are_not_aged() {
        let mut inst = installment("I-1", "2024-12-01", None, dec!(100));
        inst.origin = InstallmentOrigin::Renegotiation;
        let report = AgingCalculator::new(3).calculate(&[inst], january());
        assert_eq!(report.total.count, 0);
    }
}
