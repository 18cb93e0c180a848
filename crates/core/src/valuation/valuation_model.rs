use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::period::RefPeriod;

/// Day-count convention used to turn a date span into a year fraction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayCount {
    #[default]
    Actual365,
    Actual360,
    /// 30/360 US (bond basis).
    Thirty360,
}

impl DayCount {
    /// Days between `start` and `end` under this convention.
    pub fn days_between(&self, start: NaiveDate, end: NaiveDate) -> i64 {
        match self {
            Self::Actual365 | Self::Actual360 => (end - start).num_days(),
            Self::Thirty360 => {
                let d1 = start.day().min(30) as i64;
                let d2 = if d1 == 30 {
                    end.day().min(30) as i64
                } else {
                    end.day() as i64
                };
                360 * (end.year() - start.year()) as i64
                    + 30 * (end.month() as i64 - start.month() as i64)
                    + (d2 - d1)
            }
        }
    }

    pub fn days_per_year(&self) -> Decimal {
        match self {
            Self::Actual365 => Decimal::from(365),
            Self::Actual360 | Self::Thirty360 => Decimal::from(360),
        }
    }

    pub fn year_fraction(&self, start: NaiveDate, end: NaiveDate) -> Decimal {
        Decimal::from(self.days_between(start, end)) / self.days_per_year()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ValuationSettings {
    /// Annual effective discount rate (0.12 = 12% a year). Required whenever
    /// an installment has no upstream present value.
    pub discount_rate: Option<Decimal>,
    pub day_count: DayCount,
    /// Whether installments whose contract is missing from the index are valued.
    pub unknown_contract_active: bool,
}

impl Default for ValuationSettings {
    fn default() -> Self {
        Self {
            discount_rate: None,
            day_count: DayCount::default(),
            unknown_contract_active: true,
        }
    }
}

/// Persisted row. Natural key: (entity_id, ref_period).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioStats {
    pub entity_id: String,
    pub ref_period: RefPeriod,
    pub present_value: Decimal,
    /// Nominal-weighted mean days to due date.
    pub weighted_avg_term: Decimal,
    /// PV-weighted mean time to cash flow, in years.
    pub duration: Decimal,
    /// Installments that passed the valuation filter.
    pub active_count: i64,
    /// Installments received for the entity.
    pub total_count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_thirty_360_month_ends() {
        let dc = DayCount::Thirty360;
        assert_eq!(dc.days_between(date("2025-01-31"), date("2025-02-28")), 28);
        assert_eq!(dc.days_between(date("2025-01-31"), date("2025-03-31")), 60);
        assert_eq!(dc.days_between(date("2025-01-15"), date("2026-01-15")), 360);
    }

    #[test]
    fn test_actual_conventions() {
        let start = date("2025-01-31");
        let end = date("2026-01-31");
        assert_eq!(DayCount::Actual365.year_fraction(start, end), Decimal::ONE);
        assert_eq!(DayCount::Actual360.days_between(start, end), 365);
    }
}
