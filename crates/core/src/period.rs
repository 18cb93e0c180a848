//! Reference periods (calendar months) and bounded period ranges.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::{Error, ValidationError};

/// A calendar month used as the reporting unit, rendered as `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RefPeriod {
    year: i32,
    month: u32,
}

impl RefPeriod {
    pub fn new(year: i32, month: u32) -> Result<Self, Error> {
        if !(1..=12).contains(&month) {
            return Err(Error::Validation(ValidationError::InvalidInput(format!(
                "month out of range: {}",
                month
            ))));
        }
        Ok(Self { year, month })
    }

    /// The period containing `date`.
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    /// Last calendar day, which is the reference date for aging and valuation.
    pub fn last_day(&self) -> NaiveDate {
        self.succ()
            .first_day()
            .pred_opt()
            .unwrap_or(NaiveDate::MAX)
    }

    pub fn succ(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    pub fn pred(&self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        Self::of(date) == *self
    }

    fn ordinal(&self) -> i64 {
        self.year as i64 * 12 + (self.month as i64 - 1)
    }
}

impl fmt::Display for RefPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for RefPeriod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || {
            Error::Validation(ValidationError::InvalidInput(format!(
                "invalid reference period '{}', expected YYYY-MM",
                s
            )))
        };
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        Self::new(year, month).map_err(|_| invalid())
    }
}

impl TryFrom<String> for RefPeriod {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RefPeriod> for String {
    fn from(period: RefPeriod) -> Self {
        period.to_string()
    }
}

/// Inclusive range of periods used by backfills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodRange {
    pub start: RefPeriod,
    pub end: RefPeriod,
}

impl PeriodRange {
    pub fn new(start: RefPeriod, end: RefPeriod) -> Result<Self, Error> {
        if end < start {
            return Err(Error::Validation(ValidationError::InvalidInput(format!(
                "period range end {} is before start {}",
                end, start
            ))));
        }
        Ok(Self { start, end })
    }

    /// Number of periods in the range (both ends included).
    pub fn len(&self) -> usize {
        (self.end.ordinal() - self.start.ordinal() + 1) as usize
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// Periods in ascending order.
    pub fn periods(&self) -> Vec<RefPeriod> {
        let mut out = Vec::with_capacity(self.len());
        let mut current = self.start;
        while current <= self.end {
            out.push(current);
            current = current.succ();
        }
        out
    }
}
