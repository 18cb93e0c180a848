//! Aging & delinquency: overdue installments bucketed by days past due.

mod aging_calculator;
mod aging_model;

pub use aging_calculator::{overdue_days, AgingCalculator};
pub use aging_model::{AgingBucket, AgingReport, BucketTotals, DelinquencyBucket};
