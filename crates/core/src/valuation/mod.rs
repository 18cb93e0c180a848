//! Portfolio valuation over active unpaid installments.

mod valuation_calculator;
mod valuation_model;

pub use valuation_calculator::{calculate_portfolio_stats, discount, is_valued};
pub use valuation_model::{DayCount, PortfolioStats, ValuationSettings};
