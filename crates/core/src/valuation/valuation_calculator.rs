use log::debug;
use rust_decimal::{Decimal, MathematicalOps};

use super::valuation_model::{PortfolioStats, ValuationSettings};
use crate::canonical::Installment;
use crate::constants::VALUATION_SCALE;
use crate::contracts::ContractResolutionIndex;
use crate::errors::{Error, Result};
use crate::period::RefPeriod;

/// Valuation filter: canonical origin, unpaid, contract active.
pub fn is_valued(
    installment: &Installment,
    index: &ContractResolutionIndex,
    settings: &ValuationSettings,
) -> bool {
    if !installment.origin.is_canonical() || installment.is_settled() {
        return false;
    }
    match index.contract_status(&installment.contract_code) {
        Some(status) => status.is_active(),
        None => settings.unknown_contract_active,
    }
}

/// `amount / (1 + rate)^years`.
pub fn discount(amount: Decimal, rate: Decimal, years: Decimal) -> Result<Decimal> {
    let base = Decimal::ONE + rate;
    if base <= Decimal::ZERO {
        return Err(Error::Valuation(format!(
            "discount rate {} is not greater than -100%",
            rate
        )));
    }
    if years.is_zero() {
        return Ok(amount);
    }
    let factor = base
        .checked_powd(years)
        .filter(|f| !f.is_zero())
        .ok_or_else(|| {
            Error::Valuation(format!(
                "discount factor overflow for rate {} over {} years",
                rate, years
            ))
        })?;
    Ok(amount / factor)
}

/// Present value, weighted average term and duration of one entity's book.
///
/// The reference date is the last day of `period`. Installments already past
/// due are valued with a time of zero.
pub fn calculate_portfolio_stats(
    entity_id: &str,
    period: RefPeriod,
    installments: &[Installment],
    index: &ContractResolutionIndex,
    settings: &ValuationSettings,
) -> Result<PortfolioStats> {
    let reference = period.last_day();

    let mut present_value = Decimal::ZERO;
    let mut nominal = Decimal::ZERO;
    let mut weighted_days = Decimal::ZERO;
    let mut weighted_years = Decimal::ZERO;
    let mut active_count = 0i64;

    for installment in installments
        .iter()
        .filter(|i| is_valued(i, index, settings))
    {
        let days = settings
            .day_count
            .days_between(reference, installment.due_date)
            .max(0);
        let years = if days == 0 {
            Decimal::ZERO
        } else {
            settings
                .day_count
                .year_fraction(reference, installment.due_date)
        };

        let pv = match &installment.present_value {
            Some(breakdown) => breakdown.total(),
            None => {
                let rate = settings.discount_rate.ok_or_else(|| {
                    Error::Valuation(format!(
                        "installment {} of {} has no upstream present value and no discount rate is configured",
                        installment.id, entity_id
                    ))
                })?;
                discount(installment.amount, rate, years)?
            }
        };

        present_value += pv;
        nominal += installment.amount;
        weighted_days += installment.amount * Decimal::from(days);
        weighted_years += pv * years;
        active_count += 1;
    }

    let weighted_avg_term = if nominal.is_zero() {
        Decimal::ZERO
    } else {
        weighted_days / nominal
    };
    let duration = if present_value.is_zero() {
        Decimal::ZERO
    } else {
        weighted_years / present_value
    };

    debug!(
        "Valuation {} {}: {} of {} installments, PV {}",
        entity_id,
        period,
        active_count,
        installments.len(),
        present_value.round_dp(2)
    );

    Ok(PortfolioStats {
        entity_id: entity_id.to_string(),
        ref_period: period,
        present_value: present_value.round_dp(VALUATION_SCALE),
        weighted_avg_term: weighted_avg_term.round_dp(VALUATION_SCALE),
        duration: duration.round_dp(VALUATION_SCALE),
        active_count,
        total_count: installments.len() as i64,
    })
}
