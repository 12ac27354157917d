//! Side-by-side PRICE vs SAC comparison for the same loan terms.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::simulation::{build_simulation, Simulation, SimulationInput};
use crate::types::{with_metadata, AmortizationMethod, ComputationOutput, Money};
use crate::LoanSimResult;

/// Headline figures for one method.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodSummary {
    pub method: AmortizationMethod,
    pub first_payment: Money,
    pub last_payment: Money,
    pub highest_payment: Money,
    pub total_payment: Money,
    pub total_interest: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodComparison {
    pub price: MethodSummary,
    pub sac: MethodSummary,
    /// PRICE minus SAC
    pub total_interest_difference: Money,
    pub first_payment_difference: Money,
    pub last_payment_difference: Money,
    /// Method with the lower total interest (PRICE on a tie)
    pub cheaper_method: AmortizationMethod,
    /// Full schedules, in case the caller wants to render both
    pub price_simulation: Simulation,
    pub sac_simulation: Simulation,
}

/// Run the same loan terms under both methods. `input.method` is ignored.
pub fn compare_methods(
    input: &SimulationInput,
) -> LoanSimResult<ComputationOutput<MethodComparison>> {
    let start = Instant::now();

    let (price_simulation, mut warnings) = build_simulation(input, AmortizationMethod::Price)?;
    let (sac_simulation, sac_warnings) = build_simulation(input, AmortizationMethod::Sac)?;
    for w in sac_warnings {
        if !warnings.contains(&w) {
            warnings.push(w);
        }
    }

    let price = summarize(&price_simulation);
    let sac = summarize(&sac_simulation);

    let cheaper_method = if sac.total_interest < price.total_interest {
        AmortizationMethod::Sac
    } else {
        AmortizationMethod::Price
    };

    let comparison = MethodComparison {
        total_interest_difference: price.total_interest - sac.total_interest,
        first_payment_difference: price.first_payment - sac.first_payment,
        last_payment_difference: price.last_payment - sac.last_payment,
        cheaper_method,
        price,
        sac,
        price_simulation,
        sac_simulation,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "PRICE vs SAC amortization comparison",
        input,
        warnings,
        elapsed,
        comparison,
    ))
}

fn summarize(simulation: &Simulation) -> MethodSummary {
    let highest_payment = simulation
        .schedule
        .iter()
        .map(|i| i.payment)
        .max()
        .unwrap_or(Decimal::ZERO);

    MethodSummary {
        method: simulation.method,
        first_payment: simulation.first_payment,
        last_payment: simulation.last_payment,
        highest_payment,
        total_payment: simulation.totals.total_payment,
        total_interest: simulation.totals.total_interest,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn input(rate: Decimal) -> SimulationInput {
        SimulationInput {
            method: AmortizationMethod::Sac,
            financing_amount: dec!(360000),
            down_payment: dec!(60000),
            term_months: 360,
            monthly_rate: Some(rate),
            annual_rate: None,
            first_due_date: NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            operation_date: None,
            bank: None,
        }
    }

    #[test]
    fn test_sac_cheaper_at_positive_rate() {
        let out = compare_methods(&input(dec!(0.008))).unwrap();
        let c = &out.result;
        assert_eq!(c.cheaper_method, AmortizationMethod::Sac);
        assert!(c.total_interest_difference > Decimal::ZERO);
        // SAC starts higher and ends lower than the level PRICE installment.
        assert!(c.first_payment_difference < Decimal::ZERO);
        assert!(c.last_payment_difference > Decimal::ZERO);
        assert_eq!(c.sac.highest_payment, c.sac.first_payment);
        assert_eq!(c.price_simulation.method, AmortizationMethod::Price);
    }

    #[test]
    fn test_zero_rate_methods_coincide() {
        let out = compare_methods(&input(Decimal::ZERO)).unwrap();
        let c = &out.result;
        assert_eq!(c.total_interest_difference, Decimal::ZERO);
        assert_eq!(c.cheaper_method, AmortizationMethod::Price);
        assert_eq!(out.warnings.len(), 1);
    }
}
