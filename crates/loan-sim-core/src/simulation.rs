//! Loan simulation records.
//!
//! A [`Simulation`] bundles the validated loan terms with the generated
//! schedule and its totals. It is the value threaded through prepayment
//! recalculation and persisted by the history store.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::LoanSimError;
use crate::rates::{annual_to_monthly, monthly_to_annual};
use crate::schedule::generate_schedule;
use crate::totals::{aggregate, boundary_payments};
use crate::types::{
    with_metadata, AmortizationMethod, ComputationOutput, Installment, Money, Rate,
    ScheduleTotals,
};
use crate::LoanSimResult;

// ---------------------------------------------------------------------------
// Input types
// ---------------------------------------------------------------------------

/// Loan terms as entered by the user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationInput {
    /// Repayment system (ignored by method comparison)
    #[serde(default)]
    pub method: AmortizationMethod,
    /// Requested amount before the down payment
    pub financing_amount: Money,
    #[serde(default)]
    pub down_payment: Money,
    pub term_months: u32,
    /// Effective monthly rate (0.01 = 1%). Exclusive with `annual_rate`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_rate: Option<Rate>,
    /// Effective annual rate, converted to monthly by compounding.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annual_rate: Option<Rate>,
    pub first_due_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bank: Option<String>,
}

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// One computed amortization record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Simulation {
    pub method: AmortizationMethod,
    pub financing_amount: Money,
    pub down_payment: Money,
    /// Financed amount: `financing_amount - down_payment`
    pub principal: Money,
    /// Always equal to `schedule.len()`
    pub term_months: u32,
    pub monthly_rate: Rate,
    pub annual_rate: Rate,
    pub first_due_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bank: Option<String>,
    pub schedule: Vec<Installment>,
    pub totals: ScheduleTotals,
    pub first_payment: Money,
    pub last_payment: Money,
}

impl Simulation {
    /// Re-derive totals, boundary payments and term from the current schedule.
    pub fn recompute_summary(&mut self) {
        self.totals = aggregate(&self.schedule);
        let (first, last) = boundary_payments(&self.schedule);
        self.first_payment = first;
        self.last_payment = last;
        self.term_months = self.schedule.len() as u32;
    }

    /// Outstanding principal immediately before the installment at `index`.
    pub fn opening_balance(&self, index: usize) -> Money {
        match index {
            0 => self.principal,
            i => self
                .schedule
                .get(i - 1)
                .map_or(Decimal::ZERO, |prev| prev.balance),
        }
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Validate the loan terms, generate the schedule and wrap it with totals.
pub fn simulate(input: &SimulationInput) -> LoanSimResult<ComputationOutput<Simulation>> {
    let start = Instant::now();

    let (simulation, warnings) = build_simulation(input, input.method)?;
    let methodology = match simulation.method {
        AmortizationMethod::Price => "PRICE amortization (constant installment)",
        AmortizationMethod::Sac => "SAC amortization (constant amortization)",
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(methodology, input, warnings, elapsed, simulation))
}

/// Build a simulation for `method`, returning it with any warnings.
pub(crate) fn build_simulation(
    input: &SimulationInput,
    method: AmortizationMethod,
) -> LoanSimResult<(Simulation, Vec<String>)> {
    let mut warnings: Vec<String> = Vec::new();
    validate_input(input)?;

    let (monthly_rate, annual_rate) = resolve_rates(input)?;
    let principal = input.financing_amount - input.down_payment;

    if monthly_rate.is_zero() && method == AmortizationMethod::Price {
        warnings.push(
            "Zero interest rate: PRICE installment degenerates to principal / term".to_string(),
        );
    } else if monthly_rate < Decimal::ZERO {
        warnings.push(format!(
            "Negative monthly rate {monthly_rate}: interest column will be negative"
        ));
    }

    let schedule = generate_schedule(
        method,
        principal,
        input.term_months,
        monthly_rate,
        input.first_due_date,
    )?;

    let mut simulation = Simulation {
        method,
        financing_amount: input.financing_amount,
        down_payment: input.down_payment,
        principal,
        term_months: input.term_months,
        monthly_rate,
        annual_rate,
        first_due_date: input.first_due_date,
        operation_date: input.operation_date,
        bank: input.bank.clone().filter(|b| !b.trim().is_empty()),
        schedule,
        totals: ScheduleTotals::default(),
        first_payment: Decimal::ZERO,
        last_payment: Decimal::ZERO,
    };
    simulation.recompute_summary();

    tracing::debug!(
        method = %method,
        principal = %principal,
        term_months = input.term_months,
        monthly_rate = %monthly_rate,
        total_interest = %simulation.totals.total_interest,
        "simulation built"
    );

    Ok((simulation, warnings))
}

fn validate_input(input: &SimulationInput) -> LoanSimResult<()> {
    if input.financing_amount <= Decimal::ZERO {
        return Err(LoanSimError::invalid(
            "financing_amount",
            "Financing amount must be positive",
        ));
    }
    if input.down_payment < Decimal::ZERO {
        return Err(LoanSimError::invalid(
            "down_payment",
            "Down payment cannot be negative",
        ));
    }
    if input.down_payment >= input.financing_amount {
        return Err(LoanSimError::invalid(
            "down_payment",
            "Down payment must be smaller than the financing amount",
        ));
    }
    if input.term_months == 0 {
        return Err(LoanSimError::invalid(
            "term_months",
            "Term must be at least one month",
        ));
    }
    if let Some(operation_date) = input.operation_date {
        if input.first_due_date < operation_date {
            return Err(LoanSimError::invalid(
                "first_due_date",
                "First due date cannot precede the operation date",
            ));
        }
    }
    Ok(())
}

fn resolve_rates(input: &SimulationInput) -> LoanSimResult<(Rate, Rate)> {
    match (input.monthly_rate, input.annual_rate) {
        (Some(monthly), None) => Ok((monthly, monthly_to_annual(monthly)?)),
        (None, Some(annual)) => Ok((annual_to_monthly(annual)?, annual)),
        (Some(_), Some(_)) => Err(LoanSimError::invalid(
            "monthly_rate",
            "Provide either monthly_rate or annual_rate, not both",
        )),
        (None, None) => Err(LoanSimError::invalid(
            "monthly_rate",
            "A monthly_rate or annual_rate is required",
        )),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
