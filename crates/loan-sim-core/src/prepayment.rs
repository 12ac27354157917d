//! Extra-payment (prepayment) recalculation of an existing simulation.
//!
//! An event lands on the first installment due on or after its effective
//! date and reduces that installment's opening balance. The tail of the
//! schedule is then rebuilt under one of two strategies:
//!
//! - **ReduceInstallment** keeps the remaining term and re-amortizes the
//!   reduced balance with the loan's own method (level payment for PRICE,
//!   equal amortization for SAC), so every later installment gets cheaper.
//! - **ReduceTerm** keeps each installment's original amortization and drops
//!   the installments left over once the balance is retired. A prepayment
//!   that retires the balance outright leaves one zero closing row.
//!
//! Processing is pure: the input simulation is cloned, never mutated.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::LoanSimError;
use crate::schedule::{
    level_payment, price_rows, sac_rows, settle_final_balance, BALANCE_TOLERANCE,
};
use crate::simulation::Simulation;
use crate::types::{with_metadata, AmortizationMethod, ComputationOutput, Installment, Money};
use crate::LoanSimResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// How the capacity freed by a prepayment is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrepaymentStrategy {
    /// Same end date, lower installments.
    ReduceInstallment,
    /// Same amortization per installment, earlier end date.
    ReduceTerm,
}

/// One instruction to apply extra principal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrepaymentEvent {
    pub effective_date: NaiveDate,
    /// Extra principal paid; must be positive
    pub amount: Money,
    pub strategy: PrepaymentStrategy,
}

/// What happened when an event was applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PrepaymentOutcome {
    Applied {
        installment_number: u32,
        applied_amount: Money,
    },
    /// Amount exceeded the outstanding balance; only the balance was applied.
    OverPayment {
        installment_number: u32,
        applied_amount: Money,
        excess: Money,
    },
    /// Schedule left untouched.
    NoEffect { reason: String },
}

/// Result of a single application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrepaymentApplication {
    pub simulation: Simulation,
    pub outcome: PrepaymentOutcome,
}

/// A stored or freshly built simulation plus the events to apply in order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrepaymentInput {
    pub simulation: Simulation,
    pub events: Vec<PrepaymentEvent>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrepaymentSummary {
    pub simulation: Simulation,
    /// One entry per input event, in application order
    pub outcomes: Vec<PrepaymentOutcome>,
    pub original_total_interest: Money,
    pub new_total_interest: Money,
    pub interest_saved: Money,
    pub original_term_months: u32,
    pub new_term_months: u32,
    pub installments_removed: u32,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Apply one prepayment event to a simulation.
pub fn apply_prepayment(
    simulation: &Simulation,
    event: &PrepaymentEvent,
) -> LoanSimResult<PrepaymentApplication> {
    validate_event(event)?;

    let Some(index) = simulation
        .schedule
        .iter()
        .position(|inst| inst.due_date >= event.effective_date)
    else {
        let reason = format!(
            "Effective date {} falls after the last installment",
            event.effective_date
        );
        tracing::warn!(effective_date = %event.effective_date, "prepayment has no effect");
        return Ok(PrepaymentApplication {
            simulation: simulation.clone(),
            outcome: PrepaymentOutcome::NoEffect { reason },
        });
    };

    let installment_number = simulation.schedule[index].number;
    let opening = simulation.opening_balance(index);
    let applied_amount = event.amount.min(opening.max(Decimal::ZERO));
    let excess = event.amount - applied_amount;
    let reduced = opening - applied_amount;

    let tail = match event.strategy {
        PrepaymentStrategy::ReduceInstallment => reamortize_tail(simulation, index, reduced)?,
        PrepaymentStrategy::ReduceTerm => shorten_tail(simulation, index, reduced),
    };

    let mut updated = simulation.clone();
    updated.schedule.truncate(index);
    updated.schedule.extend(tail);
    updated.recompute_summary();

    let outcome = if excess > Decimal::ZERO {
        tracing::warn!(
            installment = installment_number,
            applied = %applied_amount,
            excess = %excess,
            "prepayment exceeds outstanding balance; clamped"
        );
        PrepaymentOutcome::OverPayment {
            installment_number,
            applied_amount,
            excess,
        }
    } else {
        tracing::debug!(
            installment = installment_number,
            applied = %applied_amount,
            strategy = ?event.strategy,
            new_term = updated.term_months,
            "prepayment applied"
        );
        PrepaymentOutcome::Applied {
            installment_number,
            applied_amount,
        }
    };

    Ok(PrepaymentApplication {
        simulation: updated,
        outcome,
    })
}

/// Apply events one after another, each on the previous result.
///
/// Events are applied in the order given; sequencing them by date is the
/// caller's job.
pub fn apply_prepayments(
    simulation: &Simulation,
    events: &[PrepaymentEvent],
) -> LoanSimResult<(Simulation, Vec<PrepaymentOutcome>)> {
    let mut current = simulation.clone();
    let mut outcomes = Vec::with_capacity(events.len());

    for event in events {
        let application = apply_prepayment(&current, event)?;
        current = application.simulation;
        outcomes.push(application.outcome);
    }

    Ok((current, outcomes))
}

/// Apply all events and report the effect against the original schedule.
pub fn process_prepayments(
    input: &PrepaymentInput,
) -> LoanSimResult<ComputationOutput<PrepaymentSummary>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.events.is_empty() {
        return Err(LoanSimError::invalid(
            "events",
            "At least one prepayment event is required",
        ));
    }
    if input
        .events
        .windows(2)
        .any(|w| w[1].effective_date < w[0].effective_date)
    {
        warnings.push(
            "Events are not in ascending effective_date order; applied as given".to_string(),
        );
    }

    let original = &input.simulation;
    let (simulation, outcomes) = apply_prepayments(original, &input.events)?;

    for (i, (event, outcome)) in input.events.iter().zip(&outcomes).enumerate() {
        match outcome {
            PrepaymentOutcome::NoEffect { reason } => {
                warnings.push(format!("Event {} ({}): {}", i + 1, event.effective_date, reason));
            }
            PrepaymentOutcome::OverPayment { excess, .. } => {
                warnings.push(format!(
                    "Event {} ({}): amount exceeds outstanding balance by {}; clamped",
                    i + 1,
                    event.effective_date,
                    excess
                ));
            }
            PrepaymentOutcome::Applied { .. } => {}
        }
    }

    let summary = PrepaymentSummary {
        original_total_interest: original.totals.total_interest,
        new_total_interest: simulation.totals.total_interest,
        interest_saved: original.totals.total_interest - simulation.totals.total_interest,
        original_term_months: original.term_months,
        new_term_months: simulation.term_months,
        installments_removed: original.term_months.saturating_sub(simulation.term_months),
        outcomes,
        simulation,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Prepayment recalculation (principal reduction at installment boundary)",
        input,
        warnings,
        elapsed,
        summary,
    ))
}

// ---------------------------------------------------------------------------
// Tail rebuilders
// ---------------------------------------------------------------------------

/// Keep the remaining term; spread `reduced` over it with the loan's method.
fn reamortize_tail(
    simulation: &Simulation,
    index: usize,
    reduced: Money,
) -> LoanSimResult<Vec<Installment>> {
    let original_tail = &simulation.schedule[index..];
    let remaining = original_tail.len() as u32;
    let start_index = index as u32;
    let end_index = start_index + remaining;
    let rate = simulation.monthly_rate;

    let mut rows = match simulation.method {
        AmortizationMethod::Price => {
            let payment = level_payment(reduced, rate, remaining)?;
            price_rows(reduced, payment, rate, start_index, end_index, simulation.first_due_date)?
        }
        AmortizationMethod::Sac => {
            let amortization = reduced / Decimal::from(remaining);
            sac_rows(reduced, amortization, rate, start_index, end_index, simulation.first_due_date)?
        }
    };

    // Keep the dates and numbering already on the schedule.
    for (row, original) in rows.iter_mut().zip(original_tail) {
        row.number = original.number;
        row.due_date = original.due_date;
    }

    settle_final_balance(&mut rows);
    Ok(rows)
}

/// Hold each installment's amortization and stop once `reduced` is retired.
///
/// When the prepayment alone retires the balance, the affected installment
/// stays as a zero closing row so the schedule is never empty.
fn shorten_tail(simulation: &Simulation, index: usize, reduced: Money) -> Vec<Installment> {
    let rate = simulation.monthly_rate;
    let affected = &simulation.schedule[index];

    if reduced <= BALANCE_TOLERANCE {
        return vec![Installment {
            number: affected.number,
            due_date: affected.due_date,
            payment: Decimal::ZERO,
            amortization: Decimal::ZERO,
            interest: Decimal::ZERO,
            balance: Decimal::ZERO,
        }];
    }

    let mut balance = reduced;
    let mut rows = Vec::new();

    for original in &simulation.schedule[index..] {
        if balance <= BALANCE_TOLERANCE {
            break;
        }
        let interest = balance * rate;
        let mut amortization = original.amortization.min(balance);
        if balance - amortization <= BALANCE_TOLERANCE {
            amortization = balance;
        }
        balance -= amortization;
        rows.push(Installment {
            number: original.number,
            due_date: original.due_date,
            payment: amortization + interest,
            amortization,
            interest,
            balance,
        });
    }

    settle_final_balance(&mut rows);
    rows
}

fn validate_event(event: &PrepaymentEvent) -> LoanSimResult<()> {
    if event.amount <= Decimal::ZERO {
        return Err(LoanSimError::invalid(
            "amount",
            "Prepayment amount must be positive",
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::{simulate, SimulationInput};
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sac_12k() -> Simulation {
        simulate(&SimulationInput {
            method: AmortizationMethod::Sac,
            financing_amount: dec!(12000),
            down_payment: Decimal::ZERO,
            term_months: 12,
            monthly_rate: Some(dec!(0.01)),
            annual_rate: None,
            first_due_date: date(2024, 1, 10),
            operation_date: None,
            bank: None,
        })
        .unwrap()
        .result
    }

    fn event(y: i32, m: u32, d: u32, amount: Decimal, strategy: PrepaymentStrategy) -> PrepaymentEvent {
        PrepaymentEvent {
            effective_date: date(y, m, d),
            amount,
            strategy,
        }
    }

    #[test]
    fn test_reduce_term_sac_drops_installments() {
        let sim = sac_12k();
        // Installment 4 is due 2024-04-10 with an opening balance of 9000.
        let ev = event(2024, 4, 1, dec!(3000), PrepaymentStrategy::ReduceTerm);
        let app = apply_prepayment(&sim, &ev).unwrap();
        let out = &app.simulation;

        assert_eq!(
            app.outcome,
            PrepaymentOutcome::Applied {
                installment_number: 4,
                applied_amount: dec!(3000)
            }
        );
        assert_eq!(out.schedule.len(), 9);
        assert_eq!(out.term_months, 9);
        assert_eq!(out.schedule[3].interest, dec!(60));
        assert_eq!(out.schedule[3].payment, dec!(1060));
        assert_eq!(out.schedule[3].balance, dec!(5000));
        assert_eq!(out.schedule[8].balance, Decimal::ZERO);
        assert_eq!(out.schedule[8].due_date, date(2024, 9, 10));
        assert!(out.totals.total_interest < sim.totals.total_interest);
        // Untouched head
        assert_eq!(out.schedule[..3], sim.schedule[..3]);
    }

    #[test]
    fn test_reduce_installment_sac_keeps_length() {
        let sim = sac_12k();
        let ev = event(2024, 4, 10, dec!(3000), PrepaymentStrategy::ReduceInstallment);
        let out = apply_prepayment(&sim, &ev).unwrap().simulation;

        assert_eq!(out.schedule.len(), 12);
        let expected_amort = dec!(6000) / dec!(9);
        assert_eq!(out.schedule[3].amortization, expected_amort);
        assert_eq!(out.schedule[3].interest, dec!(60));
        for i in 3..12 {
            assert!(out.schedule[i].payment < sim.schedule[i].payment);
        }
        assert_eq!(out.schedule[11].balance, Decimal::ZERO);
    }

    #[test]
    fn test_event_after_last_installment_is_noop() {
        let sim = sac_12k();
        let ev = event(2025, 1, 1, dec!(500), PrepaymentStrategy::ReduceTerm);
        let app = apply_prepayment(&sim, &ev).unwrap();
        assert!(matches!(app.outcome, PrepaymentOutcome::NoEffect { .. }));
        assert_eq!(app.simulation, sim);
    }

    #[test]
    fn test_non_positive_amount_rejected() {
        let sim = sac_12k();
        for amount in [Decimal::ZERO, dec!(-10)] {
            let ev = event(2024, 4, 1, amount, PrepaymentStrategy::ReduceInstallment);
            let err = apply_prepayment(&sim, &ev).unwrap_err();
            assert!(matches!(err, LoanSimError::InvalidInput { ref field, .. } if field == "amount"));
        }
    }

    #[test]
    fn test_overpayment_clamped_reduce_installment() {
        let sim = sac_12k();
        let ev = event(2024, 4, 1, dec!(20000), PrepaymentStrategy::ReduceInstallment);
        let app = apply_prepayment(&sim, &ev).unwrap();
        assert_eq!(
            app.outcome,
            PrepaymentOutcome::OverPayment {
                installment_number: 4,
                applied_amount: dec!(9000),
                excess: dec!(11000)
            }
        );
        let out = app.simulation;
        assert_eq!(out.schedule.len(), 12);
        for inst in &out.schedule[3..] {
            assert_eq!(inst.payment, Decimal::ZERO);
            assert_eq!(inst.balance, Decimal::ZERO);
        }
        assert!(out.schedule.iter().all(|i| i.balance >= Decimal::ZERO));
    }

    #[test]
    fn test_overpayment_clamped_reduce_term_ends_schedule() {
        let sim = sac_12k();
        let ev = event(2024, 4, 1, dec!(9500), PrepaymentStrategy::ReduceTerm);
        let app = apply_prepayment(&sim, &ev).unwrap();
        assert!(matches!(app.outcome, PrepaymentOutcome::OverPayment { excess, .. } if excess == dec!(500)));
        let out = &app.simulation;
        assert_eq!(out.term_months, 4);
        assert_eq!(out.schedule[..3], sim.schedule[..3]);
        // Installment 4 closes the loan with nothing left to pay.
        assert_eq!(out.schedule[3].payment, Decimal::ZERO);
        assert_eq!(out.schedule[3].interest, Decimal::ZERO);
        assert_eq!(out.schedule[3].balance, Decimal::ZERO);
        assert_eq!(out.schedule[3].due_date, date(2024, 4, 10));
    }

    #[test]
    fn test_reduce_term_payoff_at_first_installment_keeps_closing_row() {
        let sim = sac_12k();
        let ev = event(2023, 12, 1, dec!(12000), PrepaymentStrategy::ReduceTerm);
        let app = apply_prepayment(&sim, &ev).unwrap();
        assert_eq!(
            app.outcome,
            PrepaymentOutcome::Applied {
                installment_number: 1,
                applied_amount: dec!(12000)
            }
        );
        let out = &app.simulation;
        assert_eq!(out.term_months, 1);
        assert_eq!(out.schedule.len(), 1);
        assert_eq!(out.schedule[0].number, 1);
        assert_eq!(out.schedule[0].due_date, date(2024, 1, 10));
        assert_eq!(out.totals.total_interest, Decimal::ZERO);
        assert_eq!(out.first_payment, Decimal::ZERO);
    }

    #[test]
    fn test_event_before_first_installment_uses_principal() {
        let sim = sac_12k();
        let ev = event(2023, 12, 1, dec!(1200), PrepaymentStrategy::ReduceInstallment);
        let app = apply_prepayment(&sim, &ev).unwrap();
        let out = app.simulation;
        assert_eq!(out.schedule[0].interest, dec!(108));
        assert_eq!(out.schedule[0].amortization, dec!(900));
    }

    #[test]
    fn test_process_summarizes_savings() {
        let sim = sac_12k();
        let input = PrepaymentInput {
            simulation: sim.clone(),
            events: vec![
                event(2024, 4, 1, dec!(3000), PrepaymentStrategy::ReduceTerm),
                event(2026, 1, 1, dec!(100), PrepaymentStrategy::ReduceTerm),
            ],
        };
        let out = process_prepayments(&input).unwrap();
        let s = &out.result;
        assert_eq!(s.original_term_months, 12);
        assert_eq!(s.new_term_months, 9);
        assert_eq!(s.installments_removed, 3);
        assert_eq!(s.interest_saved, s.original_total_interest - s.new_total_interest);
        assert!(s.interest_saved > Decimal::ZERO);
        assert_eq!(s.outcomes.len(), 2);
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn test_process_requires_events() {
        let input = PrepaymentInput {
            simulation: sac_12k(),
            events: vec![],
        };
        assert!(process_prepayments(&input).is_err());
    }

    #[test]
    fn test_out_of_order_events_warned() {
        let input = PrepaymentInput {
            simulation: sac_12k(),
            events: vec![
                event(2024, 6, 1, dec!(100), PrepaymentStrategy::ReduceInstallment),
                event(2024, 3, 1, dec!(100), PrepaymentStrategy::ReduceInstallment),
            ],
        };
        let out = process_prepayments(&input).unwrap();
        assert!(out.warnings.iter().any(|w| w.contains("ascending")));
    }

    #[test]
    fn test_outcome_serializes_with_kind_tag() {
        let json = serde_json::to_value(PrepaymentOutcome::NoEffect {
            reason: "late".into(),
        })
        .unwrap();
        assert_eq!(json["kind"], "no_effect");
    }
}
