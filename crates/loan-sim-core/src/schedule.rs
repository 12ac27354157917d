//! PRICE (constant installment) and SAC (constant amortization) schedules.
//!
//! Installments fall due on consecutive calendar months counted from the
//! first due date. Any residual left on the final balance by decimal
//! rounding is folded into the last installment's amortization, so a
//! generated schedule always closes at exactly zero.

use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::LoanSimError;
use crate::rates::checked_pow;
use crate::types::{AmortizationMethod, Installment, Money, Rate};
use crate::LoanSimResult;

/// Balances within this distance of zero are treated as fully repaid.
pub const BALANCE_TOLERANCE: Decimal = dec!(0.000001);

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Build the full installment sequence for a loan.
pub fn generate_schedule(
    method: AmortizationMethod,
    principal: Money,
    term_months: u32,
    monthly_rate: Rate,
    first_due_date: NaiveDate,
) -> LoanSimResult<Vec<Installment>> {
    validate(principal, term_months, monthly_rate)?;

    let mut schedule = match method {
        AmortizationMethod::Price => {
            let payment = level_payment(principal, monthly_rate, term_months)?;
            price_rows(principal, payment, monthly_rate, 0, term_months, first_due_date)?
        }
        AmortizationMethod::Sac => {
            let amortization = principal / Decimal::from(term_months);
            sac_rows(principal, amortization, monthly_rate, 0, term_months, first_due_date)?
        }
    };

    settle_final_balance(&mut schedule);
    Ok(schedule)
}

/// Constant PRICE installment for `balance` over `periods` at `monthly_rate`.
///
/// A zero rate degenerates to equal principal slices.
pub fn level_payment(balance: Money, monthly_rate: Rate, periods: u32) -> LoanSimResult<Money> {
    if periods == 0 {
        return Err(LoanSimError::invalid("term_months", "Term must be at least one month"));
    }
    if monthly_rate.is_zero() {
        return Ok(balance / Decimal::from(periods));
    }

    let growth = checked_pow(Decimal::ONE + monthly_rate, periods).ok_or_else(|| {
        LoanSimError::invalid("monthly_rate", "Compounded growth overflows decimal range")
    })?;
    let denominator = growth - Decimal::ONE;
    if denominator.is_zero() {
        return Ok(balance / Decimal::from(periods));
    }

    monthly_rate
        .checked_mul(growth)
        .and_then(|factor| balance.checked_mul(factor))
        .map(|n| n / denominator)
        .ok_or_else(|| LoanSimError::invalid("principal", "Installment overflows decimal range"))
}

/// Due date of the installment `offset` months after `first_due_date`.
///
/// Day-of-month is clamped to the last valid day of the target month.
pub fn due_date_at(first_due_date: NaiveDate, offset: u32) -> LoanSimResult<NaiveDate> {
    first_due_date
        .checked_add_months(Months::new(offset))
        .ok_or_else(|| {
            LoanSimError::DateError(format!(
                "{first_due_date} + {offset} months is outside the supported calendar"
            ))
        })
}

// ---------------------------------------------------------------------------
// Row builders (shared with prepayment recalculation)
// ---------------------------------------------------------------------------

/// Rows `start_index..end_index` (0-based) under a constant payment.
pub(crate) fn price_rows(
    opening_balance: Money,
    payment: Money,
    monthly_rate: Rate,
    start_index: u32,
    end_index: u32,
    first_due_date: NaiveDate,
) -> LoanSimResult<Vec<Installment>> {
    let mut rows = Vec::with_capacity(end_index.saturating_sub(start_index) as usize);
    let mut balance = opening_balance;

    for idx in start_index..end_index {
        let interest = balance * monthly_rate;
        let amortization = payment - interest;
        balance -= amortization;
        rows.push(Installment {
            number: idx + 1,
            due_date: due_date_at(first_due_date, idx)?,
            payment,
            amortization,
            interest,
            balance,
        });
    }

    Ok(rows)
}

/// Rows `start_index..end_index` (0-based) under a constant amortization.
pub(crate) fn sac_rows(
    opening_balance: Money,
    amortization: Money,
    monthly_rate: Rate,
    start_index: u32,
    end_index: u32,
    first_due_date: NaiveDate,
) -> LoanSimResult<Vec<Installment>> {
    let mut rows = Vec::with_capacity(end_index.saturating_sub(start_index) as usize);
    let mut balance = opening_balance;

    for idx in start_index..end_index {
        let interest = balance * monthly_rate;
        balance -= amortization;
        rows.push(Installment {
            number: idx + 1,
            due_date: due_date_at(first_due_date, idx)?,
            payment: amortization + interest,
            amortization,
            interest,
            balance,
        });
    }

    Ok(rows)
}

/// Fold the residual final balance into the last installment's amortization.
pub(crate) fn settle_final_balance(schedule: &mut [Installment]) {
    if let Some(last) = schedule.last_mut() {
        if !last.balance.is_zero() {
            if last.balance.abs() > BALANCE_TOLERANCE {
                tracing::warn!(
                    residual = %last.balance,
                    installment = last.number,
                    "schedule closed with a residual balance above tolerance"
                );
            }
            last.amortization += last.balance;
            last.payment = last.amortization + last.interest;
            last.balance = Decimal::ZERO;
        }
    }
}

fn validate(principal: Money, term_months: u32, monthly_rate: Rate) -> LoanSimResult<()> {
    if principal <= Decimal::ZERO {
        return Err(LoanSimError::invalid("principal", "Financed principal must be positive"));
    }
    if term_months == 0 {
        return Err(LoanSimError::invalid("term_months", "Term must be at least one month"));
    }
    if monthly_rate <= dec!(-1) {
        return Err(LoanSimError::invalid(
            "monthly_rate",
            "Rate must be greater than -100%",
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
