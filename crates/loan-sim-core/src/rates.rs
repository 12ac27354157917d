//! Effective rate conversion between monthly and annual compounding.
//!
//! `annual = (1 + monthly)^12 - 1` and `monthly = (1 + annual)^(1/12) - 1`.
//! Integer powers use checked iterative multiplication; the 12th root uses
//! Newton's method seeded from an f64 estimate so the two directions invert
//! each other well below 1e-9.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::LoanSimError;
use crate::types::{with_metadata, ComputationOutput, Rate};
use crate::LoanSimResult;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const PERIODS_PER_YEAR: u32 = 12;
const ROOT_MAX_ITERATIONS: u32 = 60;
const ROOT_TOLERANCE: Decimal = dec!(0.0000000000000000000001);

// ---------------------------------------------------------------------------
// Input / output types
// ---------------------------------------------------------------------------

/// Which compounding period the supplied rate refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateBasis {
    Monthly,
    Annual,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateConversionInput {
    /// Rate as a fraction (0.01 = 1%)
    pub rate: Rate,
    pub basis: RateBasis,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateConversionOutput {
    pub monthly_rate: Rate,
    pub annual_rate: Rate,
    /// Same rates expressed in percent, as entered in loan forms
    pub monthly_rate_pct: Decimal,
    pub annual_rate_pct: Decimal,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Compounded annual equivalent of an effective monthly rate.
pub fn monthly_to_annual(monthly_rate: Rate) -> LoanSimResult<Rate> {
    validate_rate("monthly_rate", monthly_rate)?;
    let growth = checked_pow(Decimal::ONE + monthly_rate, PERIODS_PER_YEAR).ok_or_else(|| {
        LoanSimError::invalid("monthly_rate", "Annual compounding overflows decimal range")
    })?;
    Ok(growth - Decimal::ONE)
}

/// Effective monthly rate equivalent to a compounded annual rate.
pub fn annual_to_monthly(annual_rate: Rate) -> LoanSimResult<Rate> {
    validate_rate("annual_rate", annual_rate)?;
    Ok(nth_root(Decimal::ONE + annual_rate, PERIODS_PER_YEAR) - Decimal::ONE)
}

/// Convert a single rate to both bases, wrapped in the standard envelope.
pub fn convert_rate(
    input: &RateConversionInput,
) -> LoanSimResult<ComputationOutput<RateConversionOutput>> {
    let start = Instant::now();

    let (monthly_rate, annual_rate) = match input.basis {
        RateBasis::Monthly => (input.rate, monthly_to_annual(input.rate)?),
        RateBasis::Annual => (annual_to_monthly(input.rate)?, input.rate),
    };

    let mut warnings = Vec::new();
    if input.rate < Decimal::ZERO {
        warnings.push(format!("Negative {:?} rate {} supplied", input.basis, input.rate));
    }

    let output = RateConversionOutput {
        monthly_rate,
        annual_rate,
        monthly_rate_pct: monthly_rate * dec!(100),
        annual_rate_pct: annual_rate * dec!(100),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Effective rate conversion (12 monthly compounding periods)",
        input,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn validate_rate(field: &str, rate: Rate) -> LoanSimResult<()> {
    if rate <= dec!(-1) {
        return Err(LoanSimError::invalid(field, "Rate must be greater than -100%"));
    }
    Ok(())
}

/// base^n via checked iterative multiplication; `None` on overflow.
pub(crate) fn checked_pow(base: Decimal, n: u32) -> Option<Decimal> {
    let mut result = Decimal::ONE;
    for _ in 0..n {
        result = result.checked_mul(base)?;
    }
    Some(result)
}

/// Positive nth root by Newton's method. `x` must be positive.
fn nth_root(x: Decimal, n: u32) -> Decimal {
    if n <= 1 || x.is_zero() || x == Decimal::ONE {
        return x;
    }

    let n_dec = Decimal::from(n);
    let mut guess = x
        .to_f64()
        .map(|f| f.powf(1.0 / f64::from(n)))
        .and_then(Decimal::from_f64)
        .filter(|g| *g > Decimal::ZERO)
        .unwrap_or(Decimal::ONE);

    for _ in 0..ROOT_MAX_ITERATIONS {
        let g_n_minus_1 = match checked_pow(guess, n - 1) {
            Some(p) if !p.is_zero() => p,
            _ => break,
        };
        let next = ((n_dec - Decimal::ONE) * guess + x / g_n_minus_1) / n_dec;
        let delta = (next - guess).abs();
        guess = next;
        if delta < ROOT_TOLERANCE {
            break;
        }
    }

    guess
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
