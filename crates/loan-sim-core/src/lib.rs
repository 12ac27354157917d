//! Loan amortization simulation in decimal precision.
//!
//! Builds PRICE (constant installment) and SAC (constant amortization)
//! schedules, converts between monthly and annual effective rates, and
//! recalculates a schedule after extra principal payments.

pub mod error;
pub mod rates;
pub mod schedule;
pub mod simulation;
pub mod totals;
pub mod types;

#[cfg(feature = "prepayment")]
pub mod prepayment;

#[cfg(feature = "comparison")]
pub mod comparison;

#[cfg(feature = "store")]
pub mod store;

pub use error::LoanSimError;
pub use types::*;

/// Standard result type for all loan-sim operations
pub type LoanSimResult<T> = Result<T, LoanSimError>;
