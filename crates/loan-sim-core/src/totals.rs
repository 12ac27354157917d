use rust_decimal::Decimal;

use crate::types::{Installment, ScheduleTotals};

/// Sum the payment, amortization and interest columns of a schedule.
pub fn aggregate(schedule: &[Installment]) -> ScheduleTotals {
    schedule
        .iter()
        .fold(ScheduleTotals::default(), |mut acc, inst| {
            acc.total_payment += inst.payment;
            acc.total_amortization += inst.amortization;
            acc.total_interest += inst.interest;
            acc
        })
}

/// Payment of the first and last installment, zero for an empty schedule.
pub fn boundary_payments(schedule: &[Installment]) -> (Decimal, Decimal) {
    let first = schedule.first().map_or(Decimal::ZERO, |i| i.payment);
    let last = schedule.last().map_or(Decimal::ZERO, |i| i.payment);
    (first, last)
}
