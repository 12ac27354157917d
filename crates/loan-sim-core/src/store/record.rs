use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::LoanSimError;
use crate::rates::monthly_to_annual;
use crate::simulation::Simulation;
use crate::types::{AmortizationMethod, Installment, Money, ScheduleTotals};
use crate::LoanSimResult;

/// Persisted installment row. Amounts are plain JSON numbers.
///
/// Zero-rate PRICE records from the browser front end hold `null` amounts
/// (a 0/0 installment serialized by `JSON.stringify`); those read as zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedInstallment {
    pub number: u32,
    #[serde(with = "display_date")]
    pub date: NaiveDate,
    #[serde(with = "lenient_amount")]
    pub payment: Money,
    #[serde(with = "lenient_amount")]
    pub amortization: Money,
    #[serde(with = "lenient_amount")]
    pub interest: Money,
    #[serde(with = "lenient_amount")]
    pub balance: Money,
}

/// Persisted simulation snapshot, keyed in camelCase.
///
/// `monthly_rate` is stored in percent (1 = 1% a month).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedSimulation {
    pub id: String,
    #[serde(rename = "type")]
    pub method: AmortizationMethod,
    /// Date the record was saved
    #[serde(with = "display_date")]
    pub date: NaiveDate,
    #[serde(with = "lenient_amount")]
    pub financing_amount: Money,
    #[serde(with = "lenient_amount")]
    pub down_payment: Money,
    pub months: u32,
    #[serde(with = "lenient_amount")]
    pub monthly_rate: Decimal,
    #[serde(default)]
    pub bank: String,
    #[serde(with = "lenient_amount")]
    pub first_payment: Money,
    #[serde(with = "lenient_amount")]
    pub last_payment: Money,
    #[serde(with = "lenient_amount")]
    pub total_amount: Money,
    #[serde(with = "lenient_amount")]
    pub total_interest: Money,
    #[serde(default)]
    pub installments: Vec<SavedInstallment>,
}

impl SavedSimulation {
    /// Snapshot a simulation for the history store.
    pub fn from_simulation(simulation: &Simulation, id: impl Into<String>, saved_on: NaiveDate) -> Self {
        SavedSimulation {
            id: id.into(),
            method: simulation.method,
            date: saved_on,
            financing_amount: simulation.financing_amount,
            down_payment: simulation.down_payment,
            months: simulation.term_months,
            monthly_rate: simulation.monthly_rate * dec!(100),
            bank: simulation.bank.clone().unwrap_or_default(),
            first_payment: simulation.first_payment,
            last_payment: simulation.last_payment,
            total_amount: simulation.totals.total_payment,
            total_interest: simulation.totals.total_interest,
            installments: simulation
                .schedule
                .iter()
                .map(|i| SavedInstallment {
                    number: i.number,
                    date: i.due_date,
                    payment: i.payment,
                    amortization: i.amortization,
                    interest: i.interest,
                    balance: i.balance,
                })
                .collect(),
        }
    }

    /// Rebuild a simulation from the stored rows so it can be recalculated.
    ///
    /// Totals and boundary payments are recomputed from the installments
    /// rather than trusted from the snapshot.
    pub fn to_simulation(&self) -> LoanSimResult<Simulation> {
        let first = self.installments.first().ok_or_else(|| {
            LoanSimError::invalid("installments", "Saved simulation has no installment rows")
        })?;

        let monthly_rate = self.monthly_rate / dec!(100);
        let mut simulation = Simulation {
            method: self.method,
            financing_amount: self.financing_amount,
            down_payment: self.down_payment,
            principal: self.financing_amount - self.down_payment,
            term_months: self.months,
            monthly_rate,
            annual_rate: monthly_to_annual(monthly_rate)?,
            first_due_date: first.date,
            operation_date: None,
            bank: Some(self.bank.clone()).filter(|b| !b.trim().is_empty()),
            schedule: self
                .installments
                .iter()
                .map(|i| Installment {
                    number: i.number,
                    due_date: i.date,
                    payment: i.payment,
                    amortization: i.amortization,
                    interest: i.interest,
                    balance: i.balance,
                })
                .collect(),
            totals: ScheduleTotals::default(),
            first_payment: Decimal::ZERO,
            last_payment: Decimal::ZERO,
        };
        simulation.recompute_summary();
        Ok(simulation)
    }
}

/// Float JSON numbers on write; `null` reads back as zero.
mod lenient_amount {
    use rust_decimal::Decimal;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Decimal, serializer: S) -> Result<S::Ok, S::Error> {
        rust_decimal::serde::float::serialize(value, serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Decimal, D::Error> {
        Ok(rust_decimal::serde::float_option::deserialize(deserializer)?.unwrap_or_default())
    }
}

/// `dd/mm/yyyy` dates, also accepting ISO `yyyy-mm-dd` on read.
mod display_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%d/%m/%Y";

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&date.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDate::parse_from_str(raw.trim(), FORMAT)
            .or_else(|_| NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d"))
            .map_err(|e| serde::de::Error::custom(format!("invalid date '{raw}': {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::{simulate, SimulationInput};

    fn sample() -> Simulation {
        simulate(&SimulationInput {
            method: AmortizationMethod::Price,
            financing_amount: dec!(250000),
            down_payment: dec!(50000),
            term_months: 24,
            monthly_rate: Some(dec!(0.0085)),
            annual_rate: None,
            first_due_date: NaiveDate::from_ymd_opt(2024, 8, 20).unwrap(),
            operation_date: None,
            bank: Some("Caixa".into()),
        })
        .unwrap()
        .result
    }

    #[test]
    fn test_snapshot_uses_percent_rate_and_display_dates() {
        let saved = SavedSimulation::from_simulation(
            &sample(),
            "1718000000000",
            NaiveDate::from_ymd_opt(2024, 7, 1).unwrap(),
        );
        let json = serde_json::to_value(&saved).unwrap();
        assert_eq!(json["type"], "PRICE");
        assert_eq!(json["date"], "01/07/2024");
        assert_eq!(json["monthlyRate"].as_f64(), Some(0.85));
        assert_eq!(json["financingAmount"].as_f64(), Some(250000.0));
        assert_eq!(json["installments"][0]["date"], "20/08/2024");
        assert_eq!(json["installments"].as_array().unwrap().len(), 24);
        assert!(json["totalAmount"].is_number());
    }

    #[test]
    fn test_rebuilt_simulation_matches_original_within_float_precision() {
        let original = sample();
        let saved = SavedSimulation::from_simulation(
            &original,
            "1",
            NaiveDate::from_ymd_opt(2024, 7, 1).unwrap(),
        );
        let text = serde_json::to_string(&saved).unwrap();
        let back: SavedSimulation = serde_json::from_str(&text).unwrap();
        let rebuilt = back.to_simulation().unwrap();

        assert_eq!(rebuilt.principal, dec!(200000));
        assert_eq!(rebuilt.term_months, 24);
        assert_eq!(rebuilt.first_due_date, original.first_due_date);
        assert!((rebuilt.monthly_rate - dec!(0.0085)).abs() < dec!(0.0000000001));
        let drift = (rebuilt.totals.total_interest - original.totals.total_interest).abs();
        assert!(drift < dec!(0.0001));
    }

    #[test]
    fn test_record_without_rows_cannot_be_rebuilt() {
        let mut saved = SavedSimulation::from_simulation(
            &sample(),
            "1",
            NaiveDate::from_ymd_opt(2024, 7, 1).unwrap(),
        );
        saved.installments.clear();
        assert!(saved.to_simulation().is_err());
    }
}
