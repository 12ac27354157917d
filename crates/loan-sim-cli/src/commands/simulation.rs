use chrono::NaiveDate;
use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use loan_sim_core::comparison;
use loan_sim_core::simulation::{self, SimulationInput};
use loan_sim_core::AmortizationMethod;

use crate::commands::save_to_history;
use crate::config::CliConfig;
use crate::input;

/// Loan terms shared by `simulate` and `compare`
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct LoanTermsArgs {
    /// Path to JSON/YAML input file (overrides the flags below)
    #[arg(long)]
    pub input: Option<String>,

    /// Requested amount before the down payment
    #[arg(long, alias = "amount")]
    pub financing_amount: Option<Decimal>,

    /// Down payment deducted from the financed amount
    #[arg(long, default_value = "0")]
    pub down_payment: Decimal,

    /// Number of monthly installments
    #[arg(long, alias = "months")]
    pub term_months: Option<u32>,

    /// Effective monthly rate (e.g. 0.01 for 1%)
    #[arg(long, conflicts_with = "annual_rate")]
    pub monthly_rate: Option<Decimal>,

    /// Effective annual rate (e.g. 0.1268 for 12.68%)
    #[arg(long)]
    pub annual_rate: Option<Decimal>,

    /// First installment due date (YYYY-MM-DD)
    #[arg(long)]
    pub first_due_date: Option<NaiveDate>,

    /// Contract date (YYYY-MM-DD)
    #[arg(long)]
    pub operation_date: Option<NaiveDate>,

    /// Lender name, kept with saved simulations
    #[arg(long)]
    pub bank: Option<String>,
}

impl LoanTermsArgs {
    fn into_input(
        self,
        method: AmortizationMethod,
    ) -> Result<SimulationInput, Box<dyn std::error::Error>> {
        if let Some(parsed) = input::read_input::<SimulationInput>(self.input.as_deref())? {
            return Ok(parsed);
        }

        Ok(SimulationInput {
            method,
            financing_amount: self
                .financing_amount
                .ok_or("--financing-amount is required (or provide --input)")?,
            down_payment: self.down_payment,
            term_months: self
                .term_months
                .ok_or("--term-months is required (or provide --input)")?,
            monthly_rate: self.monthly_rate,
            annual_rate: self.annual_rate,
            first_due_date: self
                .first_due_date
                .ok_or("--first-due-date is required (or provide --input)")?,
            operation_date: self.operation_date,
            bank: self.bank,
        })
    }
}

/// Arguments for a single-method simulation
#[derive(Args)]
pub struct SimulateArgs {
    /// Amortization system: price or sac
    #[arg(long, default_value = "price")]
    pub method: AmortizationMethod,

    #[command(flatten)]
    pub terms: LoanTermsArgs,

    /// Append the result to the history store
    #[arg(long)]
    pub save: bool,
}

/// Arguments for a PRICE vs SAC comparison
#[derive(Args)]
pub struct CompareArgs {
    #[command(flatten)]
    pub terms: LoanTermsArgs,
}

pub fn run_simulate(
    args: SimulateArgs,
    config: &CliConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let sim_input = args.terms.into_input(args.method)?;
    let result = simulation::simulate(&sim_input)?;

    let mut value = serde_json::to_value(&result)?;
    if args.save {
        let id = save_to_history(&result.result, config)?;
        value["saved_id"] = Value::String(id);
    }
    Ok(value)
}

pub fn run_compare(args: CompareArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let sim_input = args.terms.into_input(AmortizationMethod::default())?;
    let result = comparison::compare_methods(&sim_input)?;
    Ok(serde_json::to_value(result)?)
}
