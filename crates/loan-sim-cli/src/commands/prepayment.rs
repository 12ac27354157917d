use chrono::NaiveDate;
use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde_json::Value;

use loan_sim_core::prepayment::{self, PrepaymentEvent, PrepaymentInput, PrepaymentStrategy};
use loan_sim_core::store::SimulationStore;

use crate::commands::save_to_history;
use crate::config::CliConfig;
use crate::input;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum StrategyArg {
    /// Keep the end date, lower the installments
    ReduceInstallment,
    /// Keep the amortization, finish earlier
    ReduceTerm,
}

impl From<StrategyArg> for PrepaymentStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::ReduceInstallment => PrepaymentStrategy::ReduceInstallment,
            StrategyArg::ReduceTerm => PrepaymentStrategy::ReduceTerm,
        }
    }
}

/// Arguments for prepayment recalculation
#[derive(Args)]
pub struct PrepayArgs {
    /// Path to JSON/YAML file holding `simulation` and `events`
    #[arg(long, conflicts_with = "id")]
    pub input: Option<String>,

    /// Id of a saved simulation to recalculate
    #[arg(long)]
    pub id: Option<String>,

    /// Date the prepayment takes effect (YYYY-MM-DD)
    #[arg(long, requires = "id")]
    pub date: Option<NaiveDate>,

    /// Extra principal paid
    #[arg(long, requires = "id")]
    pub amount: Option<Decimal>,

    /// What the prepayment reduces
    #[arg(long, value_enum, default_value = "reduce-installment")]
    pub strategy: StrategyArg,

    /// Append the recalculated simulation to the history store
    #[arg(long)]
    pub save: bool,
}

pub fn run_prepay(args: PrepayArgs, config: &CliConfig) -> Result<Value, Box<dyn std::error::Error>> {
    let prepay_input = match &args.id {
        Some(id) => from_saved(id, &args, config)?,
        None => input::read_input::<PrepaymentInput>(args.input.as_deref())?
            .ok_or("--id is required (or provide --input)")?,
    };

    let result = prepayment::process_prepayments(&prepay_input)?;

    let mut value = serde_json::to_value(&result)?;
    if args.save {
        let id = save_to_history(&result.result.simulation, config)?;
        value["saved_id"] = Value::String(id);
    }
    Ok(value)
}

fn from_saved(
    id: &str,
    args: &PrepayArgs,
    config: &CliConfig,
) -> Result<PrepaymentInput, Box<dyn std::error::Error>> {
    let record = config
        .open_store()
        .find(id)?
        .ok_or_else(|| format!("No saved simulation with id '{id}'"))?;

    let event = PrepaymentEvent {
        effective_date: args.date.ok_or("--date is required with --id")?,
        amount: args.amount.ok_or("--amount is required with --id")?,
        strategy: args.strategy.into(),
    };

    Ok(PrepaymentInput {
        simulation: record.to_simulation()?,
        events: vec![event],
    })
}
