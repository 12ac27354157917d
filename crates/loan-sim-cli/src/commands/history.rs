use clap::{Args, Subcommand};
use serde_json::{json, Value};

use loan_sim_core::store::{SavedSimulation, SimulationStore};
use loan_sim_core::AmortizationMethod;

use crate::config::CliConfig;

#[derive(Subcommand)]
pub enum HistoryCommand {
    /// List saved simulations, newest last
    List(ListArgs),
    /// Show one saved simulation with its installments
    Show(IdArgs),
    /// Delete a saved simulation
    Delete(IdArgs),
}

#[derive(Args)]
pub struct ListArgs {
    /// Only simulations built with this method (price or sac)
    #[arg(long)]
    pub method: Option<AmortizationMethod>,
}

#[derive(Args)]
pub struct IdArgs {
    #[arg(long)]
    pub id: String,
}

pub fn run_history(
    cmd: HistoryCommand,
    config: &CliConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let mut store = config.open_store();

    match cmd {
        HistoryCommand::List(args) => {
            let rows = store
                .filter(args.method)?
                .iter()
                .map(list_row)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Value::Array(rows))
        }
        HistoryCommand::Show(args) => {
            let record = store
                .find(&args.id)?
                .ok_or_else(|| format!("No saved simulation with id '{}'", args.id))?;
            Ok(serde_json::to_value(record)?)
        }
        HistoryCommand::Delete(args) => {
            if !store.delete(&args.id)? {
                return Err(format!("No saved simulation with id '{}'", args.id).into());
            }
            Ok(json!({ "id": args.id, "deleted": true }))
        }
    }
}

/// Summary line for listings; installments are left out.
fn list_row(record: &SavedSimulation) -> serde_json::Result<Value> {
    let mut row = serde_json::to_value(record)?;
    if let Value::Object(map) = &mut row {
        map.remove("installments");
    }
    Ok(row)
}
