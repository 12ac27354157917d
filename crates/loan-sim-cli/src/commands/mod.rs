pub mod history;
pub mod prepayment;
pub mod rates;
pub mod simulation;

use chrono::{Local, NaiveDate, Utc};

use loan_sim_core::simulation::Simulation;
use loan_sim_core::store::{SavedSimulation, SimulationStore};

use crate::config::CliConfig;

/// Append a snapshot to the configured history and return its id.
///
/// Ids are millisecond timestamps, saved dates are the local calendar day.
pub(crate) fn save_to_history(
    simulation: &Simulation,
    config: &CliConfig,
) -> Result<String, Box<dyn std::error::Error>> {
    let id = Utc::now().timestamp_millis().to_string();
    let saved_on: NaiveDate = Local::now().date_naive();
    let record = SavedSimulation::from_simulation(simulation, id.clone(), saved_on);

    let mut store = config.open_store();
    store.add(record)?;
    tracing::info!(id = %id, path = %config.store_path.display(), "simulation saved");
    Ok(id)
}
