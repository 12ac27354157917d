//! Saved-simulation history.
//!
//! Records live as one JSON array under a single key of a keyed string
//! store, in the same shape the browser front end wrote to local storage.

pub mod backend;
pub mod history;
pub mod record;

pub use backend::{FileStore, KeyValueStore, MemoryStore};
pub use history::{KeyedSimulationStore, SimulationStore, SIMULATIONS_KEY};
pub use record::{SavedInstallment, SavedSimulation};
