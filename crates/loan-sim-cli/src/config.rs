use std::path::PathBuf;

use loan_sim_core::store::{FileStore, KeyedSimulationStore};

pub const DEFAULT_STORE_PATH: &str = "simulations.json";
pub const DEFAULT_LOG_LEVEL: &str = "warn";

/// Runtime settings resolved from flags, then environment, then defaults.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub store_path: PathBuf,
    /// Filter directive used when `RUST_LOG` is not set
    pub log_level: String,
}

impl CliConfig {
    /// `store` arrives already merged with `LOANSIM_STORE` by clap.
    pub fn resolve(store: Option<PathBuf>, log_level: Option<String>) -> Self {
        CliConfig {
            store_path: store.unwrap_or_else(|| PathBuf::from(DEFAULT_STORE_PATH)),
            log_level: log_level
                .filter(|l| !l.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
        }
    }

    /// Saved-simulation history backed by the configured JSON file.
    pub fn open_store(&self) -> KeyedSimulationStore<FileStore> {
        KeyedSimulationStore::new(FileStore::new(&self.store_path))
    }
}
