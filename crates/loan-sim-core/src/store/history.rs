use crate::store::backend::KeyValueStore;
use crate::store::record::SavedSimulation;
use crate::types::AmortizationMethod;
use crate::LoanSimResult;

/// Key under which the saved-simulation array is stored.
pub const SIMULATIONS_KEY: &str = "simulations";

/// Load/save access to the saved-simulation collection.
pub trait SimulationStore {
    fn load(&self) -> LoanSimResult<Vec<SavedSimulation>>;
    fn save(&mut self, simulations: &[SavedSimulation]) -> LoanSimResult<()>;

    /// Append one record.
    fn add(&mut self, record: SavedSimulation) -> LoanSimResult<()> {
        let mut all = self.load()?;
        all.push(record);
        self.save(&all)
    }

    fn find(&self, id: &str) -> LoanSimResult<Option<SavedSimulation>> {
        Ok(self.load()?.into_iter().find(|s| s.id == id))
    }

    /// Remove the record with `id`. Returns whether one was removed.
    fn delete(&mut self, id: &str) -> LoanSimResult<bool> {
        let mut all = self.load()?;
        let before = all.len();
        all.retain(|s| s.id != id);
        if all.len() == before {
            return Ok(false);
        }
        self.save(&all)?;
        Ok(true)
    }

    /// All records, or only those built with `method`.
    fn filter(&self, method: Option<AmortizationMethod>) -> LoanSimResult<Vec<SavedSimulation>> {
        let all = self.load()?;
        Ok(match method {
            Some(m) => all.into_iter().filter(|s| s.method == m).collect(),
            None => all,
        })
    }
}

/// [`SimulationStore`] over one key of a [`KeyValueStore`].
#[derive(Debug, Clone)]
pub struct KeyedSimulationStore<S: KeyValueStore> {
    backend: S,
    key: String,
}

impl<S: KeyValueStore> KeyedSimulationStore<S> {
    pub fn new(backend: S) -> Self {
        Self::with_key(backend, SIMULATIONS_KEY)
    }

    pub fn with_key(backend: S, key: impl Into<String>) -> Self {
        KeyedSimulationStore {
            backend,
            key: key.into(),
        }
    }

    pub fn into_inner(self) -> S {
        self.backend
    }
}

impl<S: KeyValueStore> SimulationStore for KeyedSimulationStore<S> {
    fn load(&self) -> LoanSimResult<Vec<SavedSimulation>> {
        match self.backend.get(&self.key)? {
            Some(raw) if !raw.trim().is_empty() => Ok(serde_json::from_str(&raw)?),
            _ => Ok(Vec::new()),
        }
    }

    fn save(&mut self, simulations: &[SavedSimulation]) -> LoanSimResult<()> {
        let raw = serde_json::to_string(simulations)?;
        self.backend.set(&self.key, raw)?;
        tracing::info!(key = %self.key, count = simulations.len(), "saved simulations");
        Ok(())
    }
}
