use crate::domain::errors::ForecastError;
use crate::domain::market::observation::{Observation, ObservationSequence};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

/// Latest submitted history per symbol.
///
/// Each `replace` installs a whole new sequence; readers hold `Arc`
/// snapshots, so a sequence they already fetched never changes under them.
pub struct HistoryStore {
    histories: RwLock<HashMap<String, ObservationSequence>>,
}

// Manual Debug implementation for HistoryStore
impl std::fmt::Debug for HistoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryStore")
            .field("histories", &"<RwLock>")
            .finish()
    }
}

impl HistoryStore {
    pub fn new() -> Self {
        Self {
            histories: RwLock::new(HashMap::new()),
        }
    }

    /// Overwrites the history of `symbol` with `observations`, ordered by timestamp.
    pub fn replace(&self, symbol: &str, mut observations: Vec<Observation>) -> ObservationSequence {
        observations.sort_by_key(|o| o.timestamp);
        let sequence: ObservationSequence = Arc::new(observations);

        match self.histories.write() {
            Ok(mut guard) => {
                guard.insert(symbol.to_string(), sequence.clone());
            }
            Err(poisoned) => {
                tracing::error!("HistoryStore: Lock poisoned during write, recovering");
                poisoned
                    .into_inner()
                    .insert(symbol.to_string(), sequence.clone());
            }
        }

        sequence
    }

    pub fn get(&self, symbol: &str) -> Result<ObservationSequence, ForecastError> {
        let found = match self.histories.read() {
            Ok(guard) => guard.get(symbol).cloned(),
            Err(poisoned) => poisoned.into_inner().get(symbol).cloned(),
        };

        found.ok_or_else(|| ForecastError::NotFound {
            symbol: symbol.to_string(),
        })
    }

    /// Every symbol's current sequence, ordered by symbol. Each entry is a
    /// consistent snapshot of that symbol.
    pub fn snapshot_all(&self) -> BTreeMap<String, ObservationSequence> {
        let guard = match self.histories.read() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard
            .iter()
            .map(|(symbol, seq)| (symbol.clone(), seq.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        match self.histories.read() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::new()
    }
}
