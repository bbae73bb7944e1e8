use std::fmt;
use std::fs::File;
use std::io;
use std::path::Path;

use fxhash::FxHashMap;
use log::warn;

use crate::env::{BlackJackObservation, N_ACTIONS};

#[derive(Debug)]
pub enum PersistenceError {
    Io(io::Error),
    Json(serde_json::Error),
}

impl fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersistenceError::Io(e) => write!(f, "could not write Q-table: {}", e),
            PersistenceError::Json(e) => write!(f, "could not encode Q-table: {}", e),
        }
    }
}

impl std::error::Error for PersistenceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PersistenceError::Io(e) => Some(e),
            PersistenceError::Json(e) => Some(e),
        }
    }
}

impl From<io::Error> for PersistenceError {
    fn from(e: io::Error) -> Self {
        PersistenceError::Io(e)
    }
}

impl From<serde_json::Error> for PersistenceError {
    fn from(e: serde_json::Error) -> Self {
        PersistenceError::Json(e)
    }
}

/// Learned action values, one fixed-size record per visited state.
///
/// Entries appear the first time a state is touched and are never removed;
/// the map is the entire learned state of an agent and the only thing that
/// gets persisted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QTable {
    values: FxHashMap<BlackJackObservation, [f64; N_ACTIONS]>,
}

impl QTable {
    pub fn new() -> Self {
        Self {
            values: FxHashMap::default(),
        }
    }

    /// Current action values for `obs`, inserting the zero record on first
    /// sight.
    pub fn action_values(&mut self, obs: &BlackJackObservation) -> [f64; N_ACTIONS] {
        *self.values.entry(*obs).or_insert([0.0; N_ACTIONS])
    }

    /// Mutable record for `obs`, inserting the zero record on first sight.
    pub fn entry_mut(&mut self, obs: &BlackJackObservation) -> &mut [f64; N_ACTIONS] {
        self.values.entry(*obs).or_insert([0.0; N_ACTIONS])
    }

    pub fn get(&self, obs: &BlackJackObservation) -> Option<&[f64; N_ACTIONS]> {
        self.values.get(obs)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    /// Write the table as JSON `[state, values]` pairs, sorted by state so
    /// repeated saves of the same table produce identical artifacts.
    pub fn save(&self, path: &Path) -> Result<(), PersistenceError> {
        let mut entries: Vec<(BlackJackObservation, [f64; N_ACTIONS])> =
            self.values.iter().map(|(obs, values)| (*obs, *values)).collect();
        entries.sort_by_key(|(obs, _)| *obs);
        let mut file = File::create(path)?;
        serde_json::to_writer(&mut file, &entries)?;
        Ok(())
    }

    /// Replace the table with the contents of `path`.
    ///
    /// A missing or unreadable file is not fatal: training can always start
    /// from a cold table, so this logs the problem and keeps the current
    /// values.
    pub fn load(&mut self, path: &Path) {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) => {
                warn!(
                    "Q-table file {} not found ({}), starting with current table",
                    path.display(),
                    e
                );
                return;
            }
        };
        let reader = io::BufReader::new(file);
        match serde_json::from_reader::<_, Vec<(BlackJackObservation, [f64; N_ACTIONS])>>(reader) {
            Ok(entries) => {
                self.values = entries.into_iter().collect();
            }
            Err(e) => {
                warn!(
                    "Q-table file {} could not be parsed ({}), keeping current table",
                    path.display(),
                    e
                );
            }
        }
    }
}
