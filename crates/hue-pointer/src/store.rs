//! Persisted calibration storage.
//!
//! The tracking loop treats the store as opaque: a well-formed set or
//! nothing. Missing, unreadable, corrupt, or partial records all degrade to
//! `None` on load, which forces a fresh calibration run.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::calibrate::CalibrationSet;

/// Load/save failure. On load this never escapes the store (it degrades to
/// `None`); on save the caller decides — the tracking loop warns and
/// finishes the session, the CLI treats it as fatal.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub trait CalibrationStore {
    /// The persisted set, or `None` when absent or unusable (reason logged).
    fn load(&self) -> Option<CalibrationSet>;

    /// Persist `set`, overwriting any prior record.
    fn save(&mut self, set: &CalibrationSet) -> Result<(), StoreError>;
}

/// File-backed store: one pretty-printed JSON record holding the six bounds
/// per marker, marker A first.
#[derive(Clone, Debug)]
pub struct JsonCalibrationStore {
    path: PathBuf,
}

impl JsonCalibrationStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CalibrationStore for JsonCalibrationStore {
    fn load(&self) -> Option<CalibrationSet> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) => {
                debug!("no calibration at {}: {err}", self.path.display());
                return None;
            }
        };
        match serde_json::from_str::<CalibrationSet>(&raw) {
            Ok(set) if set.is_well_formed() => Some(set),
            Ok(_) => {
                warn!(
                    "calibration at {} is malformed (inverted or out-of-range bounds), ignoring",
                    self.path.display()
                );
                None
            }
            Err(err) => {
                warn!("corrupt calibration at {}: {err}", self.path.display());
                None
            }
        }
    }

    fn save(&mut self, set: &CalibrationSet) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(set)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}
