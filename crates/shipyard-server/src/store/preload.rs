//! Startup seeding from a JSON file
//!
//! The file holds a JSON array of ships, inserted in order. Loading stops at
//! the first entry that is not a valid ship; entries before it are kept. A
//! missing or unreadable file is logged and the service starts empty. Startup
//! is never aborted.

use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;
use tracing::{error, info};

use super::{Ship, ShipStore};

/// Why a seed file could not be (fully) loaded
#[derive(Error, Debug)]
pub enum PreloadError {
    /// File could not be read
    #[error("Failed to read {path}: {source}")]
    Read {
        /// Seed file path
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// File is not a JSON array
    #[error("Invalid ship data in {path}: {source}")]
    Parse {
        /// Seed file path
        path: PathBuf,
        /// Underlying parse error
        source: serde_json::Error,
    },

    /// An array entry is not a valid ship
    #[error("Invalid ship at index {index} in {path}: {source}")]
    Entry {
        /// Seed file path
        path: PathBuf,
        /// Position of the offending entry
        index: usize,
        /// Underlying parse error
        source: serde_json::Error,
    },
}

/// Result of reading a seed file
#[derive(Debug, Default)]
pub struct LoadedShips {
    /// Ships parsed before any failure, in file order
    pub ships: Vec<Ship>,
    /// What stopped loading, if anything
    pub error: Option<PreloadError>,
}

/// Read and parse a seed file
///
/// An unreadable file or one that is not a JSON array yields no ships. An
/// invalid entry ends loading; the ships before it are returned alongside
/// the error.
pub fn load_ships(path: &Path) -> LoadedShips {
    let raw = match std::fs::read(path) {
        Ok(raw) => raw,
        Err(source) => {
            return LoadedShips {
                ships: Vec::new(),
                error: Some(PreloadError::Read {
                    path: path.to_path_buf(),
                    source,
                }),
            };
        }
    };

    let entries: Vec<Value> = match serde_json::from_slice(&raw) {
        Ok(entries) => entries,
        Err(source) => {
            return LoadedShips {
                ships: Vec::new(),
                error: Some(PreloadError::Parse {
                    path: path.to_path_buf(),
                    source,
                }),
            };
        }
    };

    let mut loaded = LoadedShips::default();
    for (index, entry) in entries.into_iter().enumerate() {
        match serde_json::from_value::<Ship>(entry) {
            Ok(ship) => loaded.ships.push(ship),
            Err(source) => {
                loaded.error = Some(PreloadError::Entry {
                    path: path.to_path_buf(),
                    index,
                    source,
                });
                break;
            }
        }
    }
    loaded
}

impl ShipStore {
    /// Seed the store from `path`, logging instead of failing
    ///
    /// Returns the number of ships loaded.
    pub fn preload(&self, path: &Path) -> usize {
        let LoadedShips { ships, error } = load_ships(path);
        let loaded = self.replace_all(ships);
        match error {
            None => info!(path = %path.display(), loaded, "Data preloaded"),
            Some(e) => error!(error = %e, loaded, "Startup preload failed"),
        }
        loaded
    }
}
