//! In-memory ship registry
//!
//! Records live for the lifetime of the process. Keys are ship ids and are
//! kept ordered, so listings and searches come back sorted by id.

pub mod preload;

use std::collections::BTreeMap;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use preload::{LoadedShips, PreloadError, load_ships};

/// A ship record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ship {
    /// Unique identifier, also the store key
    pub id: String,
    /// Ship name
    pub name: String,
    /// Classification, e.g. "Aircraft Carrier"
    #[serde(rename = "type")]
    pub ship_type: String,
    /// Year of launch
    pub launch_year: i64,
    /// Operating country
    pub country: String,
    /// Length as published, units included
    pub length: String,
    /// Free-text history entries
    pub notable_events: Vec<String>,
}

/// Search filters; each present filter is a case-insensitive substring match
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ShipQuery {
    /// Matches against [`Ship::name`]
    pub name: Option<String>,
    /// Matches against [`Ship::ship_type`]
    #[serde(rename = "type")]
    pub ship_type: Option<String>,
    /// Matches against [`Ship::country`]
    pub country: Option<String>,
}

impl ShipQuery {
    /// Whether `ship` satisfies every present filter
    pub fn matches(&self, ship: &Ship) -> bool {
        contains_ignore_case(&ship.name, self.name.as_deref())
            && contains_ignore_case(&ship.ship_type, self.ship_type.as_deref())
            && contains_ignore_case(&ship.country, self.country.as_deref())
    }
}

fn contains_ignore_case(haystack: &str, needle: Option<&str>) -> bool {
    match needle {
        None => true,
        Some(needle) => haystack.to_lowercase().contains(&needle.to_lowercase()),
    }
}

/// Store operation failures; the display text is the client-facing detail
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreError {
    /// Create with an id that is already taken
    #[error("Ship with this ID already exists")]
    AlreadyExists,
    /// No ship with the requested id
    #[error("Ship not found")]
    NotFound,
    /// Update body names a different id than the path
    #[error("Ship ID in body does not match path")]
    IdMismatch,
}

/// Thread-safe in-memory ship store
#[derive(Debug, Default)]
pub struct ShipStore {
    ships: RwLock<BTreeMap<String, Ship>>,
}

impl ShipStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding `ships`; later duplicates replace earlier ones
    pub fn with_ships(ships: impl IntoIterator<Item = Ship>) -> Self {
        let store = Self::new();
        store.replace_all(ships);
        store
    }

    /// Insert a new ship
    ///
    /// # Errors
    ///
    /// [`StoreError::AlreadyExists`] if the id is taken.
    pub fn create(&self, ship: Ship) -> Result<Ship, StoreError> {
        let mut ships = self.ships.write();
        if ships.contains_key(&ship.id) {
            return Err(StoreError::AlreadyExists);
        }
        ships.insert(ship.id.clone(), ship.clone());
        Ok(ship)
    }

    /// Fetch a ship by id
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] if absent.
    pub fn get(&self, id: &str) -> Result<Ship, StoreError> {
        self.ships.read().get(id).cloned().ok_or(StoreError::NotFound)
    }

    /// Replace the ship stored under `id`
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] if absent, [`StoreError::IdMismatch`] if
    /// `ship.id` differs from `id`.
    pub fn update(&self, id: &str, ship: Ship) -> Result<Ship, StoreError> {
        let mut ships = self.ships.write();
        let slot = ships.get_mut(id).ok_or(StoreError::NotFound)?;
        if ship.id != id {
            return Err(StoreError::IdMismatch);
        }
        *slot = ship.clone();
        Ok(ship)
    }

    /// Remove the ship stored under `id`
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] if absent.
    pub fn delete(&self, id: &str) -> Result<Ship, StoreError> {
        self.ships.write().remove(id).ok_or(StoreError::NotFound)
    }

    /// All ships matching `query`, ordered by id
    pub fn search(&self, query: &ShipQuery) -> Vec<Ship> {
        self.ships
            .read()
            .values()
            .filter(|ship| query.matches(ship))
            .cloned()
            .collect()
    }

    /// Insert or overwrite every ship in `ships`, returning how many were written
    pub fn replace_all(&self, ships: impl IntoIterator<Item = Ship>) -> usize {
        let mut store = self.ships.write();
        let mut written = 0;
        for ship in ships {
            store.insert(ship.id.clone(), ship);
            written += 1;
        }
        written
    }

    /// Number of stored ships
    pub fn len(&self) -> usize {
        self.ships.read().len()
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.ships.read().is_empty()
    }
}
