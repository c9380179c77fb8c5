//! Saving and loading the world's economic state.
//!
//! Three slices persist: resource balances, population state, and the coin
//! balance. Node topology, bindings, and timers are not part of the record;
//! whoever owns the world rebuilds those.
//!
//! The record is a single JSON document stored under [`STATE_KEY`]. Field
//! names are camelCase and amounts are plain JSON numbers, which keeps the
//! record readable and compatible with saves written by older builds.
//! Loading is a total operation: a missing record starts fresh and an
//! unreadable one falls back to zero-value defaults instead of failing the
//! caller.

use std::collections::{BTreeMap, HashMap};
use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::fixed::{checked_f64_to_fixed64, fixed64_to_f64, Fixed64};
use crate::ledger::ResourceLedger;
use crate::population::PopulationState;
use crate::world::World;

/// Storage key for the persisted state record.
pub const STATE_KEY: &str = "idallicstate";

// ---------------------------------------------------------------------------
// Stores
// ---------------------------------------------------------------------------

/// Errors raised by a backing store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Durable string-keyed storage for persisted records.
pub trait StateStore {
    /// Read the value under `key`, or `None` when nothing was ever stored.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn put(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// In-memory store for tests and throwaway runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn put(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// One `<key>.json` file per key under a base directory.
#[derive(Debug)]
pub struct DirStore {
    base: PathBuf,
}

impl DirStore {
    /// Open a store rooted at `base`, creating the directory if needed.
    pub fn new(base: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let base = base.into();
        std::fs::create_dir_all(&base)?;
        Ok(Self { base })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.base.join(format!("{key}.json"))
    }
}

impl StateStore for DirStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn put(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        std::fs::write(self.path_for(key), value)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Record format
// ---------------------------------------------------------------------------

/// The persisted record. Field names are part of the stored-format contract;
/// do not rename them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedState {
    /// Resource name to balance. Zero balances are omitted on save.
    pub resources: BTreeMap<String, f64>,
    pub population_state: SavedPopulation,
    pub coins: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedPopulation {
    pub total: f64,
    pub capacity: f64,
    pub food_per_tick: f64,
    pub water_per_tick: f64,
}

// ---------------------------------------------------------------------------
// Save / load
// ---------------------------------------------------------------------------

/// Errors writing state out.
#[derive(Debug, thiserror::Error)]
pub enum StateSaveError {
    #[error("failed to encode state: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("failed to write state: {0}")]
    Store(#[from] StoreError),
}

/// Reasons a stored record could not be applied.
#[derive(Debug, thiserror::Error)]
pub enum StateLoadError {
    #[error("failed to read state: {0}")]
    Store(#[from] StoreError),
    #[error("failed to parse state record: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("state record references unknown resource '{0}'")]
    UnknownResource(String),
    #[error("state record value for '{field}' is not representable")]
    OutOfRange { field: String },
}

/// What [`load_state`] did.
#[derive(Debug)]
pub enum LoadOutcome {
    /// A valid record existed and was applied.
    Restored,
    /// No record exists; the world keeps its current (default) state.
    Fresh,
    /// The record was unreadable; the world was reset to zero-value defaults.
    Fallback(StateLoadError),
}

/// Extract the persisted slices from a world.
pub fn snapshot(world: &World) -> SavedState {
    let catalog = world.catalog();
    let mut resources = BTreeMap::new();
    for (id, amount) in world.resources().iter() {
        if amount != Fixed64::from_num(0)
            && let Some(name) = catalog.resource_name(id)
        {
            resources.insert(name.to_string(), fixed64_to_f64(amount));
        }
    }

    let population = world.population();
    SavedState {
        resources,
        population_state: SavedPopulation {
            total: fixed64_to_f64(population.total),
            capacity: fixed64_to_f64(population.capacity),
            food_per_tick: fixed64_to_f64(population.food_per_tick),
            water_per_tick: fixed64_to_f64(population.water_per_tick),
        },
        coins: fixed64_to_f64(world.coins()),
    }
}

/// Serialize the world's persisted slices and write them under [`STATE_KEY`].
pub fn save_state(world: &World, store: &mut dyn StateStore) -> Result<(), StateSaveError> {
    let record = serde_json::to_string(&snapshot(world))?;
    store.put(STATE_KEY, &record)?;
    tracing::debug!(bytes = record.len(), "state saved");
    Ok(())
}

/// Load persisted state into `world`. Never fails: problems degrade to
/// [`LoadOutcome::Fallback`] and a world reset to zero-value defaults.
pub fn load_state(world: &mut World, store: &dyn StateStore) -> LoadOutcome {
    let raw = match store.get(STATE_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return LoadOutcome::Fresh,
        Err(err) => return fall_back(world, err.into()),
    };

    let record: SavedState = match serde_json::from_str(&raw) {
        Ok(record) => record,
        Err(err) => return fall_back(world, err.into()),
    };

    match apply(world, &record) {
        Ok(()) => {
            tracing::debug!("state restored");
            LoadOutcome::Restored
        }
        Err(err) => fall_back(world, err),
    }
}

fn fall_back(world: &mut World, err: StateLoadError) -> LoadOutcome {
    tracing::warn!(%err, "state load failed; starting from zero state");
    world.reset_to_defaults();
    LoadOutcome::Fallback(err)
}

/// Validate and apply a record. Builds the restored slices completely before
/// touching the world, so a bad record leaves no partial state behind.
fn apply(world: &mut World, record: &SavedState) -> Result<(), StateLoadError> {
    let catalog = world.catalog();

    let mut ledger = ResourceLedger::new(catalog.resource_count());
    for (name, &value) in &record.resources {
        let id = catalog
            .resource_id(name)
            .ok_or_else(|| StateLoadError::UnknownResource(name.clone()))?;
        ledger.set(id, checked(value, name)?);
    }

    let saved = &record.population_state;
    let population = PopulationState {
        total: checked(saved.total, "populationState.total")?,
        capacity: checked(saved.capacity, "populationState.capacity")?,
        food_per_tick: checked(saved.food_per_tick, "populationState.foodPerTick")?,
        water_per_tick: checked(saved.water_per_tick, "populationState.waterPerTick")?,
    };
    let coins = checked(record.coins, "coins")?;

    world.restore(ledger, population, coins);
    Ok(())
}

fn checked(value: f64, field: &str) -> Result<Fixed64, StateLoadError> {
    checked_f64_to_fixed64(value).ok_or_else(|| StateLoadError::OutOfRange {
        field: field.to_string(),
    })
}

// ===========================================================================
// Tests
// ===========================================================================
