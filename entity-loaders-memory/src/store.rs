//! Shared in-memory row store.
//!
//! Rows are JSON objects grouped into one table per entity type and keyed by
//! canonical primary-key text. Every public read or write is one round-trip
//! and is counted in [`StoreStats`].

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use entity_loaders_core::{Entity, EntityKey};
use indexmap::IndexMap;
use parking_lot::RwLock;
use serde_json::Value as JsonValue;
use smol_str::SmolStr;
use tracing::trace;

use crate::error::{MemoryError, MemoryResult};

type Table = IndexMap<SmolStr, JsonValue>;

/// Round-trip counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    /// Completed reads.
    pub reads: u64,
    /// Completed writes.
    pub writes: u64,
}

impl StoreStats {
    /// Total round-trips.
    pub fn total(&self) -> u64 {
        self.reads + self.writes
    }
}

#[derive(Default)]
struct Shared {
    tables: RwLock<IndexMap<SmolStr, Table>>,
    offline: AtomicBool,
    reads: AtomicU64,
    writes: AtomicU64,
}

/// Cloneable handle to a shared row store.
///
/// Clones see the same rows, so several contexts can work against one store.
#[derive(Clone, Default)]
pub struct MemoryStore {
    shared: Arc<Shared>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a row.
    pub fn insert(&self, key: &EntityKey, row: JsonValue) -> MemoryResult<()> {
        self.begin_write()?;
        trace!(key = %key, "insert row");
        self.shared
            .tables
            .write()
            .entry(SmolStr::new(key.entity()))
            .or_default()
            .insert(SmolStr::new(key.key()), row);
        Ok(())
    }

    /// Replace an existing row.
    pub fn update(&self, key: &EntityKey, row: JsonValue) -> MemoryResult<()> {
        self.begin_write()?;
        trace!(key = %key, "update row");
        let mut tables = self.shared.tables.write();
        let slot = tables
            .get_mut(key.entity())
            .and_then(|table| table.get_mut(key.key()))
            .ok_or_else(|| MemoryError::NotFound(key.clone()))?;
        *slot = row;
        Ok(())
    }

    /// Remove a row, returning it if it existed.
    pub fn remove(&self, key: &EntityKey) -> MemoryResult<Option<JsonValue>> {
        self.begin_write()?;
        trace!(key = %key, "remove row");
        Ok(self
            .shared
            .tables
            .write()
            .get_mut(key.entity())
            .and_then(|table| table.shift_remove(key.key())))
    }

    /// Read a row.
    pub fn get(&self, key: &EntityKey) -> MemoryResult<Option<JsonValue>> {
        self.begin_read()?;
        trace!(key = %key, "read row");
        Ok(self
            .shared
            .tables
            .read()
            .get(key.entity())
            .and_then(|table| table.get(key.key()))
            .cloned())
    }

    /// Read every row of `entity` whose `column` holds `value`.
    ///
    /// Column values are compared by their canonical key text.
    pub fn find_by(&self, entity: &str, column: &str, value: &str) -> MemoryResult<Vec<JsonValue>> {
        self.begin_read()?;
        trace!(entity, column, value, "scan rows");
        Ok(self
            .shared
            .tables
            .read()
            .get(entity)
            .map(|table| {
                table
                    .values()
                    .filter(|row| {
                        row.get(column)
                            .and_then(key_text)
                            .is_some_and(|text| text == value)
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    /// Serialize `entity` and insert or replace its row.
    pub fn put<E: Entity>(&self, entity: &E) -> MemoryResult<EntityKey> {
        let row = serde_json::to_value(entity)?;
        let key = row_key::<E>(&row)?;
        self.insert(&key, row)?;
        Ok(key)
    }

    /// Total number of rows across all tables.
    pub fn len(&self) -> usize {
        self.shared.tables.read().values().map(Table::len).sum()
    }

    /// Whether the store holds no rows.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of rows stored for entity type `E`.
    pub fn count<E: Entity>(&self) -> usize {
        self.shared
            .tables
            .read()
            .get(E::full_name())
            .map_or(0, Table::len)
    }

    /// Take the store offline (or back online). Offline round-trips fail.
    pub fn set_offline(&self, offline: bool) {
        self.shared.offline.store(offline, Ordering::SeqCst);
    }

    /// Whether the store is offline.
    pub fn is_offline(&self) -> bool {
        self.shared.offline.load(Ordering::SeqCst)
    }

    /// Round-trips completed so far.
    pub fn stats(&self) -> StoreStats {
        StoreStats {
            reads: self.shared.reads.load(Ordering::SeqCst),
            writes: self.shared.writes.load(Ordering::SeqCst),
        }
    }

    /// Zero the round-trip counters.
    pub fn reset_stats(&self) {
        self.shared.reads.store(0, Ordering::SeqCst);
        self.shared.writes.store(0, Ordering::SeqCst);
    }

    fn begin_read(&self) -> MemoryResult<()> {
        self.ensure_online()?;
        self.shared.reads.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn begin_write(&self) -> MemoryResult<()> {
        self.ensure_online()?;
        self.shared.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn ensure_online(&self) -> MemoryResult<()> {
        if self.is_offline() {
            return Err(MemoryError::Offline);
        }
        Ok(())
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("rows", &self.len())
            .field("offline", &self.is_offline())
            .field("stats", &self.stats())
            .finish()
    }
}

/// Canonical key text of a scalar JSON value.
///
/// Strings are used as-is, numbers and booleans in their JSON rendering.
/// `null`, arrays and objects have no key text.
pub fn key_text(value: &JsonValue) -> Option<SmolStr> {
    match value {
        JsonValue::String(text) => Some(SmolStr::new(text)),
        JsonValue::Number(number) => Some(SmolStr::new(number.to_string())),
        JsonValue::Bool(flag) => Some(SmolStr::new(if *flag { "true" } else { "false" })),
        JsonValue::Null | JsonValue::Array(_) | JsonValue::Object(_) => None,
    }
}

/// Key of a serialized row of entity type `E`.
pub fn row_key<E: Entity>(row: &JsonValue) -> MemoryResult<EntityKey> {
    let value = row.get(E::PRIMARY_KEY).ok_or_else(|| {
        MemoryError::invalid_key(E::ENTITY_NAME, format!("missing field '{}'", E::PRIMARY_KEY))
    })?;
    let text = key_text(value).ok_or_else(|| {
        MemoryError::invalid_key(E::ENTITY_NAME, format!("field '{}' is not a scalar", E::PRIMARY_KEY))
    })?;
    Ok(EntityKey::of::<E>(text))
}
