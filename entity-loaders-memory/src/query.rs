//! Deferred relation queries over a [`MemoryStore`].

use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

use entity_loaders_core::{Entity, EntityKey, QueryStep, RelationQuery};
use serde_json::Value as JsonValue;
use smol_str::SmolStr;

use crate::error::{MemoryError, MemoryResult};
use crate::store::MemoryStore;

/// Where a relation's rows come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowLookup {
    /// Nothing to read, for example a null foreign key.
    Nothing,
    /// The single row with this key.
    Key(EntityKey),
    /// Every row of `entity` whose `column` holds `value`.
    Column {
        /// Entity full name.
        entity: SmolStr,
        /// Foreign key column.
        column: SmolStr,
        /// Canonical key text to match.
        value: SmolStr,
    },
}

impl RowLookup {
    /// Run the lookup as one store round-trip.
    ///
    /// [`RowLookup::Nothing`] returns no rows without touching the store.
    pub fn run(&self, store: &MemoryStore) -> MemoryResult<Vec<JsonValue>> {
        match self {
            Self::Nothing => Ok(Vec::new()),
            Self::Key(key) => Ok(store.get(key)?.into_iter().collect()),
            Self::Column {
                entity,
                column,
                value,
            } => store.find_by(entity, column, value),
        }
    }
}

/// Query over related rows, executed on every `fetch`.
pub struct MemoryQuery<R> {
    store: MemoryStore,
    lookup: RowLookup,
    steps: Vec<QueryStep<R>>,
    _row: PhantomData<fn() -> R>,
}

impl<R: Entity> MemoryQuery<R> {
    /// Create a query over the rows `lookup` selects.
    pub fn new(store: MemoryStore, lookup: RowLookup) -> Self {
        Self {
            store,
            lookup,
            steps: Vec::new(),
            _row: PhantomData,
        }
    }

    /// The row lookup this query runs.
    pub fn lookup(&self) -> &RowLookup {
        &self.lookup
    }
}

impl<R: Entity> RelationQuery<R> for MemoryQuery<R> {
    type Error = MemoryError;

    fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&R) -> bool + 'static,
    {
        self.steps.push(QueryStep::Filter(Rc::new(predicate)));
        self
    }

    fn skip(mut self, n: usize) -> Self {
        self.steps.push(QueryStep::Skip(n));
        self
    }

    fn take(mut self, n: usize) -> Self {
        self.steps.push(QueryStep::Take(n));
        self
    }

    fn fetch(&self) -> MemoryResult<Vec<R>> {
        let rows = self
            .lookup
            .run(&self.store)?
            .into_iter()
            .map(serde_json::from_value::<R>)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(QueryStep::apply_all(&self.steps, rows))
    }
}

impl<R> fmt::Debug for MemoryQuery<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryQuery")
            .field("lookup", &self.lookup)
            .field("steps", &self.steps)
            .finish()
    }
}
