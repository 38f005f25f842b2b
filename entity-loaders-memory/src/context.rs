//! Unit of work over a [`MemoryStore`].

use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;

use entity_loaders_core::{
    Collection, Entity, EntityKey, EntityState, EntityType, KeySide,
    MetadataWorkspace, PersistenceContext, Reference, RelationDescriptor, RelationQuery,
};
use indexmap::IndexMap;
use serde_json::Value as JsonValue;
use smol_str::SmolStr;
use tracing::{debug, trace};

use crate::error::{MemoryError, MemoryResult};
use crate::query::{MemoryQuery, RowLookup};
use crate::store::{MemoryStore, key_text, row_key};

/// Tracking record for one entity.
#[derive(Debug, Clone)]
struct Entry {
    state: EntityState,
    /// Row to write on the next `save_changes`.
    pending: Option<JsonValue>,
    loaded: HashSet<&'static str>,
}

impl Entry {
    fn new(state: EntityState, pending: Option<JsonValue>) -> Self {
        Self {
            state,
            pending,
            loaded: HashSet::new(),
        }
    }
}

/// In-memory persistence context.
///
/// Tracks entity state by primary key and resolves relations through the
/// foreign keys registered in its metadata. Rows related through a load are
/// tracked as `Unchanged`, so they can be loaded from in turn.
///
/// The context is an identity map: any value carrying a tracked key is that
/// tracked entity. Loaded flags are reset whenever the context hands out or
/// takes in a new instance for a key (`find`, related rows, `attach`, `add`),
/// and on reload unless [`Entity::REFRESH_KEEPS_RELATIONS`] is set.
///
/// ```rust,ignore
/// let ctx = MemoryContext::new(store)
///     .with_entity(EntityType::of::<Author>().collection::<Post>("posts", ForeignKey::target("author_id")))
///     .with_entity(EntityType::of::<Post>().reference::<Author>("author", ForeignKey::source("author_id")));
///
/// let mut author = ctx.find::<Author>("1")?.expect("seeded");
/// ctx.loader(&mut author)?.load(Author::POSTS)?;
/// ```
pub struct MemoryContext {
    store: MemoryStore,
    metadata: MetadataWorkspace,
    entries: RefCell<IndexMap<EntityKey, Entry>>,
}

impl MemoryContext {
    /// Create a context over `store` with an empty model.
    pub fn new(store: MemoryStore) -> Self {
        Self {
            store,
            metadata: MetadataWorkspace::new(),
            entries: RefCell::new(IndexMap::new()),
        }
    }

    /// Register an entity type, builder style.
    pub fn with_entity(mut self, entity_type: EntityType) -> Self {
        self.register(entity_type);
        self
    }

    /// Register an entity type.
    pub fn register(&mut self, entity_type: EntityType) {
        debug!(entity = %entity_type.name, "registering entity type");
        self.metadata.register(entity_type);
    }

    /// The backing store.
    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    /// Number of tracked entities.
    pub fn tracked_count(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Read a row by key and start tracking it as `Unchanged`.
    pub fn find<E: Entity>(&self, key: impl Into<SmolStr>) -> MemoryResult<Option<E>> {
        self.entity_type::<E>()?;
        let key = EntityKey::of::<E>(key);
        let Some(row) = self.store.get(&key)? else {
            return Ok(None);
        };

        let entity = serde_json::from_value(row)?;
        self.track_instance(key);
        Ok(Some(entity))
    }

    /// Track `entity` as matching its stored row.
    pub fn attach<E: Entity>(&self, entity: &E) -> MemoryResult<EntityKey> {
        let (key, _) = self.key_of(entity)?;
        self.set_entry(&key, EntityState::Unchanged, None);
        self.clear_loaded(&key);
        Ok(key)
    }

    /// Track `entity` for insertion on the next save.
    pub fn add<E: Entity>(&self, entity: &E) -> MemoryResult<EntityKey> {
        let (key, row) = self.key_of(entity)?;
        self.set_entry(&key, EntityState::Added, Some(row));
        self.clear_loaded(&key);
        Ok(key)
    }

    /// Record `entity`'s current values as pending changes.
    ///
    /// An added entity stays `Added`; anything else becomes `Modified`.
    pub fn update<E: Entity>(&self, entity: &E) -> MemoryResult<EntityKey> {
        let (key, row) = self.key_of(entity)?;
        let state = match self.state_of(&key) {
            EntityState::Added => EntityState::Added,
            _ => EntityState::Modified,
        };
        self.set_entry(&key, state, Some(row));
        Ok(key)
    }

    /// Mark `entity` for deletion on the next save.
    ///
    /// Removing an added entity just stops tracking it.
    pub fn remove<E: Entity>(&self, entity: &E) -> MemoryResult<EntityKey> {
        let (key, _) = self.key_of(entity)?;
        if self.state_of(&key) == EntityState::Added {
            self.forget(&key);
        } else {
            self.set_entry(&key, EntityState::Deleted, None);
        }
        Ok(key)
    }

    /// Stop tracking `entity`.
    pub fn detach<E: Entity>(&self, entity: &E) -> MemoryResult<()> {
        let (key, _) = self.key_of(entity)?;
        self.forget(&key);
        Ok(())
    }

    /// Write pending inserts, updates and deletes to the store.
    ///
    /// Added and modified entities become `Unchanged`; deleted ones are no
    /// longer tracked. Returns the number of rows written.
    ///
    /// Writes run in tracking order and stop at the first failure. Writes
    /// that already reached the store stay committed and their entries are
    /// settled; the failed entry and everything after it keep their pending
    /// changes, so a later save retries them.
    pub fn save_changes(&self) -> MemoryResult<usize> {
        let mut entries = self.entries.borrow_mut();
        let mut written = 0;
        let mut deleted = Vec::new();
        let mut failure = None;

        for (key, entry) in entries.iter_mut() {
            match self.flush(key, entry) {
                Ok(false) => {}
                Ok(true) => {
                    if entry.state == EntityState::Deleted {
                        deleted.push(key.clone());
                    } else {
                        entry.state = EntityState::Unchanged;
                        entry.pending = None;
                    }
                    written += 1;
                }
                Err(err) => {
                    failure = Some(err);
                    break;
                }
            }
        }

        for key in &deleted {
            entries.shift_remove(key);
        }

        if let Some(err) = failure {
            debug!(written, error = %err, "save stopped at a failed write");
            return Err(err);
        }
        debug!(written, "saved changes");
        Ok(written)
    }

    /// Write one entry's pending change. Returns whether a row was written.
    fn flush(&self, key: &EntityKey, entry: &Entry) -> MemoryResult<bool> {
        match entry.state {
            EntityState::Added | EntityState::Modified => {
                let row = entry
                    .pending
                    .clone()
                    .ok_or_else(|| MemoryError::NotFound(key.clone()))?;
                if entry.state == EntityState::Added {
                    self.store.insert(key, row)?;
                } else {
                    self.store.update(key, row)?;
                }
                Ok(true)
            }
            EntityState::Deleted => {
                self.store.remove(key)?;
                Ok(true)
            }
            EntityState::Unchanged | EntityState::Detached => Ok(false),
        }
    }

    fn entity_type<E: Entity>(&self) -> MemoryResult<&EntityType> {
        self.metadata
            .entity_type::<E>()
            .ok_or_else(|| MemoryError::Unmapped(SmolStr::new_static(E::ENTITY_NAME)))
    }

    fn key_of<E: Entity>(&self, entity: &E) -> MemoryResult<(EntityKey, JsonValue)> {
        self.entity_type::<E>()?;
        let row = serde_json::to_value(entity)?;
        let key = row_key::<E>(&row)?;
        Ok((key, row))
    }

    fn state_of(&self, key: &EntityKey) -> EntityState {
        self.entries
            .borrow()
            .get(key)
            .map(|entry| entry.state)
            .unwrap_or_default()
    }

    fn set_entry(&self, key: &EntityKey, state: EntityState, pending: Option<JsonValue>) {
        trace!(key = %key, state = %state, "tracking entity");
        let mut entries = self.entries.borrow_mut();
        match entries.get_mut(key) {
            Some(entry) => {
                entry.state = state;
                entry.pending = pending;
            }
            None => {
                entries.insert(key.clone(), Entry::new(state, pending));
            }
        }
    }

    /// Track a newly handed-out instance of `key`.
    ///
    /// A known key keeps its state, but its loaded flags belonged to the
    /// previous instance.
    fn track_instance(&self, key: EntityKey) {
        let mut entries = self.entries.borrow_mut();
        match entries.get_mut(&key) {
            Some(entry) => entry.loaded.clear(),
            None => {
                entries.insert(key, Entry::new(EntityState::Unchanged, None));
            }
        }
    }

    fn clear_loaded(&self, key: &EntityKey) {
        if let Some(entry) = self.entries.borrow_mut().get_mut(key) {
            entry.loaded.clear();
        }
    }

    fn forget(&self, key: &EntityKey) {
        trace!(key = %key, "detaching entity");
        self.entries.borrow_mut().shift_remove(key);
    }

    fn is_loaded<E: Entity>(&self, entity: &E, relation: RelationDescriptor) -> bool {
        let Ok((key, _)) = self.key_of(entity) else {
            return false;
        };
        self.entries
            .borrow()
            .get(&key)
            .is_some_and(|entry| entry.loaded.contains(relation.name))
    }

    fn mark_loaded<E: Entity>(&self, entity: &E, relation: RelationDescriptor) -> MemoryResult<()> {
        let (key, _) = self.key_of(entity)?;
        self.entries
            .borrow_mut()
            .entry(key)
            .or_insert_with(|| Entry::new(EntityState::Unchanged, None))
            .loaded
            .insert(relation.name);
        Ok(())
    }

    /// Resolve a navigation of `entity` to the rows it refers to.
    fn lookup<E: Entity, R: Entity>(
        &self,
        entity: &E,
        relation: RelationDescriptor,
    ) -> MemoryResult<RowLookup> {
        let navigation = self
            .entity_type::<E>()?
            .navigation_property(relation.name)
            .filter(|navigation| {
                navigation.cardinality == relation.cardinality && navigation.target == R::full_name()
            })
            .ok_or_else(|| MemoryError::unknown_relation(E::ENTITY_NAME, relation.name))?;
        let row = serde_json::to_value(entity)?;
        let column = &navigation.foreign_key.column;

        Ok(match navigation.foreign_key.side {
            KeySide::Source => match row.get(column.as_str()).and_then(key_text) {
                Some(value) => RowLookup::Key(EntityKey::new(navigation.target.clone(), value)),
                None => RowLookup::Nothing,
            },
            KeySide::Target => RowLookup::Column {
                entity: navigation.target.clone(),
                column: column.clone(),
                value: SmolStr::new(row_key::<E>(&row)?.key()),
            },
        })
    }

    /// Decode related rows and track them as `Unchanged`.
    fn materialize<R: Entity>(&self, rows: Vec<JsonValue>) -> MemoryResult<Vec<R>> {
        let mut related = Vec::with_capacity(rows.len());
        for row in rows {
            let key = row_key::<R>(&row)?;
            related.push(serde_json::from_value(row)?);
            self.track_instance(key);
        }
        Ok(related)
    }
}

impl PersistenceContext for MemoryContext {
    type Error = MemoryError;
    type Query<R: Entity> = MemoryQuery<R>;

    fn metadata(&self) -> &MetadataWorkspace {
        &self.metadata
    }

    fn state<E: Entity>(&self, entity: &E) -> EntityState {
        match self.key_of(entity) {
            Ok((key, _)) => self.state_of(&key),
            Err(_) => EntityState::Detached,
        }
    }

    fn reload<E: Entity>(&self, entity: &mut E) -> MemoryResult<()> {
        let (key, _) = self.key_of(entity)?;
        let row = self
            .store
            .get(&key)?
            .ok_or_else(|| MemoryError::NotFound(key.clone()))?;
        entity.refresh(serde_json::from_value(row)?);
        self.set_entry(&key, EntityState::Unchanged, None);
        if !E::REFRESH_KEEPS_RELATIONS {
            self.clear_loaded(&key);
        }
        Ok(())
    }

    fn is_reference_loaded<E: Entity, R: Entity>(
        &self,
        entity: &E,
        relation: Reference<E, R>,
    ) -> bool {
        self.is_loaded(entity, relation.descriptor())
    }

    fn load_reference<E: Entity, R: Entity>(
        &self,
        entity: &mut E,
        relation: Reference<E, R>,
    ) -> MemoryResult<()> {
        let rows = self
            .lookup::<E, R>(entity, relation.descriptor())?
            .run(&self.store)?;
        let related = self.materialize::<R>(rows)?.into_iter().next();
        relation.set(entity, related);
        self.mark_loaded(entity, relation.descriptor())
    }

    fn query_reference<E: Entity, R: Entity>(
        &self,
        entity: &E,
        relation: Reference<E, R>,
    ) -> MemoryResult<MemoryQuery<R>> {
        let lookup = self.lookup::<E, R>(entity, relation.descriptor())?;
        Ok(MemoryQuery::new(self.store.clone(), lookup).take(1))
    }

    fn is_collection_loaded<E: Entity, R: Entity>(
        &self,
        entity: &E,
        relation: Collection<E, R>,
    ) -> bool {
        self.is_loaded(entity, relation.descriptor())
    }

    fn load_collection<E: Entity, R: Entity>(
        &self,
        entity: &mut E,
        relation: Collection<E, R>,
    ) -> MemoryResult<()> {
        let rows = self
            .lookup::<E, R>(entity, relation.descriptor())?
            .run(&self.store)?;
        let related = self.materialize::<R>(rows)?;
        relation.set(entity, related);
        self.mark_loaded(entity, relation.descriptor())
    }

    fn query_collection<E: Entity, R: Entity>(
        &self,
        entity: &E,
        relation: Collection<E, R>,
    ) -> MemoryResult<MemoryQuery<R>> {
        let lookup = self.lookup::<E, R>(entity, relation.descriptor())?;
        Ok(MemoryQuery::new(self.store.clone(), lookup))
    }
}

impl fmt::Debug for MemoryContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryContext")
            .field("entity_types", &self.metadata.len())
            .field("tracked", &self.tracked_count())
            .field("store", &self.store)
            .finish()
    }
}
