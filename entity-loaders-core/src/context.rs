//! The persistence-context contract loaders delegate to.
//!
//! A context is a unit of work over a backing store. It tracks entity state,
//! owns the model metadata, and performs every store round-trip. Loaders never
//! execute queries themselves; they only decide whether to call one of these
//! primitives.
//!
//! Contexts are synchronous and meant for sequential use: one context per
//! logical operation, discarded afterwards. All methods take `&self`, so
//! implementations keep their tracking state behind interior mutability.

use crate::entity::{Entity, EntityState};
use crate::metadata::MetadataWorkspace;
use crate::relation::{Collection, Reference};

/// A deferred, re-enumerable query over related entities.
///
/// Building and composing a query never touches the store; only the
/// `fetch`-family methods execute it, and each call executes it again.
pub trait RelationQuery<R>: Sized {
    /// Error surfaced on execution.
    type Error;

    /// Keep only rows matching `predicate`.
    fn filter<F>(self, predicate: F) -> Self
    where
        F: Fn(&R) -> bool + 'static;

    /// Skip the first `n` rows.
    fn skip(self, n: usize) -> Self;

    /// Return at most `n` rows.
    fn take(self, n: usize) -> Self;

    /// Execute the query.
    fn fetch(&self) -> Result<Vec<R>, Self::Error>;

    /// Execute the query and count the rows.
    fn count(&self) -> Result<usize, Self::Error> {
        self.fetch().map(|rows| rows.len())
    }

    /// Execute the query and return the first row.
    fn first(&self) -> Result<Option<R>, Self::Error> {
        Ok(self.fetch()?.into_iter().next())
    }

    /// Execute the query and check for zero rows.
    fn is_empty(&self) -> Result<bool, Self::Error> {
        self.count().map(|count| count == 0)
    }
}

/// A unit of work that tracks entities and loads their relations.
pub trait PersistenceContext {
    /// Error surfaced by store round-trips. Loaders pass it through unchanged.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Deferred query over entities of type `R`.
    type Query<R: Entity>: RelationQuery<R, Error = Self::Error>;

    /// The model metadata.
    fn metadata(&self) -> &MetadataWorkspace;

    /// Current tracked state of `entity`.
    fn state<E: Entity>(&self, entity: &E) -> EntityState;

    /// Overwrite `entity`'s scalar state with the stored row.
    fn reload<E: Entity>(&self, entity: &mut E) -> Result<(), Self::Error>;

    /// Whether the single-valued navigation has been loaded for `entity`.
    fn is_reference_loaded<E: Entity, R: Entity>(&self, entity: &E, relation: Reference<E, R>)
    -> bool;

    /// Load the single-valued navigation into `entity`.
    fn load_reference<E: Entity, R: Entity>(
        &self,
        entity: &mut E,
        relation: Reference<E, R>,
    ) -> Result<(), Self::Error>;

    /// Build a deferred query over the single-valued navigation.
    fn query_reference<E: Entity, R: Entity>(
        &self,
        entity: &E,
        relation: Reference<E, R>,
    ) -> Result<Self::Query<R>, Self::Error>;

    /// Whether the collection-valued navigation has been loaded for `entity`.
    fn is_collection_loaded<E: Entity, R: Entity>(
        &self,
        entity: &E,
        relation: Collection<E, R>,
    ) -> bool;

    /// Load the collection-valued navigation into `entity`.
    fn load_collection<E: Entity, R: Entity>(
        &self,
        entity: &mut E,
        relation: Collection<E, R>,
    ) -> Result<(), Self::Error>;

    /// Build a deferred query over the collection-valued navigation.
    fn query_collection<E: Entity, R: Entity>(
        &self,
        entity: &E,
        relation: Collection<E, R>,
    ) -> Result<Self::Query<R>, Self::Error>;
}
