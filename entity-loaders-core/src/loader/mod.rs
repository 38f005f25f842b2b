//! Loaders bound to one entity or a set of entities.
//!
//! Every loader operation first asks the context for the entity's tracked
//! state. Only entities that have a stored counterpart (`Unchanged` or
//! `Modified`) are delegated to the context; for everything else `reload`
//! and `load` do nothing and `load_query` returns an empty query. That guard
//! is the only decision a loader makes. Context errors are returned as-is.
//!
//! ## Example
//!
//! ```rust,ignore
//! use entity_loaders::prelude::*;
//!
//! let mut post = ctx.find::<Post>(1)?;
//! let mut loader = ctx.loader(&mut post)?;
//!
//! loader.load(Post::AUTHOR)?;       // one store round-trip
//! loader.load(Post::AUTHOR)?;       // already loaded, nothing happens
//!
//! let recent = loader
//!     .load_query(Post::COMMENTS)?
//!     .filter(|c: &Comment| c.score > 10)
//!     .take(5)
//!     .fetch()?;
//! ```

mod collection;
mod entity;
mod factory;

pub use collection::EntityCollectionLoader;
pub use entity::EntityLoader;
pub use factory::{
    LoaderExt, get_collection_loader, get_collection_loader_with, get_loader, get_loader_with,
};

use crate::context::PersistenceContext;
use crate::entity::Entity;
use crate::query::LoadQuery;
use crate::relation::Relation;

/// The query handle `load_query` returns for relation target `R`.
pub type RelationLoadQuery<C, R> = LoadQuery<R, <C as PersistenceContext>::Query<R>>;

/// Operations shared by single-entity and collection loaders.
pub trait Loader<C: PersistenceContext, E: Entity> {
    /// Refresh the bound entities' scalar state from the store.
    fn reload(&mut self) -> Result<(), C::Error>;

    /// Load a relation unless it is already loaded.
    fn load<Rel: Relation<E>>(&mut self, relation: Rel) -> Result<(), C::Error>;

    /// Build a deferred query over a relation.
    fn load_query<Rel: Relation<E>>(
        &self,
        relation: Rel,
    ) -> Result<RelationLoadQuery<C, Rel::Target>, C::Error>;
}
