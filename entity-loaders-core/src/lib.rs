//! # entity-loaders-core
//!
//! Uniform loaders over a persistence context's lazy-loading primitives.
//!
//! This crate provides:
//! - The [`PersistenceContext`] contract a unit of work implements
//! - Typed relation descriptors ([`Reference`], [`Collection`])
//! - [`EntityLoader`] and [`EntityCollectionLoader`] with the persisted-state guard
//! - Deferred [`LoadQuery`] handles over relations
//! - Model metadata, errors, configuration and logging
//!
//! ## Loading relations
//!
//! ```rust,ignore
//! use entity_loaders_core::{Loader, LoaderExt, RelationQuery};
//!
//! let mut loader = ctx.loader(&mut order)?;
//! loader.reload()?;
//! loader.load(Order::CUSTOMER)?;
//!
//! let expensive = loader
//!     .load_query(Order::LINES)?
//!     .filter(|line: &Line| line.price > 100)
//!     .fetch()?;
//! ```
//!
//! Entities that are not `Unchanged` or `Modified` are never handed to the
//! context: `reload` and `load` return `Ok(())` without doing anything and
//! `load_query` returns an empty query.
//!
//! ## Relations
//!
//! ```rust
//! use entity_loaders_core::{collection, reference, Collection, Reference};
//!
//! struct Team { lead: Option<String>, members: Vec<String> }
//!
//! const LEAD: Reference<Team, String> = reference!(Team, lead: String);
//! const MEMBERS: Collection<Team, String> = collection!(Team, members: String);
//!
//! assert_eq!(LEAD.name(), "lead");
//! assert!(MEMBERS.descriptor().cardinality.is_multi());
//! ```

pub mod config;
pub mod context;
pub mod entity;
pub mod error;
pub mod loader;
pub mod logging;
pub mod metadata;
pub mod query;
pub mod relation;

#[cfg(test)]
mod mock;

pub use config::{FailurePolicy, LoaderConfig};
pub use context::{PersistenceContext, RelationQuery};
pub use entity::{Entity, EntityKey, EntityState};
pub use error::{ErrorCode, ErrorContext, LoaderError, LoaderResult};
pub use loader::{
    EntityCollectionLoader, EntityLoader, Loader, LoaderExt, RelationLoadQuery,
    get_collection_loader, get_collection_loader_with, get_loader, get_loader_with,
};
pub use metadata::{
    Cardinality, DataSpace, EntityType, ForeignKey, KeySide, MetadataWorkspace,
    NavigationProperty,
};
pub use query::{LoadQuery, QueryStep};
pub use relation::{Collection, Reference, Relation, RelationDescriptor};

// Re-export logging utilities
pub use logging::{get_log_format, get_log_level, init as init_logging, init_with_level, is_debug_enabled};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::config::{FailurePolicy, LoaderConfig};
    pub use crate::context::{PersistenceContext, RelationQuery};
    pub use crate::entity::{Entity, EntityState};
    pub use crate::error::{LoaderError, LoaderResult};
    pub use crate::loader::{
        EntityCollectionLoader, EntityLoader, Loader, LoaderExt, get_collection_loader,
        get_loader,
    };
    pub use crate::query::LoadQuery;
    pub use crate::relation::{Collection, Reference};
    pub use crate::{collection, reference};
}
