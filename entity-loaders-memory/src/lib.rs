//! In-memory persistence context for entity-loaders.
//!
//! This crate provides a reference [`PersistenceContext`] implementation
//! backed by a shared JSON row store. It is meant for tests and examples: it
//! tracks entity state, resolves relations through registered foreign keys,
//! and counts every store round-trip.
//!
//! # Features
//!
//! - Shared, cloneable [`MemoryStore`] with round-trip counters
//! - Unit-of-work tracking (`attach`, `add`, `update`, `remove`, `save_changes`)
//! - Deferred, re-enumerable relation queries
//! - An offline switch for exercising error paths
//!
//! # Example
//!
//! ```rust,ignore
//! use entity_loaders_core::prelude::*;
//! use entity_loaders_memory::{MemoryContext, MemoryStore};
//!
//! let store = MemoryStore::new();
//! store.put(&Author { id: 1, name: "Ada".into(), posts: vec![] })?;
//!
//! let ctx = MemoryContext::new(store.clone()).with_entity(author_type());
//! let mut author = ctx.find::<Author>("1")?.expect("seeded");
//!
//! ctx.loader(&mut author)?.load(Author::POSTS)?;
//! assert_eq!(store.stats().reads, 2);
//! ```
//!
//! [`PersistenceContext`]: entity_loaders_core::PersistenceContext

pub mod context;
pub mod error;
pub mod query;
pub mod store;

pub use context::MemoryContext;
pub use error::{MemoryError, MemoryResult};
pub use query::{MemoryQuery, RowLookup};
pub use store::{MemoryStore, StoreStats};
