//! # entity-loaders
//!
//! Type-safe lazy-loading helpers for entities tracked by a persistence
//! context.
//!
//! entity-loaders provides:
//! - One loader interface for a single entity or a set of entities
//! - `reload`, `load` and `load_query` over typed relation descriptors
//! - A persisted-state guard: nothing is loaded for entities without a stored row
//! - A reference in-memory context (`memory` feature, on by default)
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use entity_loaders::prelude::*;
//! use entity_loaders::memory::{MemoryContext, MemoryStore};
//!
//! #[derive(Debug, Serialize, Deserialize)]
//! pub struct Post {
//!     pub id: i64,
//!     pub author_id: i64,
//!     #[serde(skip)]
//!     pub author: Option<User>,
//!     #[serde(skip)]
//!     pub comments: Vec<Comment>,
//! }
//!
//! impl Post {
//!     pub const AUTHOR: Reference<Post, User> = reference!(Post, author: User);
//!     pub const COMMENTS: Collection<Post, Comment> = collection!(Post, comments: Comment);
//! }
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let ctx = MemoryContext::new(MemoryStore::new()).with_entity(post_type());
//!     let mut post = ctx.find::<Post>("1")?.expect("seeded");
//!
//!     let mut loader = ctx.loader(&mut post)?;
//!     loader.load(Post::AUTHOR)?;
//!
//!     let flagged = loader
//!         .load_query(Post::COMMENTS)?
//!         .filter(|c: &Comment| c.flagged)
//!         .fetch()?;
//!
//!     Ok(())
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub use entity_loaders_core::*;

/// Reference in-memory persistence context.
#[cfg(feature = "memory")]
#[cfg_attr(docsrs, doc(cfg(feature = "memory")))]
pub mod memory {
    pub use entity_loaders_memory::*;
}

/// Prelude module for convenient imports.
pub mod prelude {
    pub use entity_loaders_core::prelude::*;

    #[cfg(feature = "memory")]
    pub use entity_loaders_memory::{MemoryContext, MemoryError, MemoryStore};
}
