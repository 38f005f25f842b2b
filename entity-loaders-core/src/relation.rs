//! Typed relation descriptors.
//!
//! A relation is named by a field on the owning entity together with its
//! shape. [`Reference`] describes a single-valued navigation stored as
//! `Option<R>`, [`Collection`] a collection-valued navigation stored as
//! `Vec<R>`. Both implement [`Relation`], which is how loaders dispatch to
//! the matching context primitive without caring about the shape.
//!
//! ```rust,ignore
//! impl Post {
//!     pub const AUTHOR: Reference<Post, User> = reference!(Post, author: User);
//!     pub const COMMENTS: Collection<Post, Comment> = collection!(Post, comments: Comment);
//! }
//!
//! ctx.loader(&mut post)?.load(Post::AUTHOR)?;
//! ```

use std::fmt;

use crate::context::PersistenceContext;
use crate::entity::Entity;
use crate::metadata::Cardinality;

/// Name and shape of a navigation property, carried for the duration of a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RelationDescriptor {
    /// Field name of the navigation property.
    pub name: &'static str,
    /// Single- or collection-valued.
    pub cardinality: Cardinality,
}

impl RelationDescriptor {
    /// Describe a single-valued navigation.
    pub const fn single(name: &'static str) -> Self {
        Self {
            name,
            cardinality: Cardinality::Single,
        }
    }

    /// Describe a collection-valued navigation.
    pub const fn multi(name: &'static str) -> Self {
        Self {
            name,
            cardinality: Cardinality::Multi,
        }
    }
}

impl fmt::Display for RelationDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.cardinality)
    }
}

/// Single-valued navigation from `E` to `R`.
pub struct Reference<E, R> {
    name: &'static str,
    get: fn(&E) -> &Option<R>,
    get_mut: fn(&mut E) -> &mut Option<R>,
}

impl<E, R> Reference<E, R> {
    /// Create a reference descriptor from a field name and its accessors.
    pub const fn new(
        name: &'static str,
        get: fn(&E) -> &Option<R>,
        get_mut: fn(&mut E) -> &mut Option<R>,
    ) -> Self {
        Self { name, get, get_mut }
    }

    /// Field name.
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Name and shape.
    pub const fn descriptor(&self) -> RelationDescriptor {
        RelationDescriptor::single(self.name)
    }

    /// Read the navigation field.
    pub fn get<'e>(&self, entity: &'e E) -> &'e Option<R> {
        (self.get)(entity)
    }

    /// Write the navigation field.
    pub fn set(&self, entity: &mut E, value: Option<R>) {
        *(self.get_mut)(entity) = value;
    }
}

impl<E, R> Clone for Reference<E, R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E, R> Copy for Reference<E, R> {}

impl<E, R> fmt::Debug for Reference<E, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reference").field("name", &self.name).finish()
    }
}

/// Collection-valued navigation from `E` to `R`.
pub struct Collection<E, R> {
    name: &'static str,
    get: fn(&E) -> &Vec<R>,
    get_mut: fn(&mut E) -> &mut Vec<R>,
}

impl<E, R> Collection<E, R> {
    /// Create a collection descriptor from a field name and its accessors.
    pub const fn new(
        name: &'static str,
        get: fn(&E) -> &Vec<R>,
        get_mut: fn(&mut E) -> &mut Vec<R>,
    ) -> Self {
        Self { name, get, get_mut }
    }

    /// Field name.
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Name and shape.
    pub const fn descriptor(&self) -> RelationDescriptor {
        RelationDescriptor::multi(self.name)
    }

    /// Read the navigation field.
    pub fn get<'e>(&self, entity: &'e E) -> &'e [R] {
        (self.get)(entity)
    }

    /// Replace the navigation field's contents.
    pub fn set(&self, entity: &mut E, values: Vec<R>) {
        *(self.get_mut)(entity) = values;
    }
}

impl<E, R> Clone for Collection<E, R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E, R> Copy for Collection<E, R> {}

impl<E, R> fmt::Debug for Collection<E, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collection").field("name", &self.name).finish()
    }
}

/// A navigation property loaders can dispatch on.
///
/// Each method forwards to the context primitive for the relation's shape.
pub trait Relation<E: Entity>: Copy {
    /// The related entity type.
    type Target: Entity;

    /// Name and shape.
    fn descriptor(&self) -> RelationDescriptor;

    /// Ask the context whether the relation is already loaded for `entity`.
    fn is_loaded_in<C: PersistenceContext>(self, context: &C, entity: &E) -> bool;

    /// Ask the context to load the relation into `entity`.
    fn load_in<C: PersistenceContext>(self, context: &C, entity: &mut E) -> Result<(), C::Error>;

    /// Ask the context for a deferred query over the relation.
    fn query_in<C: PersistenceContext>(
        self,
        context: &C,
        entity: &E,
    ) -> Result<C::Query<Self::Target>, C::Error>;
}

impl<E: Entity, R: Entity> Relation<E> for Reference<E, R> {
    type Target = R;

    fn descriptor(&self) -> RelationDescriptor {
        Reference::descriptor(self)
    }

    fn is_loaded_in<C: PersistenceContext>(self, context: &C, entity: &E) -> bool {
        context.is_reference_loaded(entity, self)
    }

    fn load_in<C: PersistenceContext>(self, context: &C, entity: &mut E) -> Result<(), C::Error> {
        context.load_reference(entity, self)
    }

    fn query_in<C: PersistenceContext>(self, context: &C, entity: &E) -> Result<C::Query<R>, C::Error> {
        context.query_reference(entity, self)
    }
}

impl<E: Entity, R: Entity> Relation<E> for Collection<E, R> {
    type Target = R;

    fn descriptor(&self) -> RelationDescriptor {
        Collection::descriptor(self)
    }

    fn is_loaded_in<C: PersistenceContext>(self, context: &C, entity: &E) -> bool {
        context.is_collection_loaded(entity, self)
    }

    fn load_in<C: PersistenceContext>(self, context: &C, entity: &mut E) -> Result<(), C::Error> {
        context.load_collection(entity, self)
    }

    fn query_in<C: PersistenceContext>(self, context: &C, entity: &E) -> Result<C::Query<R>, C::Error> {
        context.query_collection(entity, self)
    }
}

/// Build a [`Reference`] for a field of type `Option<Target>`.
///
/// ```rust
/// use entity_loaders_core::{reference, Reference};
///
/// struct Post { author: Option<String> }
///
/// let author: Reference<Post, String> = reference!(Post, author: String);
/// let mut post = Post { author: None };
/// author.set(&mut post, Some("ada".into()));
/// assert_eq!(author.get(&post).as_deref(), Some("ada"));
/// assert_eq!(author.name(), "author");
/// ```
#[macro_export]
macro_rules! reference {
    ($owner:ty, $field:ident : $target:ty) => {
        $crate::Reference::<$owner, $target>::new(
            stringify!($field),
            |entity| &entity.$field,
            |entity| &mut entity.$field,
        )
    };
}

/// Build a [`Collection`] for a field of type `Vec<Target>`.
///
/// ```rust
/// use entity_loaders_core::{collection, Collection};
///
/// struct User { tags: Vec<String> }
///
/// let tags: Collection<User, String> = collection!(User, tags: String);
/// let mut user = User { tags: Vec::new() };
/// tags.set(&mut user, vec!["admin".into()]);
/// assert_eq!(tags.get(&user).len(), 1);
/// ```
#[macro_export]
macro_rules! collection {
    ($owner:ty, $field:ident : $target:ty) => {
        $crate::Collection::<$owner, $target>::new(
            stringify!($field),
            |entity| &entity.$field,
            |entity| &mut entity.$field,
        )
    };
}
