//! Model metadata a persistence context exposes to loaders.
//!
//! Loaders only ever ask one question of the metadata: is this entity type
//! part of the model? Contexts use the rest (navigation properties and their
//! foreign keys) to resolve relations.
//!
//! ```rust
//! use entity_loaders_core::metadata::{DataSpace, EntityType, ForeignKey, MetadataWorkspace};
//! use entity_loaders_core::Entity;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize)]
//! struct User { id: i64 }
//! impl Entity for User { const ENTITY_NAME: &'static str = "User"; }
//!
//! #[derive(Serialize, Deserialize)]
//! struct Post { id: i64, author_id: i64 }
//! impl Entity for Post { const ENTITY_NAME: &'static str = "Post"; }
//!
//! let mut workspace = MetadataWorkspace::new();
//! workspace.register(EntityType::of::<User>().collection::<Post>("posts", ForeignKey::target("author_id")));
//! workspace.register(EntityType::of::<Post>().reference::<User>("author", ForeignKey::source("author_id")));
//!
//! assert!(workspace.contains::<User>());
//! assert!(workspace.try_get_entity_type("Post", DataSpace::Conceptual).is_some());
//! ```

use std::fmt;

use indexmap::IndexMap;
use smol_str::SmolStr;

use crate::entity::Entity;

/// Metadata space an item is looked up in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataSpace {
    /// Object space, keyed by fully qualified Rust type name.
    Object,
    /// Conceptual space, keyed by short entity name.
    Conceptual,
}

/// Whether a navigation property refers to one or many related entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cardinality {
    /// Single-valued (reference) navigation.
    Single,
    /// Collection-valued navigation.
    Multi,
}

impl Cardinality {
    /// Check if this is a single-valued navigation.
    pub fn is_single(&self) -> bool {
        matches!(self, Self::Single)
    }

    /// Check if this is a collection-valued navigation.
    pub fn is_multi(&self) -> bool {
        matches!(self, Self::Multi)
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single => f.write_str("single"),
            Self::Multi => f.write_str("multi"),
        }
    }
}

/// Which side of a relation carries the foreign key column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeySide {
    /// The owning entity carries the column (many-to-one, dependent one-to-one).
    Source,
    /// The related entity carries the column (one-to-many, principal one-to-one).
    Target,
}

/// Foreign key backing a navigation property.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ForeignKey {
    /// Column holding the referenced key.
    pub column: SmolStr,
    /// Side the column lives on.
    pub side: KeySide,
}

impl ForeignKey {
    /// Foreign key stored on the owning entity.
    pub fn source(column: impl Into<SmolStr>) -> Self {
        Self {
            column: column.into(),
            side: KeySide::Source,
        }
    }

    /// Foreign key stored on the related entity.
    pub fn target(column: impl Into<SmolStr>) -> Self {
        Self {
            column: column.into(),
            side: KeySide::Target,
        }
    }
}

/// A navigation property on an entity type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationProperty {
    /// Property (field) name.
    pub name: SmolStr,
    /// Single- or collection-valued.
    pub cardinality: Cardinality,
    /// Full name of the related entity type.
    pub target: SmolStr,
    /// Foreign key the relation resolves through.
    pub foreign_key: ForeignKey,
}

/// A mapped entity type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityType {
    /// Short entity name.
    pub name: SmolStr,
    /// Fully qualified type name.
    pub full_name: SmolStr,
    /// Primary key field.
    pub key_field: SmolStr,
    /// Navigation properties by name.
    pub navigations: IndexMap<SmolStr, NavigationProperty>,
}

impl EntityType {
    /// Start describing entity type `E`.
    pub fn of<E: Entity>() -> Self {
        Self {
            name: SmolStr::new_static(E::ENTITY_NAME),
            full_name: SmolStr::new(E::full_name()),
            key_field: SmolStr::new_static(E::PRIMARY_KEY),
            navigations: IndexMap::new(),
        }
    }

    /// Add a single-valued navigation to `R`.
    pub fn reference<R: Entity>(self, name: impl Into<SmolStr>, foreign_key: ForeignKey) -> Self {
        self.navigation::<R>(name.into(), Cardinality::Single, foreign_key)
    }

    /// Add a collection-valued navigation to `R`.
    pub fn collection<R: Entity>(self, name: impl Into<SmolStr>, foreign_key: ForeignKey) -> Self {
        self.navigation::<R>(name.into(), Cardinality::Multi, foreign_key)
    }

    fn navigation<R: Entity>(
        mut self,
        name: SmolStr,
        cardinality: Cardinality,
        foreign_key: ForeignKey,
    ) -> Self {
        self.navigations.insert(
            name.clone(),
            NavigationProperty {
                name,
                cardinality,
                target: SmolStr::new(R::full_name()),
                foreign_key,
            },
        );
        self
    }

    /// Look up a navigation property by name.
    pub fn navigation_property(&self, name: &str) -> Option<&NavigationProperty> {
        self.navigations.get(name)
    }
}

/// Registry of mapped entity types.
#[derive(Debug, Clone, Default)]
pub struct MetadataWorkspace {
    object: IndexMap<SmolStr, EntityType>,
    conceptual: IndexMap<SmolStr, SmolStr>,
}

impl MetadataWorkspace {
    /// Create an empty workspace.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an entity type in every data space.
    ///
    /// Registering the same type twice replaces the earlier description.
    pub fn register(&mut self, entity_type: EntityType) {
        self.conceptual
            .insert(entity_type.name.clone(), entity_type.full_name.clone());
        self.object
            .insert(entity_type.full_name.clone(), entity_type);
    }

    /// Look up an entity type by name in the given space.
    pub fn try_get_entity_type(&self, name: &str, space: DataSpace) -> Option<&EntityType> {
        match space {
            DataSpace::Object => self.object.get(name),
            DataSpace::Conceptual => self
                .conceptual
                .get(name)
                .and_then(|full_name| self.object.get(full_name)),
        }
    }

    /// Object-space lookup for `E`.
    pub fn entity_type<E: Entity>(&self) -> Option<&EntityType> {
        self.try_get_entity_type(E::full_name(), DataSpace::Object)
    }

    /// Whether `E` is part of the model.
    pub fn contains<E: Entity>(&self) -> bool {
        self.entity_type::<E>().is_some()
    }

    /// Number of registered entity types.
    pub fn len(&self) -> usize {
        self.object.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.object.is_empty()
    }

    /// Iterate over registered entity types in registration order.
    pub fn entity_types(&self) -> impl Iterator<Item = &EntityType> {
        self.object.values()
    }
}
