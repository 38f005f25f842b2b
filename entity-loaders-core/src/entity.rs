//! Entity trait and tracked-state vocabulary.

use std::fmt;

use serde::Serialize;
use serde::de::DeserializeOwned;
use smol_str::SmolStr;

/// A mapped data object a persistence context can track.
///
/// Navigation fields are plain `Option<R>` / `Vec<R>` values and should be
/// skipped by serde; the context fills them in when a relation is loaded.
///
/// ```rust
/// use entity_loaders_core::Entity;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, Serialize, Deserialize)]
/// struct Tag {
///     id: i64,
///     label: String,
/// }
///
/// impl Entity for Tag {
///     const ENTITY_NAME: &'static str = "Tag";
/// }
///
/// assert_eq!(Tag::PRIMARY_KEY, "id");
/// assert!(Tag::full_name().ends_with("Tag"));
/// ```
pub trait Entity: Serialize + DeserializeOwned + 'static {
    /// Short entity name used in diagnostics.
    const ENTITY_NAME: &'static str;

    /// Field holding the entity's identity.
    const PRIMARY_KEY: &'static str = "id";

    /// Fully qualified type name, used as the object-space metadata key.
    fn full_name() -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Whether [`refresh`](Entity::refresh) keeps navigation fields.
    ///
    /// Contexts forget which relations were loaded on reload unless this is
    /// `true`. Set it together with a `refresh` override that keeps them.
    const REFRESH_KEEPS_RELATIONS: bool = false;

    /// Overwrite scalar state with a freshly read copy.
    ///
    /// The default replaces the whole value, which also resets navigation
    /// fields. Entities with navigation fields usually override this to keep
    /// already-loaded relations, and set `REFRESH_KEEPS_RELATIONS`.
    fn refresh(&mut self, fresh: Self) {
        *self = fresh;
    }
}

/// Tracked state of an entity inside a persistence context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EntityState {
    /// Not tracked by the context.
    #[default]
    Detached,
    /// Tracked and identical to the stored row.
    Unchanged,
    /// Tracked, pending insert.
    Added,
    /// Tracked, pending delete.
    Deleted,
    /// Tracked with pending changes to a stored row.
    Modified,
}

impl EntityState {
    /// Whether the entity has a known counterpart in the backing store.
    ///
    /// Only `Modified` and `Unchanged` qualify; every loader operation is
    /// gated on this.
    #[inline]
    pub fn is_persisted(&self) -> bool {
        matches!(self, Self::Modified | Self::Unchanged)
    }

    /// Whether the context tracks the entity at all.
    #[inline]
    pub fn is_tracked(&self) -> bool {
        !matches!(self, Self::Detached)
    }

    /// Lowercase name, used in log fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Detached => "detached",
            Self::Unchanged => "unchanged",
            Self::Added => "added",
            Self::Deleted => "deleted",
            Self::Modified => "modified",
        }
    }
}

impl fmt::Display for EntityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of a tracked row: entity full name plus canonical key text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityKey {
    entity: SmolStr,
    key: SmolStr,
}

impl EntityKey {
    /// Create a key for the given entity full name.
    pub fn new(entity: impl Into<SmolStr>, key: impl Into<SmolStr>) -> Self {
        Self {
            entity: entity.into(),
            key: key.into(),
        }
    }

    /// Create a key for entity type `E`.
    pub fn of<E: Entity>(key: impl Into<SmolStr>) -> Self {
        Self::new(E::full_name(), key)
    }

    /// The entity full name.
    pub fn entity(&self) -> &str {
        &self.entity
    }

    /// The canonical key text.
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.entity, self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_persisted_states() {
        assert!(EntityState::Unchanged.is_persisted());
        assert!(EntityState::Modified.is_persisted());
        assert!(!EntityState::Added.is_persisted());
        assert!(!EntityState::Deleted.is_persisted());
        assert!(!EntityState::Detached.is_persisted());
    }

    #[test]
    fn test_tracked_states() {
        assert!(!EntityState::Detached.is_tracked());
        assert!(EntityState::Added.is_tracked());
        assert!(EntityState::Deleted.is_tracked());
    }

    #[test]
    fn test_default_state_is_detached() {
        assert_eq!(EntityState::default(), EntityState::Detached);
    }

    #[test]
    fn test_entity_key_display() {
        let key = EntityKey::new("app::User", "42");
        assert_eq!(key.to_string(), "app::User#42");
        assert_eq!(key.entity(), "app::User");
        assert_eq!(key.key(), "42");
    }
}
