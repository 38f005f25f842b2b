//! Error types for the in-memory context.

use entity_loaders_core::EntityKey;
use smol_str::SmolStr;
use thiserror::Error;

/// Result type for in-memory store operations.
pub type MemoryResult<T> = Result<T, MemoryError>;

/// Error type for in-memory store operations.
#[derive(Debug, Error)]
pub enum MemoryError {
    /// The store was taken offline.
    #[error("Store is offline")]
    Offline,

    /// No stored row for the key.
    #[error("Row not found: {0}")]
    NotFound(EntityKey),

    /// The entity type has no navigation property with this name.
    #[error("Unknown relation '{relation}' on entity {entity}")]
    UnknownRelation {
        /// Short entity name.
        entity: SmolStr,
        /// Requested navigation property.
        relation: SmolStr,
    },

    /// The entity type is not registered with the context.
    #[error("Entity type {0} is not mapped")]
    Unmapped(SmolStr),

    /// The entity's primary key is missing or not a scalar.
    #[error("Invalid key for entity {entity}: {reason}")]
    InvalidKey {
        /// Short entity name.
        entity: SmolStr,
        /// What was wrong with the key.
        reason: String,
    },

    /// Row encoding or decoding failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl MemoryError {
    /// Create an unknown relation error.
    pub fn unknown_relation(entity: impl Into<SmolStr>, relation: impl Into<SmolStr>) -> Self {
        Self::UnknownRelation {
            entity: entity.into(),
            relation: relation.into(),
        }
    }

    /// Create an invalid key error.
    pub fn invalid_key(entity: impl Into<SmolStr>, reason: impl Into<String>) -> Self {
        Self::InvalidKey {
            entity: entity.into(),
            reason: reason.into(),
        }
    }

    /// Check if the store was offline.
    pub fn is_offline(&self) -> bool {
        matches!(self, Self::Offline)
    }

    /// Check if a row was missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
