//! Error types for loader construction and configuration.
//!
//! Loaders validate everything they need when they are built, so the only
//! errors this crate raises are setup errors. Failures from the persistence
//! context during `reload`, `load` or `load_query` are returned as the
//! context's own error type and are never wrapped here.
//!
//! # Error Codes
//!
//! Error codes follow a pattern: EL{category}{number}
//! - 1xxx: Construction errors (absent argument, unmapped entity type)
//! - 7xxx: Configuration errors
//!
//! ```rust
//! use entity_loaders_core::{ErrorCode, LoaderError};
//!
//! let err = LoaderError::null_argument("entity");
//! assert_eq!(err.code, ErrorCode::NullArgument);
//! assert_eq!(err.code.code(), "EL1001");
//! assert!(err.to_string().contains("entity"));
//! ```

use std::fmt;
use thiserror::Error;

use crate::entity::Entity;

/// Result type for loader construction.
pub type LoaderResult<T> = Result<T, LoaderError>;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Construction errors (1xxx)
    /// A required argument was absent (EL1001).
    NullArgument = 1001,
    /// The entity type is not part of the context's model (EL1002).
    ModelMismatch = 1002,

    // Configuration errors (7xxx)
    /// Invalid configuration (EL7001).
    InvalidConfiguration = 7001,
}

impl ErrorCode {
    /// Get the error code string (e.g., "EL1001").
    pub fn code(&self) -> String {
        format!("EL{}", *self as u16)
    }

    /// Get a short description of the error code.
    pub fn description(&self) -> &'static str {
        match self {
            Self::NullArgument => "Required argument missing",
            Self::ModelMismatch => "Entity type not in model",
            Self::InvalidConfiguration => "Invalid configuration",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Additional context for an error.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// The argument involved.
    pub argument: Option<String>,
    /// The entity involved.
    pub entity: Option<String>,
    /// Suggestions for fixing the error.
    pub suggestions: Vec<String>,
}

/// Errors raised while building a loader or reading configuration.
#[derive(Error, Debug)]
pub struct LoaderError {
    /// The error code.
    pub code: ErrorCode,
    /// The error message.
    pub message: String,
    /// Additional context.
    pub context: ErrorContext,
    /// The source error (if any).
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for LoaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.code(), self.message)
    }
}

impl LoaderError {
    /// Create a new error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: ErrorContext::default(),
            source: None,
        }
    }

    /// Set the argument.
    pub fn with_argument(mut self, argument: impl Into<String>) -> Self {
        self.context.argument = Some(argument.into());
        self
    }

    /// Set the entity.
    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.context.entity = Some(entity.into());
        self
    }

    /// Add a suggestion for fixing the error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.context.suggestions.push(suggestion.into());
        self
    }

    /// Set the source error.
    pub fn with_source<E: std::error::Error + Send + Sync + 'static>(mut self, source: E) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    // ============== Constructor Functions ==============

    /// A required argument was absent.
    pub fn null_argument(argument: impl Into<String>) -> Self {
        let argument = argument.into();
        Self::new(
            ErrorCode::NullArgument,
            format!("Value cannot be absent. Argument: {}", argument),
        )
        .with_argument(argument)
    }

    /// Entity type `E` is not registered with the context's model.
    pub fn model_mismatch<E: Entity>() -> Self {
        Self::new(
            ErrorCode::ModelMismatch,
            format!(
                "The entity type {} is not part of the model for the current context. \
                 Verify the entity is configured with the context and not a complex type.",
                E::ENTITY_NAME
            ),
        )
        .with_entity(E::full_name())
        .with_suggestion(format!(
            "Register `{}` in the context's metadata before building a loader",
            E::ENTITY_NAME
        ))
    }

    /// Configuration could not be read or parsed.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidConfiguration, message)
    }

    // ============== Error Predicates ==============

    /// Check if this is an absent-argument error.
    pub fn is_null_argument(&self) -> bool {
        self.code == ErrorCode::NullArgument
    }

    /// Check if this is an unmapped-entity error.
    pub fn is_model_mismatch(&self) -> bool {
        self.code == ErrorCode::ModelMismatch
    }

    /// Check if this is a configuration error.
    pub fn is_config_error(&self) -> bool {
        self.code == ErrorCode::InvalidConfiguration
    }
}
