//! Error types for the morph-to field

use serde::Serialize;
use thiserror::Error;

/// Result type for morph-to operations
pub type Result<T> = std::result::Result<T, MorphError>;

/// Errors raised while resolving, filling or serializing a morph-to field
#[derive(Debug, Error)]
pub enum MorphError {
    /// Two candidates share the same identifier
    #[error("duplicate candidate identifier: {identifier}")]
    DuplicateIdentifier { identifier: String },

    /// The request selected a type that is not registered on the field
    #[error("unknown candidate type submitted for '{attribute}': {identifier}")]
    UnknownType { attribute: String, identifier: String },

    /// A stored related entity has a type with no registered candidate
    #[error("entity type '{entity_type}' has no registered candidate")]
    UnregisteredType { entity_type: String },

    /// A descriptor failed to produce its field set
    #[error("failed to resolve fields for '{resource}': {source}")]
    Descriptor { resource: String, source: FieldError },

    /// Aggregated field-level violations
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    /// A nested field could not load its value from the related entity
    #[error("failed to resolve '{attribute}' for '{resource}': {source}")]
    Resolve {
        resource: String,
        attribute: String,
        source: FieldError,
    },

    /// A field failed to apply its value to the related entity
    #[error("failed to fill '{attribute}': {source}")]
    Fill { attribute: String, source: FieldError },

    /// Storage rejected the related entity
    #[error("failed to persist related entity: {0}")]
    Persistence(#[from] StoreError),

    /// A nested field failed to serialize
    #[error("failed to serialize '{attribute}' for '{resource}': {source}")]
    Serialization {
        resource: String,
        attribute: String,
        source: FieldError,
    },

    /// Settings could not be loaded
    #[error("failed to load settings: {0}")]
    Settings(#[from] figment::Error),
}

/// Coarse classification of [`MorphError`] variants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    UnregisteredType,
    Resolution,
    Validation,
    Fill,
    Persistence,
    Serialization,
}

impl MorphError {
    /// Create a descriptor error
    pub fn descriptor(resource: impl Into<String>, source: FieldError) -> Self {
        Self::Descriptor {
            resource: resource.into(),
            source,
        }
    }

    /// Create an unregistered type error
    pub fn unregistered(entity_type: impl Into<String>) -> Self {
        Self::UnregisteredType {
            entity_type: entity_type.into(),
        }
    }

    /// Which part of the error taxonomy this error belongs to
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::DuplicateIdentifier { .. }
            | Self::UnknownType { .. }
            | Self::Descriptor { .. }
            | Self::Settings(_) => ErrorKind::Configuration,
            Self::UnregisteredType { .. } => ErrorKind::UnregisteredType,
            Self::Resolve { .. } => ErrorKind::Resolution,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Fill { .. } => ErrorKind::Fill,
            Self::Persistence(_) => ErrorKind::Persistence,
            Self::Serialization { .. } => ErrorKind::Serialization,
        }
    }
}

/// Errors raised by individual fields and descriptors
#[derive(Debug, Error)]
pub enum FieldError {
    /// The submitted or stored value is not acceptable
    #[error("invalid value for {attribute}: {message}")]
    InvalidValue { attribute: String, message: String },

    /// The field or descriptor is misconfigured
    #[error("{message}")]
    Misconfigured { message: String },

    /// A nested save performed by the field failed
    #[error(transparent)]
    Store(#[from] StoreError),

    /// JSON conversion failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FieldError {
    /// Create an invalid value error
    pub fn invalid_value(attribute: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            attribute: attribute.into(),
            message: message.into(),
        }
    }

    /// Create a misconfiguration error
    pub fn misconfigured(message: impl Into<String>) -> Self {
        Self::Misconfigured {
            message: message.into(),
        }
    }
}

/// Storage-level failure (constraint violation, connectivity)
#[derive(Debug, Error)]
#[error("storage rejected {entity_type}: {message}")]
pub struct StoreError {
    pub entity_type: String,
    pub message: String,
}

impl StoreError {
    pub fn new(entity_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            message: message.into(),
        }
    }
}

/// A single rule violation on one attribute
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub attribute: String,
    pub message: String,
}

/// All violations collected by one validation run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Error)]
#[serde(transparent)]
#[error("validation failed with {} violation(s)", .violations.len())]
pub struct ValidationErrors {
    violations: Vec<Violation>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a violation
    pub fn add(&mut self, attribute: impl Into<String>, message: impl Into<String>) {
        self.violations.push(Violation {
            attribute: attribute.into(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.violations.len()
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Violations recorded against one attribute
    pub fn for_attribute<'a>(&'a self, attribute: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.violations
            .iter()
            .filter(move |v| v.attribute == attribute)
            .map(|v| v.message.as_str())
    }

    /// `Ok(())` when nothing was recorded, otherwise the collected violations
    pub fn into_result(self) -> std::result::Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}
