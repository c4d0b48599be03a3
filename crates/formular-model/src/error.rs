//! Model errors

use thiserror::Error;

/// Result type for model operations
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised by the entity model
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// Two entities in one run share an id
    #[error("duplicate entity id: {id}")]
    DuplicateId { id: String },

    /// Requested attribute key is absent on the entity
    #[error("attribute '{key}' not found in entity {entity_id}")]
    AttributeNotFound { entity_id: String, key: String },

    /// Attribute is declared numeric but its raw value does not parse
    #[error("attribute '{key}' holds non-numeric value '{value}'")]
    InvalidNumber { key: String, value: String },
}

impl ModelError {
    /// Create a duplicate-id error
    pub fn duplicate_id(id: impl Into<String>) -> Self {
        Self::DuplicateId { id: id.into() }
    }

    /// Create an attribute-not-found error
    pub fn attribute_not_found(entity_id: impl Into<String>, key: impl Into<String>) -> Self {
        Self::AttributeNotFound {
            entity_id: entity_id.into(),
            key: key.into(),
        }
    }

    /// Create an invalid-number error
    pub fn invalid_number(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidNumber {
            key: key.into(),
            value: value.into(),
        }
    }
}
