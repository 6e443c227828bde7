//! Error types for the schema and entity model.

use thiserror::Error;

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised while building schema trees or mapping entities.
#[derive(Debug, Error)]
pub enum ModelError {
    /// A field or bundle id has no node in the path tree.
    #[error("no path for field or bundle `{0}` in the pathbuilder")]
    SchemaLookup(String),

    /// An entity has no URI where one is required.
    #[error("missing identifier: {0}")]
    MissingIdentifier(String),

    /// A field declared as a group holds a scalar, or a scalar field holds an entity.
    #[error("field `{field_id}` expects {expected}")]
    SchemaTypeMismatch { field_id: String, expected: String },

    /// Some records could never be attached because their parent is absent.
    #[error("path insertion stalled: attached {inserted} of {offered} paths, unattached: {unattached:?}")]
    TreeInsertionStall {
        inserted: usize,
        offered: usize,
        unattached: Vec<String>,
    },

    /// Wire data does not have the shape of a serialized entity.
    #[error("invalid wire data: {0}")]
    InvalidWireData(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ModelError {
    /// Returns true if this error reports an unknown field or bundle.
    pub fn is_schema_lookup(&self) -> bool {
        matches!(self, ModelError::SchemaLookup(_))
    }
}
