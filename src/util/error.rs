//! Error types for the layertrace library.

use thiserror::Error;

use crate::core::TimestampType;
use crate::query::CustomQueryType;

/// Main error type for layer trace operations.
///
/// The type is `Clone` so a failed lazy materialization can be cached and
/// handed back to every later caller.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Buffer cannot be parsed as the expected schema
    #[error("Failed to decode capture at byte {offset}: {reason}")]
    Decode { offset: usize, reason: String },

    /// An operation referenced a field unknown to both the record and the schema
    #[error("Schema field missing: '{field}' on node {node}")]
    SchemaFieldMissing { node: String, field: String },

    /// Parent id does not match any node of the snapshot (strict mode only)
    #[error("Orphan node {node}: parent {parent} is not part of the snapshot")]
    OrphanNode { node: String, parent: i64 },

    /// Query kind not served by this parser
    #[error("Unsupported custom query: {0:?}")]
    UnsupportedQuery(CustomQueryType),

    /// Entry index out of bounds
    #[error("Entry index {index} out of bounds (count: {count})")]
    EntryOutOfBounds { index: usize, count: usize },

    /// Entry range is reversed or exceeds the entry count
    #[error("Invalid entry range {start}..{end} (count: {count})")]
    InvalidRange { start: usize, end: usize, count: usize },

    /// No timestamp index exists for the requested kind
    #[error("Timestamps of type {0:?} are not available for this trace")]
    TimestampUnavailable(TimestampType),

    /// Type mismatch when reading a value
    #[error("Type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an "other" error from a string.
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Create a decode error at the given buffer offset.
    pub fn decode(offset: usize, reason: impl Into<String>) -> Self {
        Self::Decode { offset, reason: reason.into() }
    }

    /// Create a missing-field error for a node.
    pub fn missing_field(node: impl Into<String>, field: impl Into<String>) -> Self {
        Self::SchemaFieldMissing { node: node.into(), field: field.into() }
    }
}

/// Result type alias for layer trace operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let e = Error::decode(12, "truncated varint");
        assert!(e.to_string().contains("12"));
        assert!(e.to_string().contains("truncated"));

        let e = Error::EntryOutOfBounds { index: 5, count: 3 };
        assert!(e.to_string().contains("5"));
        assert!(e.to_string().contains("3"));
    }

    #[test]
    fn test_error_clone_eq() {
        let e = Error::missing_field("7 StatusBar", "flags");
        assert_eq!(e.clone(), e);
        assert!(matches!(e, Error::SchemaFieldMissing { .. }));
    }
}
