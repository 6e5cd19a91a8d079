//! Error types for the genealogy store
//!
//! - Storage operations (list/read/write a named document)
//! - Metadata writes (canonical block insertion)

use crate::store::Collection;

/// Errors from a [`DocumentStore`](crate::DocumentStore)
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No document with that name in the collection
    #[error("{collection} document not found: {name}")]
    NotFound { collection: Collection, name: String },

    /// Document already exists and must not be overwritten
    #[error("{collection} document already exists: {name}")]
    AlreadyExists { collection: Collection, name: String },

    /// IO error while accessing a document
    #[error("io error on {name}: {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// Name would escape the collection directory
    #[error("invalid document name: {0:?}")]
    InvalidName(String),

    /// Document bytes are not valid UTF-8
    #[error("cannot decode {name}: {source}")]
    Decode {
        name: String,
        #[source]
        source: std::string::FromUtf8Error,
    },
}

impl StoreError {
    /// Create IO error for a document name
    pub fn io_error(name: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            name: name.into(),
            source,
        }
    }

    /// Create not-found error
    pub fn not_found(collection: Collection, name: impl Into<String>) -> Self {
        Self::NotFound {
            collection,
            name: name.into(),
        }
    }
}

/// Errors from the metadata write contract
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MetadataError {
    /// The document has no insertion anchor
    #[error("no {marker} marker found")]
    MissingAnchor { marker: String },
}

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;
