//! Error types for the genealogy engine
//!
//! Batch passes (analysis, repair) never return these for a single bad
//! document. They surface only when a whole run cannot start or a
//! single-target operation fails.

use genealogy_store::{MetadataError, StoreError};

/// Main engine error type
#[derive(Debug, thiserror::Error)]
pub enum GenealogyError {
    /// Storage failure
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Metadata block could not be written
    #[error("metadata error: {0}")]
    Metadata(#[from] MetadataError),

    /// Configuration file could not be read or parsed
    #[error("configuration error: {0}")]
    Config(String),

    /// Name not present in either collection
    #[error("unknown variant: {0}")]
    UnknownVariant(String),

    /// Hybrid authoring with fewer than two distinct parents
    #[error("a hybrid needs at least two distinct parents, got {got}")]
    HybridRequiresParents {
        /// Distinct parents supplied
        got: usize,
    },
}

impl GenealogyError {
    /// Create configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, GenealogyError>;
