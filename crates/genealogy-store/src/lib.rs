//! Genealogy Store
//!
//! The boundary between variant documents on disk and the typed records the
//! genealogy engine works with.
//!
//! # Core Operations
//!
//! - **Read**: scan a document's inline annotations into a [`VariantRecord`]
//! - **Write**: replace every lineage annotation with one canonical
//!   [`MetadataBlock`] inserted after the head marker
//! - **Storage**: list/read/write/timestamp documents through
//!   [`DocumentStore`]
//!
//! # Architecture
//!
//! ```text
//! DocumentStore → text → VariantRecord (typed) → engine
//! engine → MetadataBlock → apply_block(text) → DocumentStore
//! ```
//!
//! # Example
//!
//! ```rust
//! use genealogy_store::{MetadataBlock, ParentSet, VariantRecord, apply_block};
//!
//! let doc = "<html><head>\n<title>Data Eng</title>\n</head></html>";
//! let block = MetadataBlock::new(ParentSet::single("base_resume.html"), 1);
//! let written = apply_block(doc, &block, "<head>").unwrap();
//!
//! let record = VariantRecord::parse("data_eng.html", &written);
//! assert_eq!(record.parents, vec!["base_resume.html".to_string()]);
//! assert_eq!(record.stored_generation, Some(1));
//! assert!(record.conflicts().is_empty());
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod annotation;
pub mod block;
pub mod error;
pub mod record;
pub mod store;

pub use annotation::{AnnotationKey, RawDeclaration};
pub use block::{apply_block, strip_annotations, MetadataBlock, ParentSet};
pub use error::{MetadataError, StoreError, StoreResult};
pub use record::{DisplayInfo, RecordDiagnostic, VariantRecord};
pub use store::{Collection, DocumentStore, FsStore, MemoryStore};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for reading and writing variant documents
    pub use crate::{
        apply_block, AnnotationKey, Collection, DocumentStore, FsStore, MemoryStore,
        MetadataBlock, ParentSet, StoreError, VariantRecord,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
