//! Genealogy Core
//!
//! Generation tracking for résumé variants: who derives from whom, how deep
//! each variant sits below its base template, and repair of the lineage
//! annotations embedded in each document.
//!
//! # Pipeline
//!
//! ```text
//! DocumentStore → Corpus → ParentResolver → GenerationCalculator
//!                                              ↓
//!                        RepairPlan ← Analysis → GenealogyTree → reporting
//!                            ↓
//!                      DocumentStore
//! ```
//!
//! # Invariants
//!
//! 1. **Roots**: every template is generation 0
//! 2. **Monotonic**: a variant with resolvable parents is exactly one
//!    deeper than its deepest parent
//! 3. **Orphans**: a variant with no resolvable parent is generation 1
//! 4. **Fail-soft**: cycles, unknown parents and bad documents are reported,
//!    never fatal to a batch
//! 5. **Stable repair**: a second repair pass changes nothing
//!
//! # Example
//!
//! ```rust
//! use genealogy_core::prelude::*;
//!
//! let store = MemoryStore::new()
//!     .with_document(Collection::Templates, "base_resume.html", "<head></head>")
//!     .with_document(Collection::Variants, "a.html", "<head><!-- PARENT: base_resume.html --></head>")
//!     .with_document(Collection::Variants, "b.html", "<head><!-- PARENT: a.html --></head>");
//!
//! let engine = GenealogyEngine::new(store, GenealogyConfig::default());
//! let analysis = engine.analyze().unwrap();
//! assert_eq!(analysis.generation("b.html"), Some(2));
//!
//! let report = engine.repair(RepairOptions::new()).unwrap();
//! assert_eq!(report.fixed(), 2);
//! assert!(engine.repair(RepairOptions::new()).unwrap().is_clean());
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod analysis;
pub mod config;
pub mod corpus;
pub mod engine;
pub mod error;
pub mod generation;
pub mod lineage;
pub mod repair;
pub mod resolver;
pub mod tree;

pub use analysis::{Analysis, AnalysisReport, GenerationRow, Issue, IssueKind, RowKind, Summary};
pub use config::{
    FallbackPolicy, FallbackRule, GenealogyConfig, TemplateNames, TemplateRef, CONFIG_FILE,
};
pub use corpus::{Corpus, Entry};
pub use engine::{GenealogyEngine, JobInfo, HYBRID_VARIANT_TYPE};
pub use error::{GenealogyError, Result};
pub use generation::{
    CyclePath, GenerationCalculator, GenerationReport, UnresolvedParent, ORPHAN_GENERATION,
    TEMPLATE_GENERATION,
};
pub use lineage::LineageStep;
pub use repair::{RepairOptions, RepairOutcome, RepairPlan, RepairReason, RepairReport};
pub use resolver::{declared_generation, ParentResolver, Resolution};
pub use tree::{GenealogyTree, NodeInfo, TreeNode};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for driving the engine
    pub use crate::{
        Analysis, GenealogyConfig, GenealogyEngine, GenealogyError, GenealogyTree, JobInfo,
        RepairOptions, RepairOutcome, Result,
    };
    pub use genealogy_store::{Collection, DocumentStore, FsStore, MemoryStore};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
