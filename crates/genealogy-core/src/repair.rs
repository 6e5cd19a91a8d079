//! Consistency repair
//!
//! Selects every variant whose stored generation disagrees with the
//! computed one, or whose lineage annotations are repeated, and rewrites it
//! with one canonical block. Templates are never touched. Each file is
//! repaired independently; a failure is recorded and the pass continues.

use crate::corpus::Corpus;
use crate::generation::GenerationReport;
use crate::resolver::Resolution;
use genealogy_store::{apply_block, Collection, DocumentStore, MetadataBlock};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// How a repair pass runs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepairOptions {
    /// Compute outcomes without writing
    pub dry_run: bool,
}

impl RepairOptions {
    /// Options that write changes
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Options for a dry run
    #[inline]
    #[must_use]
    pub fn dry_run() -> Self {
        Self { dry_run: true }
    }
}

/// Why a variant was selected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepairReason {
    /// Stored generation missing or different from the computed one
    pub generation_mismatch: bool,
    /// More than one lineage declaration of the same kind
    pub conflicting_declarations: bool,
}

/// One variant scheduled for rewrite
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepairPlan {
    pub filename: String,
    /// Stored generation before repair
    pub from: Option<u32>,
    pub block: MetadataBlock,
    pub reason: RepairReason,
}

impl RepairPlan {
    /// Computed generation being written
    #[inline]
    #[must_use]
    pub fn to(&self) -> u32 {
        self.block.generation
    }
}

/// Result for one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RepairOutcome {
    /// Rewritten
    Fixed { from: Option<u32>, to: u32 },
    /// Would be rewritten (dry run)
    WouldFix { from: Option<u32>, to: u32 },
    /// Could not be rewritten; other files were still processed
    Failed { reason: String },
}

impl fmt::Display for RepairOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let show = |g: &Option<u32>| g.map_or_else(|| "?".to_string(), |g| g.to_string());
        match self {
            Self::Fixed { from, to } => write!(f, "fixed: Gen {} → Gen {to}", show(from)),
            Self::WouldFix { from, to } => write!(f, "would fix: Gen {} → Gen {to}", show(from)),
            Self::Failed { reason } => write!(f, "failed: {reason}"),
        }
    }
}

/// Outcome of a whole pass, in filename order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepairReport {
    pub outcomes: Vec<(String, RepairOutcome)>,
}

impl RepairReport {
    /// Files rewritten
    #[must_use]
    pub fn fixed(&self) -> usize {
        self.count(|o| matches!(o, RepairOutcome::Fixed { .. }))
    }

    /// Files that would be rewritten
    #[must_use]
    pub fn would_fix(&self) -> usize {
        self.count(|o| matches!(o, RepairOutcome::WouldFix { .. }))
    }

    /// Files that could not be rewritten
    #[must_use]
    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, RepairOutcome::Failed { .. }))
    }

    /// No file needed a change
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.outcomes.is_empty()
    }

    fn count(&self, pred: impl Fn(&RepairOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|(_, o)| pred(o)).count()
    }
}

/// Select the variants that need a rewrite
#[must_use]
pub fn plan(
    corpus: &Corpus,
    resolutions: &BTreeMap<String, Resolution>,
    report: &GenerationReport,
) -> Vec<RepairPlan> {
    let mut plans = Vec::new();
    for (name, entry) in corpus.iter() {
        if entry.is_template {
            continue;
        }
        let Some(computed) = report.get(name) else {
            continue;
        };
        let reason = RepairReason {
            generation_mismatch: entry.record.stored_generation != Some(computed),
            conflicting_declarations: entry.record.conflicts().len() > 1,
        };
        if !reason.generation_mismatch && !reason.conflicting_declarations {
            continue;
        }
        let parents = resolutions
            .get(name)
            .map(Resolution::canonical)
            .unwrap_or_default();
        plans.push(RepairPlan {
            filename: name.to_string(),
            from: entry.record.stored_generation,
            block: MetadataBlock::new(parents, computed),
            reason,
        });
    }
    plans
}

/// Rewrite each planned variant through `store`
pub fn apply<S: DocumentStore + ?Sized>(
    store: &S,
    plans: &[RepairPlan],
    head_marker: &str,
    options: RepairOptions,
) -> RepairReport {
    let mut report = RepairReport::default();
    for plan in plans {
        let outcome = match rewrite(store, plan, head_marker, options) {
            Ok(()) if options.dry_run => RepairOutcome::WouldFix {
                from: plan.from,
                to: plan.to(),
            },
            Ok(()) => {
                tracing::debug!("fixed {}: {:?} → {}", plan.filename, plan.from, plan.to());
                RepairOutcome::Fixed {
                    from: plan.from,
                    to: plan.to(),
                }
            }
            Err(reason) => {
                tracing::warn!("failed to fix {}: {reason}", plan.filename);
                RepairOutcome::Failed { reason }
            }
        };
        report.outcomes.push((plan.filename.clone(), outcome));
    }
    tracing::info!(
        fixed = report.fixed(),
        would_fix = report.would_fix(),
        failed = report.failed(),
        "repair pass complete"
    );
    report
}

fn rewrite<S: DocumentStore + ?Sized>(
    store: &S,
    plan: &RepairPlan,
    head_marker: &str,
    options: RepairOptions,
) -> Result<(), String> {
    let text = store
        .read(Collection::Variants, &plan.filename)
        .map_err(|e| e.to_string())?;
    let updated = apply_block(&text, &plan.block, head_marker).map_err(|e| e.to_string())?;
    if options.dry_run || updated == text {
        return Ok(());
    }
    store
        .write(Collection::Variants, &plan.filename, &updated)
        .map_err(|e| e.to_string())
}
