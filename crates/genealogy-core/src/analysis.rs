//! Analysis snapshot and reporting views
//!
//! One [`Analysis`] holds everything derived from a single load of the
//! corpus: resolutions, generations, the tree, and the issue list. It is
//! never updated in place.

use crate::config::GenealogyConfig;
use crate::corpus::Corpus;
use crate::generation::{CyclePath, GenerationCalculator, GenerationReport};
use crate::resolver::{ParentResolver, Resolution};
use crate::tree::{GenealogyTree, TreeNode};
use genealogy_store::RecordDiagnostic;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Category of a reported problem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// A lineage key appears more than once
    MultipleDeclarations,
    /// A resolved parent is not a known document
    UnknownParent,
    /// Document could not be read or decoded
    Unreadable,
    /// `GENERATION` value is not an integer
    MalformedGeneration,
    /// Name present as both template and variant
    DuplicateName,
}

/// One problem attributed to one document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub filename: String,
    pub kind: IssueKind,
    /// Human-readable detail
    pub message: String,
}

impl Issue {
    fn new(filename: &str, kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            filename: filename.to_string(),
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.filename, self.message)
    }
}

/// Headline counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub variants: usize,
    pub templates: usize,
    pub issues: usize,
    pub cycles: usize,
    pub hybrids: usize,
}

/// How a row is drawn in the generation listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowKind {
    Template,
    Hybrid,
    Linear,
}

/// One variant in the generation listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRow {
    pub filename: String,
    pub kind: RowKind,
    pub parents: Vec<String>,
    /// Stored generation when it differs from the computed one
    pub was: Option<u32>,
}

/// Everything derived from one corpus load
#[derive(Debug, Clone)]
pub struct Analysis {
    corpus: Corpus,
    resolutions: BTreeMap<String, Resolution>,
    generations: GenerationReport,
    tree: GenealogyTree,
    issues: Vec<Issue>,
}

impl Analysis {
    /// Resolve, compute and collect issues
    #[must_use]
    pub fn run(corpus: Corpus, config: &GenealogyConfig) -> Self {
        let resolver = ParentResolver::new(config);
        let resolutions: BTreeMap<String, Resolution> = corpus
            .iter()
            .map(|(name, entry)| {
                let resolution = match resolver.resolve(&entry.record, entry.is_template) {
                    Resolution::Fallback { parent, .. } if !corpus.contains(&parent) => {
                        tracing::debug!("{name}: default parent {parent} is absent");
                        Resolution::Unparented
                    }
                    resolution => resolution,
                };
                (name.to_string(), resolution)
            })
            .collect();

        let generations = {
            let mut calc = GenerationCalculator::new();
            for (name, resolution) in &resolutions {
                if corpus.is_template(name) {
                    calc.add_template(name);
                } else {
                    calc.add_variant(name, resolution.parents());
                }
            }
            calc.compute()
        };

        let tree = GenealogyTree::build(
            &corpus,
            &resolutions,
            &generations,
            &config.templates.primary,
            &config.templates.secondary,
        );
        let issues = collect_issues(&corpus, &generations);

        let analysis = Self {
            corpus,
            resolutions,
            generations,
            tree,
            issues,
        };
        let summary = analysis.summary();
        tracing::info!(
            variants = summary.variants,
            templates = summary.templates,
            issues = summary.issues,
            cycles = summary.cycles,
            "analysis complete"
        );
        analysis
    }

    /// Loaded documents
    #[must_use]
    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    /// Resolution per filename
    #[must_use]
    pub fn resolutions(&self) -> &BTreeMap<String, Resolution> {
        &self.resolutions
    }

    /// Computed generations, cycles and unresolved references
    #[must_use]
    pub fn generations(&self) -> &GenerationReport {
        &self.generations
    }

    /// Computed generation of one document
    #[must_use]
    pub fn generation(&self, name: &str) -> Option<u32> {
        self.generations.get(name)
    }

    /// Parent/child forest
    #[must_use]
    pub fn tree(&self) -> &GenealogyTree {
        &self.tree
    }

    /// Problems found, in filename order
    #[must_use]
    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    /// Cycles found while computing generations
    #[must_use]
    pub fn cycles(&self) -> &[CyclePath] {
        &self.generations.cycles
    }

    /// Headline counts
    #[must_use]
    pub fn summary(&self) -> Summary {
        Summary {
            variants: self.corpus.variants().count(),
            templates: self.corpus.templates().count(),
            issues: self.issues.len(),
            cycles: self.generations.cycles.len(),
            hybrids: self.hybrids().len(),
        }
    }

    /// Nodes with two or more resolved parents
    #[must_use]
    pub fn hybrids(&self) -> Vec<&TreeNode> {
        self.tree
            .nodes()
            .values()
            .filter(|n| n.info.is_hybrid)
            .collect()
    }

    /// Documents grouped by computed generation, filenames sorted
    #[must_use]
    pub fn by_generation(&self) -> BTreeMap<u32, Vec<GenerationRow>> {
        let mut groups: BTreeMap<u32, Vec<GenerationRow>> = BTreeMap::new();
        for (name, entry) in self.corpus.iter() {
            let Some(generation) = self.generations.get(name) else {
                continue;
            };
            let resolution = self.resolutions.get(name);
            let kind = if entry.is_template {
                RowKind::Template
            } else if resolution.is_some_and(Resolution::is_hybrid) {
                RowKind::Hybrid
            } else {
                RowKind::Linear
            };
            let was = match entry.record.stored_generation {
                Some(stored) if !entry.is_template && stored != generation => Some(stored),
                _ => None,
            };
            groups.entry(generation).or_default().push(GenerationRow {
                filename: name.to_string(),
                kind,
                parents: resolution.map(|r| r.parents().to_vec()).unwrap_or_default(),
                was,
            });
        }
        groups
    }

    /// Flat human-readable diagnostics: every issue, then every cycle
    #[must_use]
    pub fn diagnostics(&self) -> Vec<String> {
        self.issues
            .iter()
            .map(ToString::to_string)
            .chain(
                self.generations
                    .cycles
                    .iter()
                    .map(|c| format!("cycle detected: {c}")),
            )
            .collect()
    }

    /// Serializable view for reporting consumers
    #[must_use]
    pub fn to_report(&self) -> AnalysisReport<'_> {
        AnalysisReport {
            summary: self.summary(),
            issues: &self.issues,
            cycles: &self.generations.cycles,
            generations: &self.generations.generations,
            resolutions: &self.resolutions,
        }
    }
}

/// JSON shape of an analysis
#[derive(Debug, Serialize)]
pub struct AnalysisReport<'a> {
    pub summary: Summary,
    pub issues: &'a [Issue],
    pub cycles: &'a [CyclePath],
    pub generations: &'a BTreeMap<String, u32>,
    pub resolutions: &'a BTreeMap<String, Resolution>,
}

fn collect_issues(corpus: &Corpus, generations: &GenerationReport) -> Vec<Issue> {
    let mut issues = Vec::new();

    for (name, entry) in corpus.iter() {
        let record = &entry.record;
        for diagnostic in &record.diagnostics {
            let kind = match diagnostic {
                RecordDiagnostic::Unreadable(_) => IssueKind::Unreadable,
                RecordDiagnostic::MalformedGeneration(_) => IssueKind::MalformedGeneration,
            };
            issues.push(Issue::new(name, kind, diagnostic.to_string()));
        }
        if entry.is_template {
            continue;
        }
        let conflicts = record.conflicts();
        if conflicts.len() > 1 {
            let found: Vec<String> = conflicts.iter().map(ToString::to_string).collect();
            issues.push(Issue::new(
                name,
                IssueKind::MultipleDeclarations,
                format!("multiple lineage declarations ({})", found.join("; ")),
            ));
        }
        for unresolved in generations.unresolved.iter().filter(|u| u.variant == name) {
            issues.push(Issue::new(
                name,
                IssueKind::UnknownParent,
                format!("references non-existent parent '{}'", unresolved.parent),
            ));
        }
    }

    for name in corpus.duplicates() {
        issues.push(Issue::new(
            name,
            IssueKind::DuplicateName,
            "name exists as both template and variant",
        ));
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use genealogy_store::VariantRecord;
    use pretty_assertions::assert_eq;

    fn analysis(templates: &[&str], variants: &[(&str, &str)]) -> Analysis {
        let mut corpus = Corpus::new();
        for t in templates {
            corpus.insert_template(VariantRecord::parse(t, "<head></head>"));
        }
        for (name, text) in variants {
            corpus.insert_variant(VariantRecord::parse(name, text));
        }
        Analysis::run(corpus, &GenealogyConfig::default())
    }

    #[test]
    fn clean_corpus_has_no_diagnostics() {
        let a = analysis(
            &["base_resume.html"],
            &[("a.html", "<!-- PARENT: base_resume.html -->\n<!-- GENERATION: 1 -->")],
        );
        assert!(a.issues().is_empty());
        assert!(a.diagnostics().is_empty());
        assert_eq!(
            a.summary(),
            Summary {
                variants: 1,
                templates: 1,
                issues: 0,
                cycles: 0,
                hybrids: 0
            }
        );
    }

    #[test]
    fn unknown_parent_is_an_issue() {
        let a = analysis(&["base_resume.html"], &[("a.html", "<!-- PARENT: gone.html -->")]);
        assert_eq!(a.issues().len(), 1);
        assert_eq!(a.issues()[0].kind, IssueKind::UnknownParent);
        assert_eq!(
            a.issues()[0].to_string(),
            "a.html: references non-existent parent 'gone.html'"
        );
        assert_eq!(a.generation("a.html"), Some(1));
    }

    #[test]
    fn absent_default_template_is_not_an_issue() {
        let a = analysis(&["t.html"], &[("plain.html", "<head></head>")]);
        assert!(a.issues().is_empty());
        assert_eq!(a.resolutions()["plain.html"], Resolution::Unparented);
        assert_eq!(a.generation("plain.html"), Some(1));
    }

    #[test]
    fn repeated_parent_lines_are_one_issue() {
        let a = analysis(
            &["base_resume.html"],
            &[
                ("x.html", "<!-- PARENT: base_resume.html -->\n<!-- PARENT: y.html -->"),
                ("y.html", "<!-- PARENT: base_resume.html -->"),
            ],
        );
        let kinds: Vec<_> = a.issues().iter().map(|i| i.kind).collect();
        assert_eq!(kinds, vec![IssueKind::MultipleDeclarations]);
    }

    #[test]
    fn cycles_are_reported_in_diagnostics() {
        let a = analysis(
            &[],
            &[
                ("a.html", "<!-- PARENT: b.html -->"),
                ("b.html", "<!-- PARENT: a.html -->"),
            ],
        );
        assert_eq!(a.summary().cycles, 1);
        assert_eq!(a.diagnostics(), vec!["cycle detected: a.html → b.html → a.html".to_string()]);
    }

    #[test]
    fn by_generation_marks_corrections() {
        let a = analysis(
            &["base_resume.html"],
            &[
                ("a.html", "<!-- PARENT: base_resume.html -->\n<!-- GENERATION: 3 -->"),
                ("h.html", "<!-- PARENTS: a.html, base_resume.html -->\n<!-- GENERATION: 2 -->"),
            ],
        );
        let groups = a.by_generation();
        assert_eq!(groups[&0][0].kind, RowKind::Template);
        assert_eq!(groups[&1][0].filename, "a.html");
        assert_eq!(groups[&1][0].was, Some(3));
        assert_eq!(groups[&2][0].kind, RowKind::Hybrid);
        assert_eq!(groups[&2][0].was, None);
        assert_eq!(a.summary().hybrids, 1);
    }

    #[test]
    fn report_serializes() {
        let a = analysis(&["base_resume.html"], &[("a.html", "")]);
        let json = serde_json::to_value(a.to_report()).unwrap();
        assert_eq!(json["summary"]["variants"], 1);
        assert_eq!(json["generations"]["a.html"], 1);
        assert_eq!(json["resolutions"]["a.html"]["source"], "fallback");
    }
}
