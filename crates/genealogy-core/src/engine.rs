//! Engine facade over a document store
//!
//! Every call loads a fresh [`Corpus`] from the store. Nothing is cached
//! between calls, so concurrent engines over separate loads never share
//! state.

use crate::analysis::Analysis;
use crate::config::GenealogyConfig;
use crate::corpus::Corpus;
use crate::error::{GenealogyError, Result};
use crate::lineage::{self, LineageStep};
use crate::repair::{self, RepairOptions, RepairReport};
use crate::tree::{GenealogyTree, TreeNode};
use genealogy_store::{
    apply_block, strip_annotations, AnnotationKey, Collection, DisplayInfo, DocumentStore,
    MetadataBlock, ParentSet,
};
use once_cell::sync::Lazy;
use regex::Regex;

static TITLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<title>[^<]*</title>").expect("title pattern is valid"));

/// Focus tag written on authored hybrids
pub const HYBRID_VARIANT_TYPE: &str = "Multi-Parent Hybrid";

/// Annotations describing the copied parent rather than the new hybrid
const INHERITED_KEYS: &[AnnotationKey] = &[
    AnnotationKey::JobTitle,
    AnnotationKey::JobCompany,
    AnnotationKey::HybridFeatures,
];

/// Target job written alongside stamped parents
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobInfo {
    pub title: Option<String>,
    pub company: Option<String>,
}

impl JobInfo {
    /// No job information
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With a job title
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// With a company
    #[must_use]
    pub fn with_company(mut self, company: impl Into<String>) -> Self {
        self.company = Some(company.into());
        self
    }
}

/// Genealogy operations over one store
#[derive(Debug)]
pub struct GenealogyEngine<S> {
    store: S,
    config: GenealogyConfig,
}

impl<S: DocumentStore> GenealogyEngine<S> {
    /// Create engine
    pub fn new(store: S, config: GenealogyConfig) -> Self {
        Self { store, config }
    }

    /// Backing store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Active configuration
    pub fn config(&self) -> &GenealogyConfig {
        &self.config
    }

    /// Load the corpus and analyse it.
    ///
    /// # Errors
    /// Only if a collection cannot be listed
    pub fn analyze(&self) -> Result<Analysis> {
        let corpus = Corpus::load(&self.store, &self.config)?;
        Ok(Analysis::run(corpus, &self.config))
    }

    /// Fresh genealogy tree
    ///
    /// # Errors
    /// Only if a collection cannot be listed
    pub fn tree(&self) -> Result<GenealogyTree> {
        Ok(self.analyze()?.tree().clone())
    }

    /// Rewrite every variant whose lineage metadata is stale or repeated.
    ///
    /// Per-file failures are in the returned report.
    ///
    /// # Errors
    /// Only if a collection cannot be listed
    pub fn repair(&self, options: RepairOptions) -> Result<RepairReport> {
        let analysis = self.analyze()?;
        let plans = repair::plan(
            analysis.corpus(),
            analysis.resolutions(),
            analysis.generations(),
        );
        tracing::info!("{} variant(s) need repair", plans.len());
        Ok(repair::apply(
            &self.store,
            &plans,
            &self.config.head_marker,
            options,
        ))
    }

    /// Root-first chain leading to `name`
    ///
    /// # Errors
    /// [`GenealogyError::UnknownVariant`] for an unknown name
    pub fn lineage(&self, name: &str) -> Result<Vec<LineageStep>> {
        lineage::trace(self.analyze()?.tree(), name)
    }

    /// Variants with two or more parents
    ///
    /// # Errors
    /// Only if a collection cannot be listed
    pub fn hybrids(&self) -> Result<Vec<TreeNode>> {
        Ok(self.analyze()?.hybrids().into_iter().cloned().collect())
    }

    /// Variants that would lose a resolvable ancestor if `name` were deleted
    ///
    /// # Errors
    /// [`GenealogyError::UnknownVariant`] for an unknown name
    pub fn descendants(&self, name: &str) -> Result<Vec<String>> {
        let tree = self.tree()?;
        if tree.get(name).is_none() {
            return Err(GenealogyError::UnknownVariant(name.to_string()));
        }
        Ok(tree.descendants(name))
    }

    /// Declare `parents` on an existing variant, with a generation one past
    /// the deepest of them and optional job annotations.
    ///
    /// # Errors
    /// Missing variant, missing head marker, or write failure
    pub fn stamp_parents(&self, variant: &str, parents: &[String], job: &JobInfo) -> Result<MetadataBlock> {
        let analysis = self.analyze()?;
        let text = self.store.read(Collection::Variants, variant)?;

        let parents = ParentSet::from_list(parents.iter().map(String::as_str));
        let generation = next_generation(&analysis, parents.as_slice());
        let mut block = MetadataBlock::new(parents, generation);
        if let Some(title) = &job.title {
            block = block.with_extra(AnnotationKey::JobTitle, title);
        }
        if let Some(company) = &job.company {
            block = block.with_extra(AnnotationKey::JobCompany, company);
        }

        let updated = apply_block(&text, &block, &self.config.head_marker)?;
        self.store.write(Collection::Variants, variant, &updated)?;
        tracing::info!("stamped {variant}: {:?} gen {}", block.parents.as_slice(), block.generation);
        Ok(block)
    }

    /// Author a new hybrid variant from two or more existing documents.
    ///
    /// The first parent's document is copied as the body, minus its job
    /// and feature annotations.
    ///
    /// # Errors
    /// Fewer than two distinct parents, an unknown parent, an existing
    /// target, or a body without the head marker
    pub fn create_hybrid(
        &self,
        parents: &[String],
        target: &str,
        features: Option<&str>,
    ) -> Result<MetadataBlock> {
        let parents = ParentSet::from_list(parents.iter().map(String::as_str));
        if !parents.is_hybrid() {
            return Err(GenealogyError::HybridRequiresParents { got: parents.len() });
        }
        if self.store.exists(Collection::Variants, target) {
            return Err(genealogy_store::StoreError::AlreadyExists {
                collection: Collection::Variants,
                name: target.to_string(),
            }
            .into());
        }

        let analysis = self.analyze()?;
        if let Some(missing) = parents
            .as_slice()
            .iter()
            .find(|p| !analysis.corpus().contains(p))
        {
            return Err(GenealogyError::UnknownVariant(missing.clone()));
        }

        let first = &parents.as_slice()[0];
        let collection = if self.store.exists(Collection::Templates, first) {
            Collection::Templates
        } else {
            Collection::Variants
        };
        let body = self.store.read(collection, first)?;
        let title = format!(
            "<title>{} - Hybrid Resume</title>",
            DisplayInfo::from_filename(target).name
        );
        let body = strip_annotations(&body, INHERITED_KEYS);
        let body = TITLE.replace(&body, regex::NoExpand(&title)).into_owned();

        let generation = next_generation(&analysis, parents.as_slice());
        let description = format!("Hybrid of {}", parents.as_slice().join(", "));
        let mut block = MetadataBlock::new(parents, generation)
            .with_extra(AnnotationKey::VariantType, HYBRID_VARIANT_TYPE)
            .with_extra(AnnotationKey::VariantDesc, description);
        if let Some(features) = features {
            block = block.with_extra(AnnotationKey::HybridFeatures, features);
        }
        block = block.with_extra(
            AnnotationKey::Generated,
            chrono::Utc::now().format("%Y-%m-%d").to_string(),
        );

        let text = apply_block(&body, &block, &self.config.head_marker)?;
        self.store.create(Collection::Variants, target, &text)?;
        tracing::info!("created hybrid {target} (gen {generation})");
        Ok(block)
    }
}

/// One past the deepest known parent; 1 when none resolve
fn next_generation(analysis: &Analysis, parents: &[String]) -> u32 {
    parents
        .iter()
        .filter_map(|p| analysis.generation(p))
        .max()
        .map_or(1, |g| g.saturating_add(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use genealogy_store::{MemoryStore, VariantRecord};

    const PAGE: &str = "<html>\n<head>\n    <title>Base - Resume</title>\n</head>\n<body>body</body>\n</html>";

    fn engine() -> GenealogyEngine<MemoryStore> {
        let store = MemoryStore::new()
            .with_document(Collection::Templates, "base_resume.html", PAGE)
            .with_document(
                Collection::Variants,
                "a.html",
                &PAGE.replace("<head>", "<head>\n    <!-- PARENT: base_resume.html -->\n    <!-- GENERATION: 1 -->"),
            )
            .with_document(Collection::Variants, "b.html", PAGE);
        GenealogyEngine::new(store, GenealogyConfig::default())
    }

    #[test]
    fn stamp_sets_generation_from_parents() {
        let engine = engine();
        let job = JobInfo::new().with_title("SRE").with_company("Acme");
        let block = engine
            .stamp_parents("b.html", &["a.html".to_string()], &job)
            .unwrap();
        assert_eq!(block.generation, 2);

        let text = engine.store().contents(Collection::Variants, "b.html").unwrap();
        let record = VariantRecord::parse("b.html", &text);
        assert_eq!(record.parents, vec!["a.html".to_string()]);
        assert_eq!(record.stored_generation, Some(2));
        assert_eq!(record.display.job_company.as_deref(), Some("Acme"));
    }

    #[test]
    fn stamp_with_unknown_parent_is_generation_one() {
        let engine = engine();
        let block = engine
            .stamp_parents("b.html", &["ghost.html".to_string()], &JobInfo::new())
            .unwrap();
        assert_eq!(block.generation, 1);
    }

    #[test]
    fn hybrid_needs_two_distinct_parents() {
        let engine = engine();
        let err = engine
            .create_hybrid(&["a.html".to_string(), "a.html".to_string()], "h.html", None)
            .unwrap_err();
        assert!(matches!(err, GenealogyError::HybridRequiresParents { got: 1 }));
    }

    #[test]
    fn hybrid_copies_first_parent_and_declares_all() {
        let engine = engine();
        let parents = vec!["a.html".to_string(), "base_resume.html".to_string()];
        let block = engine
            .create_hybrid(&parents, "ml_hybrid.html", Some("ML + infra"))
            .unwrap();
        assert_eq!(block.generation, 2);

        let text = engine.store().contents(Collection::Variants, "ml_hybrid.html").unwrap();
        assert!(text.contains("<title>Ml Hybrid - Hybrid Resume</title>"));
        assert!(text.contains("<body>body</body>"));
        let record = VariantRecord::parse("ml_hybrid.html", &text);
        assert_eq!(record.multi_parent_declaration(), Some(parents));
        assert!(record.conflicts().is_empty());
        assert_eq!(record.display.variant_type, HYBRID_VARIANT_TYPE);
        assert_eq!(record.display.hybrid_features.as_deref(), Some("ML + infra"));
        assert!(record.display.generated.is_some());
    }

    #[test]
    fn hybrid_refuses_existing_target() {
        let engine = engine();
        let err = engine
            .create_hybrid(&["a.html".to_string(), "base_resume.html".to_string()], "b.html", None)
            .unwrap_err();
        assert!(matches!(
            err,
            GenealogyError::Store(genealogy_store::StoreError::AlreadyExists { .. })
        ));
    }

    #[test]
    fn hybrid_rejects_unknown_parent() {
        let engine = engine();
        let err = engine
            .create_hybrid(&["a.html".to_string(), "nope.html".to_string()], "h.html", None)
            .unwrap_err();
        assert!(matches!(err, GenealogyError::UnknownVariant(name) if name == "nope.html"));
    }

    #[test]
    fn descendants_of_unknown_is_an_error() {
        assert!(matches!(
            engine().descendants("zzz.html"),
            Err(GenealogyError::UnknownVariant(_))
        ));
    }
}
