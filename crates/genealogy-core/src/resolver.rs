//! Parent resolution
//!
//! Declared lineage always wins. Every `PARENT` and `PARENTS` annotation
//! contributes, merged in first-seen order without duplicates. Variants
//! with neither are given a default template parent by an explicit rule
//! table, which can be disabled.

use crate::config::{FallbackPolicy, GenealogyConfig, TemplateNames};
use genealogy_store::{ParentSet, VariantRecord};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static GEN_IN_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"gen(\d+)").expect("generation pattern is valid"));

/// Where a variant's parents came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum Resolution {
    /// Root template; never has parents
    Template,
    /// Parents stated in the document itself
    Declared {
        /// Canonical parent list
        parents: ParentSet,
    },
    /// Parent assigned by the default-parent policy
    Fallback {
        /// Assigned template
        parent: String,
        /// Filename substring that selected it, if a rule matched
        rule: Option<String>,
    },
    /// No declaration and no policy
    Unparented,
}

impl Resolution {
    /// Parents used for generation and tree edges
    #[must_use]
    pub fn parents(&self) -> &[String] {
        match self {
            Self::Declared { parents } => parents.as_slice(),
            Self::Fallback { parent, .. } => std::slice::from_ref(parent),
            Self::Template | Self::Unparented => &[],
        }
    }

    /// Parents that belong in a rewritten metadata block.
    ///
    /// Fallback parents are a read-time default and are not persisted.
    #[must_use]
    pub fn canonical(&self) -> ParentSet {
        match self {
            Self::Declared { parents } => parents.clone(),
            _ => ParentSet::None,
        }
    }

    /// Two or more parents
    #[inline]
    #[must_use]
    pub fn is_hybrid(&self) -> bool {
        matches!(self, Self::Declared { parents } if parents.is_hybrid())
    }

    /// Parents came from the default policy
    #[inline]
    #[must_use]
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }
}

/// Resolves each variant's parent set
#[derive(Debug, Clone)]
pub struct ParentResolver<'a> {
    templates: &'a TemplateNames,
    policy: &'a FallbackPolicy,
}

impl<'a> ParentResolver<'a> {
    /// Resolver using a config's templates and fallback policy
    #[must_use]
    pub fn new(config: &'a GenealogyConfig) -> Self {
        Self {
            templates: &config.templates,
            policy: &config.fallback,
        }
    }

    /// Resolve one record
    #[must_use]
    pub fn resolve(&self, record: &VariantRecord, is_template: bool) -> Resolution {
        if is_template {
            return Resolution::Template;
        }
        match ParentSet::from_list(record.parents.iter().map(String::as_str)) {
            ParentSet::None => self.fallback(record),
            parents => Resolution::Declared { parents },
        }
    }

    fn fallback(&self, record: &VariantRecord) -> Resolution {
        if !self.policy.enabled {
            return Resolution::Unparented;
        }
        let primary = || Resolution::Fallback {
            parent: self.templates.primary.clone(),
            rule: None,
        };
        if declared_generation(record) <= 1 {
            return primary();
        }
        self.policy
            .rules
            .iter()
            .find(|rule| record.filename.contains(&rule.contains))
            .map_or_else(primary, |rule| Resolution::Fallback {
                parent: self.templates.resolve(&rule.parent).to_string(),
                rule: Some(rule.contains.clone()),
            })
    }
}

/// Generation a document claims for itself: the stored annotation, else a
/// `gen<N>` token in the filename, else 1.
#[must_use]
pub fn declared_generation(record: &VariantRecord) -> u32 {
    if let Some(generation) = record.stored_generation {
        return generation;
    }
    GEN_IN_NAME
        .captures(&record.filename)
        .and_then(|c| c[1].parse().ok())
        .unwrap_or(1)
}
