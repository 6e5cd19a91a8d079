//! Typed variant records
//!
//! [`VariantRecord::parse`] is the only place raw document text is
//! interpreted. Everything downstream works on the typed fields.

use crate::annotation::{scan, split_parents, AnnotationKey, RawDeclaration};
use indexmap::IndexSet;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

static TITLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<title>([^<]+)</title>").expect("title pattern is valid"));

/// Suffix dropped from document titles for display
const TITLE_SUFFIX: &str = " - Resume";

/// Default focus tag when a document declares none
pub const DEFAULT_VARIANT_TYPE: &str = "general";

/// Default description when a document declares none
pub const DEFAULT_DESCRIPTION: &str = "Resume variant";

/// Lineage and display metadata extracted from one document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantRecord {
    /// Unique identifier across the corpus
    pub filename: String,
    /// Every declared parent, first-seen order, no duplicates
    pub parents: Vec<String>,
    /// First `GENERATION` annotation, if it parsed
    pub stored_generation: Option<u32>,
    /// Every raw lineage annotation, in document order
    pub declarations: Vec<RawDeclaration>,
    pub display: DisplayInfo,
    pub diagnostics: Vec<RecordDiagnostic>,
}

/// Problems found while reading a single document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum RecordDiagnostic {
    /// The document could not be read or decoded
    Unreadable(String),
    /// A `GENERATION` value that is not a base-10 integer
    MalformedGeneration(String),
}

impl fmt::Display for RecordDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unreadable(reason) => write!(f, "error reading file: {reason}"),
            Self::MalformedGeneration(value) => write!(f, "malformed generation '{value}'"),
        }
    }
}

/// Human-facing fields shown by tree and listing views
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayInfo {
    pub name: String,
    pub variant_type: String,
    pub description: String,
    pub hybrid_features: Option<String>,
    pub job_title: Option<String>,
    pub job_company: Option<String>,
    pub generated: Option<String>,
}

impl DisplayInfo {
    /// Defaults derived from the filename alone
    #[must_use]
    pub fn from_filename(filename: &str) -> Self {
        Self {
            name: name_from_filename(filename),
            variant_type: DEFAULT_VARIANT_TYPE.to_string(),
            description: DEFAULT_DESCRIPTION.to_string(),
            hybrid_features: None,
            job_title: None,
            job_company: None,
            generated: None,
        }
    }
}

impl VariantRecord {
    /// Parse a document's annotations.
    ///
    /// Never fails: conflicting or malformed annotations are kept as
    /// declarations and diagnostics for the caller to report.
    #[must_use]
    pub fn parse(filename: &str, text: &str) -> Self {
        let found = scan(text);
        let mut display = DisplayInfo::from_filename(filename);
        let mut diagnostics = Vec::new();

        if let Some(title) = TITLE.captures(text).and_then(|c| c.get(1)) {
            let title = title.as_str().trim();
            let title = title.strip_suffix(TITLE_SUFFIX).unwrap_or(title).trim();
            if !title.is_empty() {
                display.name = title.to_string();
            }
        }

        let first = |key: AnnotationKey| {
            found
                .iter()
                .find(|d| d.key == key)
                .map(|d| d.value.clone())
        };
        if let Some(v) = first(AnnotationKey::VariantType) {
            display.variant_type = v;
        }
        if let Some(v) = first(AnnotationKey::VariantDesc) {
            display.description = v;
        }
        display.hybrid_features = first(AnnotationKey::HybridFeatures);
        display.job_title = first(AnnotationKey::JobTitle);
        display.job_company = first(AnnotationKey::JobCompany);
        display.generated = first(AnnotationKey::Generated);

        let mut parents = IndexSet::new();
        for decl in found.iter().filter(|d| d.key.is_parent_key()) {
            parents.extend(split_parents(&decl.value).map(str::to_string));
        }

        let stored_generation = match first(AnnotationKey::Generation) {
            Some(value) => match value.parse::<u32>() {
                Ok(generation) => Some(generation),
                Err(_) => {
                    diagnostics.push(RecordDiagnostic::MalformedGeneration(value));
                    None
                }
            },
            None => None,
        };

        let declarations = found
            .into_iter()
            .filter(|d| AnnotationKey::LINEAGE.contains(&d.key))
            .collect();

        Self {
            filename: filename.to_string(),
            parents: parents.into_iter().collect(),
            stored_generation,
            declarations,
            display,
            diagnostics,
        }
    }

    /// Empty record for a document that could not be read
    #[must_use]
    pub fn unreadable(filename: &str, reason: impl fmt::Display) -> Self {
        Self {
            filename: filename.to_string(),
            parents: Vec::new(),
            stored_generation: None,
            declarations: Vec::new(),
            display: DisplayInfo::from_filename(filename),
            diagnostics: vec![RecordDiagnostic::Unreadable(reason.to_string())],
        }
    }

    /// Whether the document was read successfully
    #[inline]
    #[must_use]
    pub fn is_readable(&self) -> bool {
        !self
            .diagnostics
            .iter()
            .any(|d| matches!(d, RecordDiagnostic::Unreadable(_)))
    }

    /// Raw `PARENT` / `PARENTS` declarations
    pub fn parent_declarations(&self) -> impl Iterator<Item = &RawDeclaration> {
        self.declarations.iter().filter(|d| d.key.is_parent_key())
    }

    /// Raw `GENERATION` declarations
    pub fn generation_declarations(&self) -> impl Iterator<Item = &RawDeclaration> {
        self.declarations
            .iter()
            .filter(|d| d.key == AnnotationKey::Generation)
    }

    /// Declarations of every lineage key that appears more than once.
    ///
    /// Empty for a clean document. Any non-empty result has at least two
    /// entries.
    #[must_use]
    pub fn conflicts(&self) -> Vec<&RawDeclaration> {
        let mut out = Vec::new();
        if self.parent_declarations().count() > 1 {
            out.extend(self.parent_declarations());
        }
        if self.generation_declarations().count() > 1 {
            out.extend(self.generation_declarations());
        }
        out
    }

    /// Parents from the first `PARENTS` annotation
    #[must_use]
    pub fn multi_parent_declaration(&self) -> Option<Vec<String>> {
        self.first_parent_list(AnnotationKey::Parents)
    }

    /// Parents from the first `PARENT` annotation
    #[must_use]
    pub fn single_parent_declaration(&self) -> Option<Vec<String>> {
        self.first_parent_list(AnnotationKey::Parent)
    }

    fn first_parent_list(&self, key: AnnotationKey) -> Option<Vec<String>> {
        let decl = self.declarations.iter().find(|d| d.key == key)?;
        let unique: IndexSet<&str> = split_parents(&decl.value).collect();
        if unique.is_empty() {
            return None;
        }
        Some(unique.into_iter().map(str::to_string).collect())
    }
}

/// `data_eng_v2.html` → `Data Eng V2`
fn name_from_filename(filename: &str) -> String {
    let stem = filename
        .rsplit_once('.')
        .map_or(filename, |(stem, _)| stem);
    stem.replace('_', " ")
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                None => String::new(),
                Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
