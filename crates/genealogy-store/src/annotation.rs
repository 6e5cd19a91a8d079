//! Inline annotation syntax
//!
//! Annotations are single-line HTML comments of the form
//! `<!-- KEY: value -->`. They are found by pattern match, not by parsing the
//! document, so any number of them (including contradictory ones) can be
//! collected from one file.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Comment token that opens an annotation
pub const START_TOKEN: &str = "<!--";

/// Comment token that closes an annotation
pub const END_TOKEN: &str = "-->";

static ANNOTATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<!--\s*([A-Z_]+):\s*(.*?)\s*-->").expect("annotation pattern is valid")
});

/// Keys understood by the genealogy engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnnotationKey {
    /// Single (linear) parent
    Parent,
    /// Comma-separated parent list (hybrid)
    Parents,
    /// Base-10 generation number
    Generation,
    /// Focus/type tag for display
    VariantType,
    /// Free-text description for display
    VariantDesc,
    /// What a hybrid combines
    HybridFeatures,
    /// Targeted job title
    JobTitle,
    /// Targeted company
    JobCompany,
    /// Authoring date
    Generated,
}

impl AnnotationKey {
    /// Every recognised key
    pub const ALL: [AnnotationKey; 9] = [
        Self::Parent,
        Self::Parents,
        Self::Generation,
        Self::VariantType,
        Self::VariantDesc,
        Self::HybridFeatures,
        Self::JobTitle,
        Self::JobCompany,
        Self::Generated,
    ];

    /// Keys that carry lineage and are rewritten by repair
    pub const LINEAGE: [AnnotationKey; 3] = [Self::Parent, Self::Parents, Self::Generation];

    /// Key as it appears in documents
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Parent => "PARENT",
            Self::Parents => "PARENTS",
            Self::Generation => "GENERATION",
            Self::VariantType => "VARIANT_TYPE",
            Self::VariantDesc => "VARIANT_DESC",
            Self::HybridFeatures => "HYBRID_FEATURES",
            Self::JobTitle => "JOB_TITLE",
            Self::JobCompany => "JOB_COMPANY",
            Self::Generated => "GENERATED",
        }
    }

    /// Whether this key declares parents
    #[inline]
    #[must_use]
    pub fn is_parent_key(self) -> bool {
        matches!(self, Self::Parent | Self::Parents)
    }

    /// Render a full annotation for this key
    #[must_use]
    pub fn render(self, value: &str) -> String {
        format!("{START_TOKEN} {}: {value} {END_TOKEN}", self.as_str())
    }
}

impl fmt::Display for AnnotationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnnotationKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| format!("unknown annotation key: {s}"))
    }
}

/// One annotation exactly as found in a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawDeclaration {
    pub key: AnnotationKey,
    /// Trimmed value text
    pub value: String,
    /// Byte offset of the opening token
    pub offset: usize,
}

impl fmt::Display for RawDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.key, self.value)
    }
}

/// Collect every recognised annotation in document order.
///
/// Unknown keys are ignored. Nothing is deduplicated here.
#[must_use]
pub fn scan(text: &str) -> Vec<RawDeclaration> {
    ANNOTATION
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let key = caps.get(1)?.as_str().parse::<AnnotationKey>().ok()?;
            Some(RawDeclaration {
                key,
                value: caps.get(2).map_or("", |m| m.as_str()).trim().to_string(),
                offset: whole.start(),
            })
        })
        .collect()
}

/// Split a parent value on commas, dropping empty pieces.
pub fn split_parents(value: &str) -> impl Iterator<Item = &str> {
    value.split(',').map(str::trim).filter(|p| !p.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scans_in_document_order() {
        let text = "<!-- GENERATION: 2 -->\n<!-- PARENT: a.html -->\n<!-- PARENTS: b.html, c.html -->";
        let found = scan(text);
        let keys: Vec<_> = found.iter().map(|d| d.key).collect();
        assert_eq!(
            keys,
            vec![AnnotationKey::Generation, AnnotationKey::Parent, AnnotationKey::Parents]
        );
        assert_eq!(found[2].value, "b.html, c.html");
    }

    #[test]
    fn parent_pattern_does_not_swallow_parents() {
        let found = scan("<!-- PARENTS: x.html -->");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].key, AnnotationKey::Parents);
    }

    #[test]
    fn ignores_unknown_keys_and_plain_comments() {
        let found = scan("<!-- TODO: later -->\n<!-- just a comment -->\n<!-- JOB_TITLE:  SRE  -->");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].key, AnnotationKey::JobTitle);
        assert_eq!(found[0].value, "SRE");
    }

    #[test]
    fn tolerates_missing_inner_whitespace() {
        let found = scan("<!--PARENT:a.html-->");
        assert_eq!(found[0].value, "a.html");
    }

    #[test]
    fn split_drops_empty_pieces() {
        let parts: Vec<_> = split_parents(" a.html, ,b.html ,").collect();
        assert_eq!(parts, vec!["a.html", "b.html"]);
    }

    #[test]
    fn key_roundtrips_through_str() {
        for key in AnnotationKey::ALL {
            assert_eq!(key.as_str().parse::<AnnotationKey>().unwrap(), key);
        }
    }

    #[test]
    fn render_matches_scan() {
        let rendered = AnnotationKey::Generation.render("4");
        assert_eq!(rendered, "<!-- GENERATION: 4 -->");
        assert_eq!(scan(&rendered)[0].value, "4");
    }
}
