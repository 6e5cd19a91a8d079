//! Canonical metadata block (write contract)
//!
//! Repair never edits annotations in place. It strips every lineage
//! annotation from the document and inserts one clean block right after the
//! head marker. Each block line is written as `\n` + indent + annotation,
//! and stripping removes exactly that shape, so applying the same block twice
//! yields the same text.

use crate::annotation::AnnotationKey;
use crate::error::MetadataError;
use indexmap::IndexSet;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

static STRIPPABLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:\r?\n)?[ \t]*<!--\s*([A-Z_]+):.*?-->").expect("strip pattern is valid")
});

const INDENT: &str = "    ";

/// Canonical parent declaration
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "parents", rename_all = "snake_case")]
pub enum ParentSet {
    /// No declared parent
    #[default]
    None,
    /// Linear derivation, written as `PARENT`
    Single(String),
    /// Two or more parents, written as `PARENTS`
    Hybrid(Vec<String>),
}

impl ParentSet {
    /// Build from a list, dropping duplicates and empty names
    #[must_use]
    pub fn from_list<I, S>(parents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let unique: IndexSet<String> = parents
            .into_iter()
            .map(Into::into)
            .filter(|p| !p.trim().is_empty())
            .collect();
        let mut list: Vec<String> = unique.into_iter().collect();
        match list.len() {
            0 => Self::None,
            1 => Self::Single(list.remove(0)),
            _ => Self::Hybrid(list),
        }
    }

    /// Linear parent
    #[must_use]
    pub fn single(parent: impl Into<String>) -> Self {
        Self::Single(parent.into())
    }

    /// Parent names in declaration order
    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        match self {
            Self::None => &[],
            Self::Single(parent) => std::slice::from_ref(parent),
            Self::Hybrid(parents) => parents,
        }
    }

    /// Two or more parents
    #[inline]
    #[must_use]
    pub fn is_hybrid(&self) -> bool {
        matches!(self, Self::Hybrid(_))
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::None)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.as_slice().len()
    }
}

/// One clean block of annotations to insert into a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataBlock {
    pub parents: ParentSet,
    pub generation: u32,
    /// Display annotations written after the lineage lines
    pub extras: Vec<(AnnotationKey, String)>,
}

impl MetadataBlock {
    #[must_use]
    pub fn new(parents: ParentSet, generation: u32) -> Self {
        Self {
            parents,
            generation,
            extras: Vec::new(),
        }
    }

    /// Add a display annotation. Lineage keys are ignored here.
    #[must_use]
    pub fn with_extra(mut self, key: AnnotationKey, value: impl Into<String>) -> Self {
        if !AnnotationKey::LINEAGE.contains(&key) {
            self.extras.retain(|(k, _)| *k != key);
            self.extras.push((key, value.into()));
        }
        self
    }

    /// Annotation lines in write order
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(2 + self.extras.len());
        match &self.parents {
            ParentSet::None => {}
            ParentSet::Single(parent) => lines.push(AnnotationKey::Parent.render(parent)),
            ParentSet::Hybrid(parents) => {
                lines.push(AnnotationKey::Parents.render(&parents.join(", ")));
            }
        }
        lines.push(AnnotationKey::Generation.render(&self.generation.to_string()));
        for (key, value) in &self.extras {
            lines.push(key.render(value));
        }
        lines
    }

    /// Keys this block owns; existing occurrences are removed on write
    fn owned_keys(&self) -> Vec<AnnotationKey> {
        let mut keys = AnnotationKey::LINEAGE.to_vec();
        keys.extend(self.extras.iter().map(|(k, _)| *k));
        keys
    }
}

/// Remove every annotation with one of `keys`, along with the line break and
/// indentation in front of it.
#[must_use]
pub fn strip_annotations(text: &str, keys: &[AnnotationKey]) -> String {
    STRIPPABLE
        .replace_all(text, |caps: &Captures<'_>| {
            let owned = caps[1]
                .parse::<AnnotationKey>()
                .map(|key| keys.contains(&key))
                .unwrap_or(false);
            if owned {
                String::new()
            } else {
                caps[0].to_string()
            }
        })
        .into_owned()
}

/// Replace the document's lineage annotations with `block`.
///
/// # Errors
/// [`MetadataError::MissingAnchor`] if `head_marker` does not occur in the
/// document. The text is left untouched in that case.
pub fn apply_block(
    text: &str,
    block: &MetadataBlock,
    head_marker: &str,
) -> Result<String, MetadataError> {
    let stripped = strip_annotations(text, &block.owned_keys());
    let anchor = stripped
        .find(head_marker)
        .ok_or_else(|| MetadataError::MissingAnchor {
            marker: head_marker.to_string(),
        })?
        + head_marker.len();

    let mut out = String::with_capacity(stripped.len() + 128);
    out.push_str(&stripped[..anchor]);
    for line in block.lines() {
        out.push('\n');
        out.push_str(INDENT);
        out.push_str(&line);
    }
    out.push_str(&stripped[anchor..]);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::VariantRecord;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    const DOC: &str = "<html>\n<head>\n    <title>T</title>\n</head>\n<body></body>\n</html>";

    #[test]
    fn parent_set_normalises_length() {
        assert_eq!(ParentSet::from_list(Vec::<String>::new()), ParentSet::None);
        assert_eq!(ParentSet::from_list(["a", "a"]), ParentSet::single("a"));
        assert!(ParentSet::from_list(["a", "b", "a"]).is_hybrid());
        assert_eq!(ParentSet::from_list(["a", "b", "a"]).len(), 2);
    }

    #[test]
    fn writes_single_parent_block_after_head() {
        let block = MetadataBlock::new(ParentSet::single("base.html"), 1);
        let out = apply_block(DOC, &block, "<head>").unwrap();
        assert_eq!(
            out,
            "<html>\n<head>\n    <!-- PARENT: base.html -->\n    <!-- GENERATION: 1 -->\n    <title>T</title>\n</head>\n<body></body>\n</html>"
        );
    }

    #[test]
    fn hybrid_uses_parents_key() {
        let block = MetadataBlock::new(ParentSet::from_list(["a.html", "b.html"]), 3);
        let out = apply_block(DOC, &block, "<head>").unwrap();
        assert!(out.contains("<!-- PARENTS: a.html, b.html -->"));
        assert!(!out.contains("<!-- PARENT: "));
    }

    #[test]
    fn rootless_block_has_generation_only() {
        let block = MetadataBlock::new(ParentSet::None, 1);
        let out = apply_block(DOC, &block, "<head>").unwrap();
        let record = VariantRecord::parse("x.html", &out);
        assert!(record.parents.is_empty());
        assert_eq!(record.stored_generation, Some(1));
    }

    #[test]
    fn removes_every_conflicting_declaration() {
        let messy = "<head>\n<!-- PARENT: a.html -->\n<!-- GENERATION: 7 -->\n<title>x</title>\n<!-- PARENTS: b.html, c.html -->\n<!-- GENERATION: 2 -->\n</head>";
        let block = MetadataBlock::new(ParentSet::from_list(["b.html", "c.html"]), 4);
        let out = apply_block(messy, &block, "<head>").unwrap();
        let record = VariantRecord::parse("x.html", &out);
        assert!(record.conflicts().is_empty());
        assert_eq!(record.parent_declarations().count(), 1);
        assert_eq!(record.generation_declarations().count(), 1);
        assert_eq!(record.stored_generation, Some(4));
    }

    #[test]
    fn missing_anchor_is_an_error() {
        let block = MetadataBlock::new(ParentSet::single("a.html"), 1);
        let err = apply_block("<html><body></body></html>", &block, "<head>").unwrap_err();
        assert_eq!(
            err,
            MetadataError::MissingAnchor {
                marker: "<head>".to_string()
            }
        );
    }

    #[test]
    fn display_annotations_survive_lineage_rewrite() {
        let doc = "<head>\n    <!-- VARIANT_TYPE: ml -->\n    <!-- PARENT: a.html -->\n</head>";
        let block = MetadataBlock::new(ParentSet::single("b.html"), 2);
        let out = apply_block(doc, &block, "<head>").unwrap();
        assert!(out.contains("<!-- VARIANT_TYPE: ml -->"));
        assert!(!out.contains("a.html"));
    }

    #[test]
    fn extras_replace_existing_values() {
        let doc = "<head>\n    <!-- JOB_TITLE: Old -->\n</head>";
        let block = MetadataBlock::new(ParentSet::single("a.html"), 1)
            .with_extra(AnnotationKey::JobTitle, "New");
        let out = apply_block(doc, &block, "<head>").unwrap();
        let record = VariantRecord::parse("x.html", &out);
        assert_eq!(record.display.job_title.as_deref(), Some("New"));
        assert_eq!(out.matches("JOB_TITLE").count(), 1);
    }

    #[test]
    fn with_extra_ignores_lineage_keys() {
        let block = MetadataBlock::new(ParentSet::None, 1).with_extra(AnnotationKey::Generation, "9");
        assert!(block.extras.is_empty());
    }

    proptest! {
        #[test]
        fn applying_twice_is_a_fixed_point(
            before in "[a-z \n]{0,40}",
            after in "[a-z \n]{0,40}",
            generation in 0u32..50,
            hybrid in any::<bool>(),
        ) {
            let doc = format!("{before}<head>{after}");
            let parents = if hybrid {
                ParentSet::from_list(["p1.html", "p2.html"])
            } else {
                ParentSet::single("p1.html")
            };
            let block = MetadataBlock::new(parents, generation);
            let once = apply_block(&doc, &block, "<head>").unwrap();
            let twice = apply_block(&once, &block, "<head>").unwrap();
            prop_assert_eq!(&once, &twice);
            prop_assert_eq!(strip_annotations(&once, &AnnotationKey::LINEAGE), doc);
        }
    }
}
