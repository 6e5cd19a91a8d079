//! Engine configuration
//!
//! Defaults match the usual workspace layout (`variants/`, `templates/`,
//! HTML documents, two base résumé templates). An optional
//! `genealogy.toml` at the workspace root overrides any field.

use crate::error::{GenealogyError, Result};
use genealogy_store::FsStore;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the optional per-workspace configuration file
pub const CONFIG_FILE: &str = "genealogy.toml";

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GenealogyConfig {
    /// Variant directory, relative to the workspace root
    pub variants_dir: PathBuf,
    /// Template directory, relative to the workspace root
    pub templates_dir: PathBuf,
    /// Document extension without the dot
    pub extension: String,
    /// Canonical blocks are inserted right after this marker
    pub head_marker: String,
    /// Well-known root templates
    pub templates: TemplateNames,
    /// Default-parent policy for variants without lineage annotations
    pub fallback: FallbackPolicy,
}

impl GenealogyConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With a different head marker
    #[must_use]
    pub fn with_head_marker(mut self, marker: impl Into<String>) -> Self {
        self.head_marker = marker.into();
        self
    }

    /// With different template names
    #[must_use]
    pub fn with_templates(mut self, primary: impl Into<String>, secondary: impl Into<String>) -> Self {
        self.templates = TemplateNames {
            primary: primary.into(),
            secondary: secondary.into(),
        };
        self
    }

    /// With a replacement fallback policy
    #[must_use]
    pub fn with_fallback(mut self, fallback: FallbackPolicy) -> Self {
        self.fallback = fallback;
        self
    }

    /// With the fallback heuristic turned off
    #[inline]
    #[must_use]
    pub fn without_fallback(mut self) -> Self {
        self.fallback.enabled = false;
        self
    }

    /// With different collection directories
    #[must_use]
    pub fn with_dirs(mut self, variants: impl Into<PathBuf>, templates: impl Into<PathBuf>) -> Self {
        self.variants_dir = variants.into();
        self.templates_dir = templates.into();
        self
    }

    /// Parse configuration text
    ///
    /// # Errors
    /// [`GenealogyError::Config`] on invalid TOML or unknown fields
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| GenealogyError::config(format!("failed to parse: {e}")))
    }

    /// Load a configuration file that must exist
    ///
    /// # Errors
    /// [`GenealogyError::Config`] if the file cannot be read or parsed
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| GenealogyError::config(format!("failed to read {}: {e}", path.display())))?;
        toml::from_str(&contents)
            .map_err(|e| GenealogyError::config(format!("failed to parse {}: {e}", path.display())))
    }

    /// Load `genealogy.toml` from a workspace root, or defaults if absent
    ///
    /// # Errors
    /// [`GenealogyError::Config`] if the file exists but is invalid
    pub fn discover(workspace: &Path) -> Result<Self> {
        let path = workspace.join(CONFIG_FILE);
        if !path.exists() {
            tracing::debug!("no {CONFIG_FILE} in {}, using defaults", workspace.display());
            return Ok(Self::default());
        }
        Self::load(&path)
    }

    /// Filesystem store rooted at `workspace`
    #[must_use]
    pub fn fs_store(&self, workspace: &Path) -> FsStore {
        FsStore::new(
            workspace.join(&self.variants_dir),
            workspace.join(&self.templates_dir),
            self.extension.clone(),
        )
    }
}

impl Default for GenealogyConfig {
    fn default() -> Self {
        Self {
            variants_dir: PathBuf::from("variants"),
            templates_dir: PathBuf::from("templates"),
            extension: "html".to_string(),
            head_marker: "<head>".to_string(),
            templates: TemplateNames::default(),
            fallback: FallbackPolicy::default(),
        }
    }
}

/// The two well-known base templates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TemplateNames {
    /// Default parent for undeclared variants
    pub primary: String,
    /// Parent selected by fallback rules
    pub secondary: String,
}

impl TemplateNames {
    /// Filename a reference points at
    #[must_use]
    pub fn resolve<'a>(&'a self, target: &'a TemplateRef) -> &'a str {
        match target {
            TemplateRef::Primary => &self.primary,
            TemplateRef::Secondary => &self.secondary,
            TemplateRef::Named(name) => name,
        }
    }

    /// Whether `name` is one of the configured templates
    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.primary == name || self.secondary == name
    }
}

impl Default for TemplateNames {
    fn default() -> Self {
        Self {
            primary: "base_resume.html".to_string(),
            secondary: "base_resume_v2.html".to_string(),
        }
    }
}

/// Template a fallback rule points at
///
/// In TOML: `"primary"`, `"secondary"`, or any other string taken as a
/// filename.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateRef {
    /// [`TemplateNames::primary`]
    Primary,
    /// [`TemplateNames::secondary`]
    Secondary,
    /// Explicit filename
    #[serde(untagged)]
    Named(String),
}

/// Filename-substring rule for the fallback heuristic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FallbackRule {
    /// Substring searched for in the variant filename
    pub contains: String,
    /// Parent assigned on match
    pub parent: TemplateRef,
}

impl FallbackRule {
    /// Create a rule
    pub fn new(contains: impl Into<String>, parent: TemplateRef) -> Self {
        Self {
            contains: contains.into(),
            parent,
        }
    }
}

/// Default-parent policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FallbackPolicy {
    /// When false, undeclared variants have no parent at all
    pub enabled: bool,
    /// Checked in order; first match wins
    pub rules: Vec<FallbackRule>,
}

impl FallbackPolicy {
    /// Policy that never assigns a parent
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            rules: Vec::new(),
        }
    }

    /// With an extra rule appended
    #[must_use]
    pub fn with_rule(mut self, rule: FallbackRule) -> Self {
        self.rules.push(rule);
        self
    }
}

impl Default for FallbackPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            rules: vec![FallbackRule::new("optimal", TemplateRef::Secondary)],
        }
    }
}
