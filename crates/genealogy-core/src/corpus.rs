//! In-memory snapshot of every document the engine knows about
//!
//! Loaded fresh from a [`DocumentStore`] for each analysis. Nothing here is
//! shared between runs.

use crate::config::GenealogyConfig;
use crate::error::Result;
use chrono::{DateTime, Utc};
use genealogy_store::{Collection, DocumentStore, VariantRecord};
use std::collections::BTreeMap;

/// One loaded document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Parsed annotations
    pub record: VariantRecord,
    /// Root template: no parents, generation 0
    pub is_template: bool,
    /// Storage creation time, when available
    pub created: Option<DateTime<Utc>>,
}

/// All documents keyed by filename
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    entries: BTreeMap<String, Entry>,
    duplicates: Vec<String>,
}

impl Corpus {
    /// Create empty corpus
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read both collections from `store`.
    ///
    /// Per-document read failures become unreadable records. Only a
    /// failure to list a collection is returned as an error.
    ///
    /// # Errors
    /// Listing either collection failed
    pub fn load<S: DocumentStore + ?Sized>(store: &S, config: &GenealogyConfig) -> Result<Self> {
        let mut corpus = Self::new();

        for name in store.list(Collection::Templates)? {
            let record = read_record(store, Collection::Templates, &name);
            let created = created(store, Collection::Templates, &name);
            corpus.insert_template_at(record, created);
        }

        for name in store.list(Collection::Variants)? {
            let record = read_record(store, Collection::Variants, &name);
            let created = created(store, Collection::Variants, &name);
            if config.templates.contains(&name) {
                corpus.insert_template_at(record, created);
            } else {
                corpus.insert_variant_at(record, created);
            }
        }

        tracing::debug!(
            templates = corpus.templates().count(),
            variants = corpus.variants().count(),
            "loaded corpus"
        );
        Ok(corpus)
    }

    /// Add a root template
    pub fn insert_template(&mut self, record: VariantRecord) {
        self.insert_template_at(record, None);
    }

    /// Add a variant. A template with the same name wins.
    pub fn insert_variant(&mut self, record: VariantRecord) {
        self.insert_variant_at(record, None);
    }

    fn insert_template_at(&mut self, record: VariantRecord, created: Option<DateTime<Utc>>) {
        let name = record.filename.clone();
        if let Some(existing) = self.entries.get(&name) {
            if existing.is_template {
                self.duplicates.push(name);
                return;
            }
            self.duplicates.push(name.clone());
        }
        self.entries.insert(
            name,
            Entry {
                record,
                is_template: true,
                created,
            },
        );
    }

    fn insert_variant_at(&mut self, record: VariantRecord, created: Option<DateTime<Utc>>) {
        let name = record.filename.clone();
        if self.entries.contains_key(&name) {
            tracing::warn!("{name} exists as both template and variant; keeping the template");
            self.duplicates.push(name);
            return;
        }
        self.entries.insert(
            name,
            Entry {
                record,
                is_template: false,
                created,
            },
        );
    }

    /// Entry by filename
    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Entry> {
        self.entries.get(name)
    }

    /// Whether a filename is known
    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Whether a filename is a known template
    #[inline]
    #[must_use]
    pub fn is_template(&self, name: &str) -> bool {
        self.entries.get(name).is_some_and(|e| e.is_template)
    }

    /// All entries, sorted by filename
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Entry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Template entries, sorted by filename
    pub fn templates(&self) -> impl Iterator<Item = &Entry> {
        self.entries.values().filter(|e| e.is_template)
    }

    /// Non-template entries, sorted by filename
    pub fn variants(&self) -> impl Iterator<Item = &Entry> {
        self.entries.values().filter(|e| !e.is_template)
    }

    /// Names seen in more than one place
    #[must_use]
    pub fn duplicates(&self) -> &[String] {
        &self.duplicates
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn read_record<S: DocumentStore + ?Sized>(store: &S, collection: Collection, name: &str) -> VariantRecord {
    match store.read(collection, name) {
        Ok(text) => VariantRecord::parse(name, &text),
        Err(e) => {
            tracing::warn!("error reading {name}: {e}");
            VariantRecord::unreadable(name, e)
        }
    }
}

fn created<S: DocumentStore + ?Sized>(
    store: &S,
    collection: Collection,
    name: &str,
) -> Option<DateTime<Utc>> {
    store
        .created(collection, name)
        .map_err(|e| tracing::debug!("no creation time for {name}: {e}"))
        .ok()
}
