//! Testing utilities for the genealogy workspace
//!
//! Document builders and corpus fixtures over the in-memory and on-disk
//! stores.

#![allow(missing_docs)]

use genealogy_store::{Collection, DocumentStore, FsStore, MemoryStore};
use std::path::PathBuf;
use tempfile::TempDir;

/// Builds an HTML variant document with inline annotations
#[derive(Debug, Clone)]
pub struct Doc {
    title: String,
    annotations: Vec<(String, String)>,
    head: bool,
    body: String,
}

impl Doc {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            annotations: Vec::new(),
            head: true,
            body: "<h1>Experience</h1>".to_string(),
        }
    }

    #[must_use]
    pub fn annotation(mut self, key: &str, value: &str) -> Self {
        self.annotations.push((key.to_string(), value.to_string()));
        self
    }

    #[must_use]
    pub fn parent(self, parent: &str) -> Self {
        self.annotation("PARENT", parent)
    }

    #[must_use]
    pub fn parents(self, parents: &[&str]) -> Self {
        self.annotation("PARENTS", &parents.join(", "))
    }

    #[must_use]
    pub fn generation(self, generation: u32) -> Self {
        self.annotation("GENERATION", &generation.to_string())
    }

    /// Drop the `<head>` element so writes have no anchor
    #[must_use]
    pub fn without_head(mut self) -> Self {
        self.head = false;
        self
    }

    #[must_use]
    pub fn body(mut self, body: &str) -> Self {
        self.body = body.to_string();
        self
    }

    pub fn build(&self) -> String {
        let mut out = String::from("<!DOCTYPE html>\n<html>\n");
        if self.head {
            out.push_str("<head>\n");
        }
        for (key, value) in &self.annotations {
            out.push_str(&format!("    <!-- {key}: {value} -->\n"));
        }
        out.push_str(&format!("    <title>{} - Resume</title>\n", self.title));
        if self.head {
            out.push_str("</head>\n");
        }
        out.push_str(&format!("<body>\n{}\n</body>\n</html>\n", self.body));
        out
    }
}

/// Plain template document
pub fn template_doc(title: &str) -> String {
    Doc::new(title).build()
}

/// Collection of documents to load into a store
#[derive(Debug, Clone, Default)]
pub struct CorpusBuilder {
    docs: Vec<(Collection, String, String)>,
}

impl CorpusBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Corpus with the two default base templates
    pub fn with_default_templates() -> Self {
        Self::new()
            .template("base_resume.html")
            .template("base_resume_v2.html")
    }

    #[must_use]
    pub fn template(mut self, name: &str) -> Self {
        self.docs
            .push((Collection::Templates, name.to_string(), template_doc("Base")));
        self
    }

    #[must_use]
    pub fn variant(mut self, name: &str, doc: Doc) -> Self {
        self.docs.push((Collection::Variants, name.to_string(), doc.build()));
        self
    }

    #[must_use]
    pub fn raw(mut self, collection: Collection, name: &str, text: &str) -> Self {
        self.docs.push((collection, name.to_string(), text.to_string()));
        self
    }

    pub fn memory(&self) -> MemoryStore {
        let store = MemoryStore::new();
        for (collection, name, text) in &self.docs {
            store.insert(*collection, name, text);
        }
        store
    }

    /// Write to a fresh temporary workspace. Keep the `TempDir` alive for
    /// as long as the store is used.
    pub fn on_disk(&self) -> (TempDir, FsStore) {
        let dir = TempDir::new().unwrap();
        let store = FsStore::new(
            dir.path().join("variants"),
            dir.path().join("templates"),
            "html",
        );
        for (collection, name, text) in &self.docs {
            store.write(*collection, name, text).unwrap();
        }
        (dir, store)
    }
}

/// Variant text currently in a memory store
pub fn read_variant(store: &MemoryStore, name: &str) -> String {
    store.contents(Collection::Variants, name).unwrap()
}

/// Path of a variant inside an on-disk fixture
pub fn variant_path(dir: &TempDir, name: &str) -> PathBuf {
    dir.path().join("variants").join(name)
}
