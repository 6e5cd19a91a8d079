//! Document storage
//!
//! The engine needs four things from storage: list names, read by name,
//! write by name, and a creation timestamp. [`FsStore`] serves two
//! directories on disk; [`MemoryStore`] keeps everything in memory.

use crate::error::{StoreError, StoreResult};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// The two document sets the engine reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    /// Derived résumé documents
    Variants,
    /// Root base templates
    Templates,
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Variants => f.write_str("variants"),
            Self::Templates => f.write_str("templates"),
        }
    }
}

/// Named text documents grouped into collections
pub trait DocumentStore {
    /// Names in the collection, sorted
    ///
    /// # Errors
    /// Storage failure while listing
    fn list(&self, collection: Collection) -> StoreResult<Vec<String>>;

    /// Full text of a document
    ///
    /// # Errors
    /// Missing, unreadable or undecodable document
    fn read(&self, collection: Collection, name: &str) -> StoreResult<String>;

    /// Replace (or create) a document
    ///
    /// # Errors
    /// Storage failure while writing
    fn write(&self, collection: Collection, name: &str, contents: &str) -> StoreResult<()>;

    /// When the document was created
    ///
    /// # Errors
    /// Missing document or unavailable metadata
    fn created(&self, collection: Collection, name: &str) -> StoreResult<DateTime<Utc>>;

    /// Whether a document exists
    fn exists(&self, collection: Collection, name: &str) -> bool {
        self.list(collection)
            .map(|names| names.iter().any(|n| n == name))
            .unwrap_or(false)
    }

    /// Create a new document, refusing to overwrite
    ///
    /// # Errors
    /// [`StoreError::AlreadyExists`] or a write failure
    fn create(&self, collection: Collection, name: &str, contents: &str) -> StoreResult<()> {
        if self.exists(collection, name) {
            return Err(StoreError::AlreadyExists {
                collection,
                name: name.to_string(),
            });
        }
        self.write(collection, name, contents)
    }
}

fn check_name(name: &str) -> StoreResult<()> {
    let bad = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\');
    if bad {
        return Err(StoreError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// Two directories on the local filesystem
#[derive(Debug, Clone)]
pub struct FsStore {
    variants_dir: PathBuf,
    templates_dir: PathBuf,
    extension: String,
}

impl FsStore {
    /// Serve `variants_dir` and `templates_dir`, listing only files with
    /// `extension` (without the dot)
    pub fn new(
        variants_dir: impl Into<PathBuf>,
        templates_dir: impl Into<PathBuf>,
        extension: impl Into<String>,
    ) -> Self {
        Self {
            variants_dir: variants_dir.into(),
            templates_dir: templates_dir.into(),
            extension: extension.into(),
        }
    }

    /// Directory backing a collection
    #[must_use]
    pub fn dir(&self, collection: Collection) -> &Path {
        match collection {
            Collection::Variants => &self.variants_dir,
            Collection::Templates => &self.templates_dir,
        }
    }

    fn path(&self, collection: Collection, name: &str) -> StoreResult<PathBuf> {
        check_name(name)?;
        Ok(self.dir(collection).join(name))
    }

    fn map_io(collection: Collection, name: &str, err: std::io::Error) -> StoreError {
        if err.kind() == std::io::ErrorKind::NotFound {
            StoreError::not_found(collection, name)
        } else {
            StoreError::io_error(name, err)
        }
    }
}

impl DocumentStore for FsStore {
    fn list(&self, collection: Collection) -> StoreResult<Vec<String>> {
        let dir = self.dir(collection);
        if !dir.exists() {
            tracing::debug!("{collection} directory {} does not exist", dir.display());
            return Ok(Vec::new());
        }

        let entries =
            std::fs::read_dir(dir).map_err(|e| StoreError::io_error(dir.display().to_string(), e))?;
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::io_error(dir.display().to_string(), e))?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let matches_ext = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e == self.extension);
            if !matches_ext {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    fn read(&self, collection: Collection, name: &str) -> StoreResult<String> {
        let path = self.path(collection, name)?;
        let bytes = std::fs::read(&path).map_err(|e| Self::map_io(collection, name, e))?;
        String::from_utf8(bytes).map_err(|source| StoreError::Decode {
            name: name.to_string(),
            source,
        })
    }

    fn write(&self, collection: Collection, name: &str, contents: &str) -> StoreResult<()> {
        let path = self.path(collection, name)?;
        std::fs::create_dir_all(self.dir(collection))
            .map_err(|e| StoreError::io_error(name, e))?;
        std::fs::write(&path, contents).map_err(|e| StoreError::io_error(name, e))
    }

    fn created(&self, collection: Collection, name: &str) -> StoreResult<DateTime<Utc>> {
        let path = self.path(collection, name)?;
        let meta = std::fs::metadata(&path).map_err(|e| Self::map_io(collection, name, e))?;
        // Not every filesystem records a birth time.
        let time = meta
            .created()
            .or_else(|_| meta.modified())
            .map_err(|e| StoreError::io_error(name, e))?;
        Ok(DateTime::<Utc>::from(time))
    }

    fn exists(&self, collection: Collection, name: &str) -> bool {
        self.path(collection, name).is_ok_and(|p| p.is_file())
    }
}

#[derive(Debug, Clone)]
struct MemoryDocument {
    bytes: Vec<u8>,
    created: DateTime<Utc>,
}

/// In-memory store, mostly for tests and embedding
///
/// Creation timestamps advance one second per inserted document so ordering
/// is deterministic.
#[derive(Debug, Default)]
pub struct MemoryStore {
    docs: RwLock<BTreeMap<(Collection, String), MemoryDocument>>,
    clock: RwLock<i64>,
}

/// First timestamp handed out by [`MemoryStore`]
const MEMORY_EPOCH: i64 = 1_700_000_000;

impl MemoryStore {
    /// Create empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    #[must_use]
    pub fn with_document(self, collection: Collection, name: &str, text: &str) -> Self {
        self.insert(collection, name, text);
        self
    }

    /// Insert or replace a text document
    pub fn insert(&self, collection: Collection, name: &str, text: &str) {
        self.insert_bytes(collection, name, text.as_bytes().to_vec());
    }

    /// Insert raw bytes, which need not be valid UTF-8
    pub fn insert_bytes(&self, collection: Collection, name: &str, bytes: Vec<u8>) {
        let created = self.tick();
        self.docs
            .write()
            .insert((collection, name.to_string()), MemoryDocument { bytes, created });
    }

    /// Delete a document, returning whether it existed
    pub fn remove(&self, collection: Collection, name: &str) -> bool {
        self.docs
            .write()
            .remove(&(collection, name.to_string()))
            .is_some()
    }

    /// Current text of a document, if present and valid UTF-8
    #[must_use]
    pub fn contents(&self, collection: Collection, name: &str) -> Option<String> {
        let docs = self.docs.read();
        let doc = docs.get(&(collection, name.to_string()))?;
        String::from_utf8(doc.bytes.clone()).ok()
    }

    fn tick(&self) -> DateTime<Utc> {
        let mut clock = self.clock.write();
        let secs = MEMORY_EPOCH + *clock;
        *clock += 1;
        DateTime::from_timestamp(secs, 0).unwrap_or_default()
    }
}

impl DocumentStore for MemoryStore {
    fn list(&self, collection: Collection) -> StoreResult<Vec<String>> {
        Ok(self
            .docs
            .read()
            .keys()
            .filter(|(c, _)| *c == collection)
            .map(|(_, name)| name.clone())
            .collect())
    }

    fn read(&self, collection: Collection, name: &str) -> StoreResult<String> {
        let docs = self.docs.read();
        let doc = docs
            .get(&(collection, name.to_string()))
            .ok_or_else(|| StoreError::not_found(collection, name))?;
        String::from_utf8(doc.bytes.clone()).map_err(|source| StoreError::Decode {
            name: name.to_string(),
            source,
        })
    }

    fn write(&self, collection: Collection, name: &str, contents: &str) -> StoreResult<()> {
        check_name(name)?;
        let mut docs = self.docs.write();
        let key = (collection, name.to_string());
        match docs.get_mut(&key) {
            Some(doc) => doc.bytes = contents.as_bytes().to_vec(),
            None => {
                drop(docs);
                self.insert(collection, name, contents);
            }
        }
        Ok(())
    }

    fn created(&self, collection: Collection, name: &str) -> StoreResult<DateTime<Utc>> {
        self.docs
            .read()
            .get(&(collection, name.to_string()))
            .map(|doc| doc.created)
            .ok_or_else(|| StoreError::not_found(collection, name))
    }

    fn exists(&self, collection: Collection, name: &str) -> bool {
        self.docs
            .read()
            .contains_key(&(collection, name.to_string()))
    }
}
