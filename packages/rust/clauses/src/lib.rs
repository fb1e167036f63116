//! Clause lookup: static text fragments addressed by key.
//!
//! A key is either `category/service-name` (a service clause) or a bare name
//! for shared boilerplate (`service_provider`, `bank_details`). Stores sit
//! behind the [`ClauseStore`] trait so the filesystem layout can be swapped for
//! an embedded bundle without touching the assembler.

pub mod bundle;
pub mod legal;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use contractgen_shared::{ContractGenError, Result};

pub use legal::{LegalFramework, LegalFrameworkResolver};

/// Key of the service-provider boilerplate clause.
pub const SERVICE_PROVIDER_KEY: &str = "service_provider";

/// Key of the bank-details boilerplate clause.
pub const BANK_DETAILS_KEY: &str = "bank_details";

/// File extension of clause files on disk.
const CLAUSE_EXTENSION: &str = "txt";

// ---------------------------------------------------------------------------
// ClauseStore
// ---------------------------------------------------------------------------

/// Read-only key → text lookup.
pub trait ClauseStore: Send + Sync {
    /// Load the clause text for `key`. `Ok(None)` on a miss.
    fn load(&self, key: &str) -> Result<Option<String>>;

    /// Service names available under `category`, sorted.
    fn keys(&self, category: &str) -> Vec<String>;

    /// Load the clause for `key`, degrading misses and read failures to "".
    fn load_or_empty(&self, key: &str) -> String {
        match self.load(key) {
            Ok(Some(text)) => text,
            Ok(None) => {
                let err = ContractGenError::ClauseMissing {
                    key: key.to_string(),
                };
                debug!(error = %err, "substituting empty clause");
                String::new()
            }
            Err(e) => {
                warn!(key, error = %e, "clause read failed, substituting empty clause");
                String::new()
            }
        }
    }
}

/// Reject keys that could escape the store root or address nothing.
fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .split('/')
            .all(|seg| !seg.is_empty() && seg != "." && seg != ".." && !seg.contains('\\'))
}

// ---------------------------------------------------------------------------
// Filesystem store
// ---------------------------------------------------------------------------

/// Clause store reading `<root>/<key>.txt`.
#[derive(Debug, Clone)]
pub struct FsClauseStore {
    root: PathBuf,
}

impl FsClauseStore {
    /// Create a store rooted at `root`. The directory need not exist yet.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The directory this store reads from.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.{CLAUSE_EXTENSION}"))
    }
}

impl ClauseStore for FsClauseStore {
    fn load(&self, key: &str) -> Result<Option<String>> {
        if !is_valid_key(key) {
            debug!(key, "rejecting malformed clause key");
            return Ok(None);
        }

        let path = self.path_for(key);
        match std::fs::read_to_string(&path) {
            Ok(text) => {
                debug!(key, bytes = text.len(), "loaded clause");
                Ok(Some(text))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ContractGenError::io(path, e)),
        }
    }

    fn keys(&self, category: &str) -> Vec<String> {
        if !is_valid_key(category) {
            return Vec::new();
        }

        let dir = self.root.join(category);
        let Ok(entries) = std::fs::read_dir(&dir) else {
            return Vec::new();
        };

        let mut names: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.extension()
                    .is_some_and(|ext| ext == CLAUSE_EXTENSION)
            })
            .filter_map(|path| {
                path.file_stem()
                    .map(|stem| stem.to_string_lossy().to_string())
            })
            .collect();
        names.sort();
        names
    }
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// Clause store backed by a map, for embedded bundles and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryClauseStore {
    clauses: BTreeMap<String, String>,
}

impl MemoryClauseStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a clause, builder style.
    pub fn with(mut self, key: impl Into<String>, text: impl Into<String>) -> Self {
        self.insert(key, text);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, text: impl Into<String>) {
        self.clauses.insert(key.into(), text.into());
    }

    /// Iterate over `(key, text)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.clauses.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Write every clause to `<root>/<key>.txt`, creating directories.
    ///
    /// Existing files are left alone unless `overwrite` is set. Returns the
    /// number of files written.
    pub fn write_to(&self, root: &Path, overwrite: bool) -> Result<usize> {
        let store = FsClauseStore::new(root);
        let mut written = 0;
        for (key, text) in self.iter() {
            let path = store.path_for(key);
            if path.exists() && !overwrite {
                debug!(path = %path.display(), "clause exists, keeping");
                continue;
            }
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| ContractGenError::io(parent, e))?;
            }
            std::fs::write(&path, text).map_err(|e| ContractGenError::io(&path, e))?;
            written += 1;
        }
        Ok(written)
    }
}

impl ClauseStore for MemoryClauseStore {
    fn load(&self, key: &str) -> Result<Option<String>> {
        Ok(self.clauses.get(key).cloned())
    }

    fn keys(&self, category: &str) -> Vec<String> {
        let prefix = format!("{category}/");
        self.clauses
            .keys()
            .filter_map(|k| k.strip_prefix(&prefix))
            .filter(|rest| !rest.contains('/'))
            .map(str::to_string)
            .collect()
    }
}
