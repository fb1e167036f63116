//! Rendered document storage.
//!
//! Blobs are named `contract_<file_id>.<ext>`; the DOCX and PDF of one
//! generation share a file id.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use contractgen_shared::{ContractGenError, DocumentFormat, FileId, Result};

/// Storage for rendered documents keyed by file id and format.
pub trait BlobStore: Send + Sync {
    /// Store `bytes`, replacing any previous blob, and return its location.
    fn put(&self, file_id: &FileId, format: DocumentFormat, bytes: &[u8]) -> Result<PathBuf>;

    /// Fetch a stored blob. Fails with `BlobNotFound` when absent.
    fn get(&self, file_id: &FileId, format: DocumentFormat) -> Result<Vec<u8>>;

    /// Remove a blob. Returns whether something was removed.
    fn delete(&self, file_id: &FileId, format: DocumentFormat) -> bool;
}

/// Blob file name for one artifact.
pub fn blob_name(file_id: &FileId, format: DocumentFormat) -> String {
    format!("contract_{file_id}.{}", format.extension())
}

/// Lowercase hex SHA-256 of `bytes`.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Blob store backed by a flat directory.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    /// Use `root` as the output directory, creating it if needed.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|e| ContractGenError::io(&root, e))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, file_id: &FileId, format: DocumentFormat) -> PathBuf {
        self.root.join(blob_name(file_id, format))
    }
}

impl BlobStore for FsBlobStore {
    fn put(&self, file_id: &FileId, format: DocumentFormat, bytes: &[u8]) -> Result<PathBuf> {
        let path = self.path_for(file_id, format);
        std::fs::write(&path, bytes).map_err(|e| ContractGenError::io(&path, e))?;
        debug!(path = %path.display(), size = bytes.len(), "blob written");
        Ok(path)
    }

    fn get(&self, file_id: &FileId, format: DocumentFormat) -> Result<Vec<u8>> {
        let path = self.path_for(file_id, format);
        match std::fs::read(&path) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(ContractGenError::BlobNotFound {
                    file_id: file_id.to_string(),
                    format: format.to_string(),
                })
            }
            Err(e) => Err(ContractGenError::io(&path, e)),
        }
    }

    fn delete(&self, file_id: &FileId, format: DocumentFormat) -> bool {
        let path = self.path_for(file_id, format);
        match std::fs::remove_file(&path) {
            Ok(()) => {
                debug!(path = %path.display(), "blob deleted");
                true
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to delete blob");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn store() -> FsBlobStore {
        let root = std::env::temp_dir().join(format!("cg_blobs_{}", Uuid::now_v7()));
        FsBlobStore::open(root).unwrap()
    }

    #[test]
    fn put_get_delete() {
        let store = store();
        let id = FileId::new();

        let path = store.put(&id, DocumentFormat::Pdf, b"%PDF-1.3").unwrap();
        assert_eq!(
            path.file_name().unwrap().to_string_lossy(),
            format!("contract_{id}.pdf")
        );
        assert_eq!(store.get(&id, DocumentFormat::Pdf).unwrap(), b"%PDF-1.3");

        assert!(store.delete(&id, DocumentFormat::Pdf));
        assert!(!store.delete(&id, DocumentFormat::Pdf));

        let _ = std::fs::remove_dir_all(store.root());
    }

    #[test]
    fn formats_are_separate_blobs() {
        let store = store();
        let id = FileId::new();
        store.put(&id, DocumentFormat::Docx, b"docx").unwrap();

        let err = store.get(&id, DocumentFormat::Pdf).unwrap_err();
        assert!(matches!(err, ContractGenError::BlobNotFound { .. }));

        let _ = std::fs::remove_dir_all(store.root());
    }

    #[test]
    fn sha256_of_empty_input() {
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
