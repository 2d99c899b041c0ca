//! Local filesystem object store
//!
//! Objects are plain files under a root directory; URLs are built from a
//! configured base URL that serves that directory.

use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};

use super::{encode_key, ObjectStore};
use crate::domain::{DomainError, DomainResult};

pub struct FsObjectStore {
    root: PathBuf,
    base_url: String,
}

impl FsObjectStore {
    pub fn new(root: impl Into<PathBuf>, base_url: &str) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Resolve a key to a file under the root; keys may not climb out of it
    fn path_for(&self, key: &str) -> DomainResult<PathBuf> {
        let relative = Path::new(key);
        let clean = !key.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !clean {
            return Err(DomainError::Storage(format!("invalid object key: {}", key)));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    async fn put(&self, key: &str, bytes: &[u8], _content_type: &str) -> DomainResult<String> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;
        log::debug!("stored {} bytes at {}", bytes.len(), path.display());
        Ok(self.public_url(key))
    }

    async fn delete(&self, key: &str) -> DomainResult<()> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url, encode_key(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsObjectStore::new(dir.path(), "http://localhost:8080/files/");

        let url = store
            .put("documentos/a/plan-accion/f/1.pdf", b"%PDF", "application/pdf")
            .await
            .unwrap();
        assert_eq!(url, "http://localhost:8080/files/documentos/a/plan-accion/f/1.pdf");

        let path = dir.path().join("documentos/a/plan-accion/f/1.pdf");
        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF");

        store.delete("documentos/a/plan-accion/f/1.pdf").await.unwrap();
        assert!(!path.exists());
        // Deleting twice is fine
        store.delete("documentos/a/plan-accion/f/1.pdf").await.unwrap();
    }

    #[tokio::test]
    async fn test_rejects_escaping_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsObjectStore::new(dir.path(), "http://localhost");
        for key in ["../fuera.txt", "/etc/passwd", "a/../../b", ""] {
            let err = store.put(key, b"x", "text/plain").await.unwrap_err();
            assert!(matches!(err, DomainError::Storage(_)), "key {:?}", key);
        }
    }

    #[tokio::test]
    async fn test_signed_url_falls_back_to_public() {
        let store = FsObjectStore::new("/tmp/planes", "http://localhost");
        assert_eq!(
            store.signed_url("a/b c.pdf").await.unwrap(),
            "http://localhost/a/b%20c.pdf"
        );
    }
}
