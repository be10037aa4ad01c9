//! Disk-backed storage for uploaded files (product images and documents,
//! ticket and stock-movement attachments, blog banners). Files are written
//! under a configured root and addressed by a generated key; the public URL
//! is the configured base joined with the key.

use crate::errors::ServiceError;
use std::path::{Path, PathBuf};
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct Storage {
    root: PathBuf,
    base_url: String,
}

impl Storage {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Root directory files are written beneath.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Store raw bytes under `prefix`, keeping the original extension.
    /// Returns the storage key.
    pub async fn put(
        &self,
        prefix: &str,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<String, ServiceError> {
        let key = self.build_key(prefix, file_name)?;
        let path = self.root.join(&key);

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ServiceError::StorageError(format!("creating {parent:?}: {e}")))?;
        }
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| ServiceError::StorageError(format!("writing {path:?}: {e}")))?;

        debug!(key, size = bytes.len(), "stored file");
        Ok(key)
    }

    /// Remove a stored file. Missing files are not an error; deletion is
    /// idempotent.
    pub async fn delete(&self, key: &str) -> Result<(), ServiceError> {
        let path = self.root.join(key);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ServiceError::StorageError(format!("removing {path:?}: {e}"))),
        }
    }

    /// Public URL a stored key is served under.
    pub fn url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url, key)
    }

    fn build_key(&self, prefix: &str, file_name: &str) -> Result<String, ServiceError> {
        let prefix = prefix.trim_matches('/');
        if prefix.is_empty() || prefix.contains("..") {
            return Err(ServiceError::InvalidInput("invalid storage prefix".into()));
        }

        let extension = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        let name = match extension {
            Some(ext) if !ext.is_empty() => format!("{}.{ext}", Uuid::new_v4()),
            _ => Uuid::new_v4().to_string(),
        };
        Ok(format!("{prefix}/{name}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_get_url_and_delete() {
        let dir = std::env::temp_dir().join(format!("storage-test-{}", Uuid::new_v4()));
        let storage = Storage::new(&dir, "/storage/");

        let key = storage
            .put("tickets", "screenshot.PNG", b"fake image bytes")
            .await
            .unwrap();
        assert!(key.starts_with("tickets/"));
        assert!(key.ends_with(".png"));

        let stored = tokio::fs::read(dir.join(&key)).await.unwrap();
        assert_eq!(stored, b"fake image bytes");

        assert_eq!(storage.url(&key), format!("/storage/{key}"));

        storage.delete(&key).await.unwrap();
        // Idempotent
        storage.delete(&key).await.unwrap();

        tokio::fs::remove_dir_all(&dir).await.ok();
    }

    #[tokio::test]
    async fn traversal_prefixes_are_rejected() {
        let storage = Storage::new("/tmp/unused", "/storage");
        let err = storage.put("../etc", "pwn", b"x").await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }
}
