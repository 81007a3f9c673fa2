//! Image storage abstraction
//!
//! Stored files live under a public namespace and are addressed by a
//! relative key such as `books/<uuid>.png`. The filesystem implementation
//! writes below a configured root that the server exposes at the
//! `/storage` URL prefix.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// An image file received from a multipart upload
#[derive(Debug, Clone)]
pub struct UploadedImage {
    /// Client-supplied filename, used only to preserve the extension
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Persistence interface for uploaded binary files
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Store bytes under the given key, creating parent directories as needed.
    async fn put(&self, key: &str, bytes: &[u8]) -> AppResult<()>;

    /// Remove the file for the given key. A missing file is not an error,
    /// so retried deletes stay idempotent.
    async fn delete(&self, key: &str) -> AppResult<()>;

    /// Whether a file exists for the given key.
    async fn exists(&self, key: &str) -> AppResult<bool>;
}

/// Image store writing to the local filesystem
#[derive(Clone)]
pub struct LocalImageStore {
    root: PathBuf,
}

impl LocalImageStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve a key below the root. Keys are always server-generated, but
    /// deletes read them back from the database, so traversal is rejected.
    fn resolve(&self, key: &str) -> AppResult<PathBuf> {
        if key.starts_with('/') || key.split('/').any(|part| part == "..") {
            return Err(AppError::Internal(format!("invalid storage key: {}", key)));
        }
        Ok(self.root.join(key))
    }
}

#[async_trait]
impl ImageStore for LocalImageStore {
    async fn put(&self, key: &str, bytes: &[u8]) -> AppResult<()> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, bytes).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        let path = self.resolve(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        let path = self.resolve(key)?;
        Ok(fs::try_exists(&path).await?)
    }
}

/// Generate a globally-unique storage key under `namespace`, preserving the
/// uploaded file's extension.
pub fn image_key(namespace: &str, original_filename: &str) -> String {
    format!(
        "{}/{}.{}",
        namespace,
        Uuid::new_v4(),
        sanitize_extension(original_filename)
    )
}

/// Extension from the client filename: lowercased, alphanumeric, at most
/// 8 chars. Anything else falls back to `bin`.
fn sanitize_extension(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .filter(|ext| {
            !ext.is_empty() && ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric())
        })
        .unwrap_or_else(|| "bin".to_string())
}
