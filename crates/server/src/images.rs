//! Uploaded image storage.
//!
//! Stored names are `{uuid}_{sanitized original name}`; the directory is
//! served read-only at `/images`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

/// Errors from writing an uploaded image.
#[derive(Debug, Error)]
pub enum ImageStoreError {
    #[error("image write failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Somewhere to put uploaded image bytes.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Persist `bytes` and return the stored file name.
    ///
    /// # Errors
    ///
    /// Returns `ImageStoreError` if the bytes cannot be written.
    async fn save(&self, original_name: &str, bytes: &[u8]) -> Result<String, ImageStoreError>;

    /// Delete a stored image. Removing a name that is not stored succeeds.
    ///
    /// # Errors
    ///
    /// Returns `ImageStoreError` if the image exists but cannot be deleted.
    async fn remove(&self, name: &str) -> Result<(), ImageStoreError>;
}

/// Writes images into a local directory.
#[derive(Debug, Clone)]
pub struct DiskImageStore {
    dir: PathBuf,
}

impl DiskImageStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl ImageStore for DiskImageStore {
    async fn save(&self, original_name: &str, bytes: &[u8]) -> Result<String, ImageStoreError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let name = stored_name(original_name);
        tokio::fs::write(self.dir.join(&name), bytes).await?;
        tracing::debug!(file = %name, size = bytes.len(), "Image stored");
        Ok(name)
    }

    async fn remove(&self, name: &str) -> Result<(), ImageStoreError> {
        match tokio::fs::remove_file(self.dir.join(name)).await {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
            _ => {
                tracing::debug!(file = %name, "Image removed");
                Ok(())
            }
        }
    }
}

/// Build a collision-free file name that cannot escape the image directory.
fn stored_name(original_name: &str) -> String {
    let base = original_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();
    let mut clean: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    clean = clean.trim_start_matches('.').to_owned();
    if clean.is_empty() {
        clean = "image".to_owned();
    }
    format!("{}_{clean}", Uuid::new_v4())
}
