//! Filesystem storage for uploaded recipe images.
//!
//! Files are stored under `<media_root>/recipe/` with generated uuid names;
//! the database keeps only the relative path. Content is identified by its
//! magic bytes, never by the client-supplied filename.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::fs;
use tracing::{debug, warn};
use uuid::Uuid;

const RECIPE_DIR: &str = "recipe";

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("payload is not a recognized image format")]
    NotAnImage,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Identify an image payload by its leading magic bytes, returning the file
/// extension to store it under.
pub fn sniff_image(data: &[u8]) -> Option<&'static str> {
    if data.starts_with(b"\x89PNG\r\n\x1a\n") {
        return Some("png");
    }
    if data.starts_with(b"\xff\xd8\xff") {
        return Some("jpg");
    }
    if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
        return Some("gif");
    }
    if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
        return Some("webp");
    }
    None
}

#[derive(Clone)]
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the media directory tree. Run once at startup.
    pub async fn ensure_exists(&self) -> Result<(), MediaError> {
        fs::create_dir_all(self.root.join(RECIPE_DIR)).await?;
        Ok(())
    }

    /// Store an image payload under a fresh uuid name and return its
    /// relative path (e.g. `recipe/<uuid>.png`). Non-image payloads are
    /// rejected before anything touches the disk.
    pub async fn store_recipe_image(&self, data: &[u8]) -> Result<String, MediaError> {
        let extension = sniff_image(data).ok_or(MediaError::NotAnImage)?;

        let relative = format!("{}/{}.{}", RECIPE_DIR, Uuid::new_v4(), extension);
        let path = self.root.join(&relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        fs::write(&path, data).await?;
        debug!(path = %path.display(), "stored recipe image");
        Ok(relative)
    }

    /// Remove a stored file by its relative path. A file that is already
    /// gone is not an error; other failures are logged and swallowed so a
    /// delete cannot fail on media cleanup alone.
    pub async fn remove(&self, relative: &str) {
        let path = self.root.join(relative);
        match fs::remove_file(&path).await {
            Ok(()) => debug!(path = %path.display(), "removed media file"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %path.display(), "failed to remove media file: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG: &[u8] = b"\x89PNG\r\n\x1a\n rest of file";

    #[test]
    fn sniffs_known_formats() {
        assert_eq!(sniff_image(PNG), Some("png"));
        assert_eq!(sniff_image(b"\xff\xd8\xff\xe0 jfif"), Some("jpg"));
        assert_eq!(sniff_image(b"GIF89a..."), Some("gif"));
        assert_eq!(sniff_image(b"RIFF\x00\x00\x00\x00WEBPVP8 "), Some("webp"));
        assert_eq!(sniff_image(b"plain text"), None);
        assert_eq!(sniff_image(b""), None);
    }

    #[tokio::test]
    async fn store_and_remove_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = MediaStore::new(dir.path());
        store.ensure_exists().await.expect("init");

        let relative = store.store_recipe_image(PNG).await.expect("store");
        assert!(relative.starts_with("recipe/"));
        assert!(relative.ends_with(".png"));
        assert!(dir.path().join(&relative).exists());

        store.remove(&relative).await;
        assert!(!dir.path().join(&relative).exists());

        // Removing again is a no-op.
        store.remove(&relative).await;
    }

    #[tokio::test]
    async fn rejects_non_image_payloads() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = MediaStore::new(dir.path());
        store.ensure_exists().await.expect("init");

        let err = store
            .store_recipe_image(b"definitely not an image")
            .await
            .expect_err("must reject");
        assert!(matches!(err, MediaError::NotAnImage));
    }
}
