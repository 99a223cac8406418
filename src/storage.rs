//! Local image storage for profile pictures.
//!
//! Files land in a flat uploads directory under a generated name and are
//! served back at `/uploads/{name}`. Only the public URL path is recorded
//! on the user row, so the storage backend can be swapped without a schema
//! change.

use std::path::{Path, PathBuf};

/// Maximum accepted image size: 5 MiB.
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// URL prefix images are served from.
pub const PUBLIC_PREFIX: &str = "/uploads";

const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

#[derive(Clone)]
pub struct ImageStore {
    root: PathBuf,
}

impl ImageStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create the uploads directory if it does not exist yet.
    pub async fn ensure_dir(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.root).await
    }

    /// Persist an uploaded image and return its public URL path.
    /// The stored name is generated; the original filename only contributes
    /// its extension.
    pub async fn save(&self, original_name: &str, bytes: &[u8]) -> Result<String, ImageError> {
        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(ImageError::TooLarge(bytes.len()));
        }

        let ext = Path::new(original_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .ok_or(ImageError::UnsupportedType)?;
        if !ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
            return Err(ImageError::UnsupportedType);
        }

        let name = format!("{}.{}", uuid::Uuid::new_v4(), ext);
        tokio::fs::write(self.root.join(&name), bytes)
            .await
            .map_err(ImageError::Io)?;

        Ok(format!("{}/{}", PUBLIC_PREFIX, name))
    }

    /// Resolve a stored file name to its on-disk path.
    /// Rejects names that could escape the uploads directory.
    pub fn path_for(&self, name: &str) -> Option<PathBuf> {
        if name.is_empty() || name.contains('/') || name.contains('\\') || name.contains("..") {
            return None;
        }
        Some(self.root.join(name))
    }

    /// Content type for a stored file name, by extension.
    pub fn content_type(name: &str) -> &'static str {
        match Path::new(name).extension().and_then(|e| e.to_str()) {
            Some("jpg") | Some("jpeg") => "image/jpeg",
            Some("png") => "image/png",
            Some("gif") => "image/gif",
            Some("webp") => "image/webp",
            _ => "application/octet-stream",
        }
    }
}

#[derive(Debug)]
pub enum ImageError {
    /// Image exceeds MAX_IMAGE_BYTES
    TooLarge(usize),
    /// Missing or non-image file extension
    UnsupportedType,
    /// Filesystem error
    Io(std::io::Error),
}

impl std::fmt::Display for ImageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImageError::TooLarge(size) => {
                write!(f, "Image is {} bytes, limit is {}", size, MAX_IMAGE_BYTES)
            }
            ImageError::UnsupportedType => write!(f, "Unsupported image type"),
            ImageError::Io(e) => write!(f, "Failed to store image: {}", e),
        }
    }
}

impl std::error::Error for ImageError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_store() -> ImageStore {
        let dir = std::env::temp_dir().join(format!("filmcuts-test-{}", uuid::Uuid::new_v4()));
        ImageStore::new(dir)
    }

    #[tokio::test]
    async fn test_save_returns_public_url() {
        let store = test_store();
        store.ensure_dir().await.unwrap();

        let url = store.save("me.png", b"fake-png-bytes").await.unwrap();
        assert!(url.starts_with("/uploads/"));
        assert!(url.ends_with(".png"));

        let name = url.strip_prefix("/uploads/").unwrap();
        let path = store.path_for(name).unwrap();
        let stored = tokio::fs::read(path).await.unwrap();
        assert_eq!(stored, b"fake-png-bytes");
    }

    #[tokio::test]
    async fn test_rejects_unknown_extension() {
        let store = test_store();
        store.ensure_dir().await.unwrap();

        assert!(matches!(
            store.save("notes.txt", b"hello").await,
            Err(ImageError::UnsupportedType)
        ));
        assert!(matches!(
            store.save("no-extension", b"hello").await,
            Err(ImageError::UnsupportedType)
        ));
    }

    #[tokio::test]
    async fn test_rejects_oversized_image() {
        let store = test_store();
        store.ensure_dir().await.unwrap();

        let bytes = vec![0u8; MAX_IMAGE_BYTES + 1];
        assert!(matches!(
            store.save("big.jpg", &bytes).await,
            Err(ImageError::TooLarge(_))
        ));
    }

    #[test]
    fn test_path_for_rejects_traversal() {
        let store = test_store();
        assert!(store.path_for("../secret").is_none());
        assert!(store.path_for("a/b.png").is_none());
        assert!(store.path_for("").is_none());
        assert!(store.path_for("ok.png").is_some());
    }

    #[test]
    fn test_content_type() {
        assert_eq!(ImageStore::content_type("a.jpeg"), "image/jpeg");
        assert_eq!(ImageStore::content_type("a.webp"), "image/webp");
        assert_eq!(ImageStore::content_type("a"), "application/octet-stream");
    }
}
