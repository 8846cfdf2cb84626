use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

use parcelis_core::repository::LabelStore;

/// MIME type for a stored label path, inferred from the extension.
pub fn mime_for_path(path: &str) -> &'static str {
    let lower = path.to_lowercase();
    if lower.ends_with(".pdf") {
        "application/pdf"
    } else if lower.ends_with(".png") {
        "image/png"
    } else {
        "application/octet-stream"
    }
}

/// Label storage on the local filesystem under a single directory.
pub struct FsLabelStore {
    dir: PathBuf,
}

impl FsLabelStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl LabelStore for FsLabelStore {
    async fn write(
        &self,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        // Plain file names only; the store owns its directory.
        if file_name.contains('/') || file_name.contains('\\') || file_name.contains("..") {
            return Err(format!("invalid label file name: {}", file_name).into());
        }

        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(file_name);
        tokio::fs::write(&path, bytes).await?;
        debug!(path = %path.display(), size = bytes.len(), "label written");
        Ok(path.to_string_lossy().into_owned())
    }

    async fn read(
        &self,
        path: &str,
    ) -> Result<(Vec<u8>, String), Box<dyn std::error::Error + Send + Sync>> {
        let requested = Path::new(path);
        // Stored paths always point into the label directory. starts_with is
        // component-wise, so parent components must be rejected separately or
        // "dir/../elsewhere" would pass.
        if !requested.starts_with(&self.dir)
            || requested
                .components()
                .any(|c| matches!(c, Component::ParentDir))
        {
            return Err(format!("label path outside store: {}", path).into());
        }
        let bytes = tokio::fs::read(requested).await?;
        Ok((bytes, mime_for_path(path).to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_for_path() {
        assert_eq!(mime_for_path("labels/shipment-ORD-1.pdf"), "application/pdf");
        assert_eq!(mime_for_path("labels/shipment-ORD-1.PNG"), "image/png");
        assert_eq!(mime_for_path("labels/shipment-ORD-1.bin"), "application/octet-stream");
    }

    #[tokio::test]
    async fn test_write_then_read_round_trip() {
        let dir = std::env::temp_dir().join(format!("parcelis-labels-{}", uuid::Uuid::new_v4()));
        let store = FsLabelStore::new(&dir);

        let path = store.write("shipment-ORD-7.pdf", b"%PDF-data").await.unwrap();
        let (bytes, mime) = store.read(&path).await.unwrap();

        assert_eq!(bytes, b"%PDF-data");
        assert_eq!(mime, "application/pdf");

        tokio::fs::remove_dir_all(&dir).await.ok();
    }

    #[tokio::test]
    async fn test_rejects_traversal_names() {
        let store = FsLabelStore::new("./labels-test");
        assert!(store.write("../escape.pdf", b"x").await.is_err());
        assert!(store.read("/etc/passwd").await.is_err());
        // Prefixed with the store directory but climbing back out of it.
        assert!(store.read("./labels-test/../secrets.pdf").await.is_err());
        assert!(store
            .read("./labels-test/nested/../../secrets.pdf")
            .await
            .is_err());
    }
}
