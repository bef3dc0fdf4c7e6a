use std::path::{Path, PathBuf};

use anyhow::Context;
use axum::async_trait;
use bytes::Bytes;
use rand::{distributions::Alphanumeric, Rng};

/// Attachments larger than this are rejected before anything is written.
pub const MAX_ATTACHMENT_BYTES: usize = 10 * 1024 * 1024;

#[async_trait]
pub trait FileStore: Send + Sync {
    async fn put(&self, key: &str, body: Bytes) -> anyhow::Result<()>;
    async fn get(&self, key: &str) -> anyhow::Result<Bytes>;
    async fn delete(&self, key: &str) -> anyhow::Result<()>;
}

/// Stores attachments as flat files under a configured directory.
#[derive(Clone)]
pub struct LocalFiles {
    root: PathBuf,
}

impl LocalFiles {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, key: &str) -> anyhow::Result<PathBuf> {
        // Keys are generated server-side, but never trust them as paths.
        if key.contains('/') || key.contains('\\') || key.contains("..") {
            anyhow::bail!("invalid file key: {key}");
        }
        Ok(self.root.join(key))
    }
}

#[async_trait]
impl FileStore for LocalFiles {
    async fn put(&self, key: &str, body: Bytes) -> anyhow::Result<()> {
        let path = self.resolve(key)?;
        tokio::fs::create_dir_all(&self.root)
            .await
            .context("create upload dir")?;
        tokio::fs::write(&path, &body)
            .await
            .with_context(|| format!("write {}", path.display()))?;
        Ok(())
    }

    async fn get(&self, key: &str) -> anyhow::Result<Bytes> {
        let path = self.resolve(key)?;
        let data = tokio::fs::read(&path)
            .await
            .with_context(|| format!("read {}", path.display()))?;
        Ok(Bytes::from(data))
    }

    async fn delete(&self, key: &str) -> anyhow::Result<()> {
        let path = self.resolve(key)?;
        tokio::fs::remove_file(&path)
            .await
            .with_context(|| format!("remove {}", path.display()))?;
        Ok(())
    }
}

/// Accepted attachment types: images, pdf, and the various mime spellings
/// zip files show up under. `application/octet-stream` is accepted only
/// when the filename carries a `.zip` extension.
pub fn is_allowed_attachment(content_type: &str, filename: &str) -> bool {
    const ALLOWED: &[&str] = &[
        "image/jpeg",
        "image/png",
        "image/jpg",
        "application/pdf",
        "application/zip",
        "application/x-zip",
        "application/x-zip-compressed",
    ];
    if ALLOWED.contains(&content_type) {
        return true;
    }
    let is_zip_ext = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("zip"))
        .unwrap_or(false);
    content_type == "application/octet-stream" && is_zip_ext
}

/// New storage key: 10 random alphanumerics plus the upload's extension.
pub fn attachment_key(original_name: &str) -> String {
    let stem: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(10)
        .map(char::from)
        .collect();
    match Path::new(original_name).extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{stem}.{ext}"),
        None => stem,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_images_pdf_and_zip_variants() {
        assert!(is_allowed_attachment("image/jpeg", "photo.jpeg"));
        assert!(is_allowed_attachment("image/png", "photo.png"));
        assert!(is_allowed_attachment("application/pdf", "doc.pdf"));
        assert!(is_allowed_attachment("application/zip", "a.zip"));
        assert!(is_allowed_attachment("application/x-zip-compressed", "a.zip"));
    }

    #[test]
    fn octet_stream_only_with_zip_extension() {
        assert!(is_allowed_attachment("application/octet-stream", "a.zip"));
        assert!(is_allowed_attachment("application/octet-stream", "a.ZIP"));
        assert!(!is_allowed_attachment("application/octet-stream", "a.exe"));
        assert!(!is_allowed_attachment("application/octet-stream", "noext"));
    }

    #[test]
    fn rejects_everything_else() {
        assert!(!is_allowed_attachment("text/html", "page.html"));
        assert!(!is_allowed_attachment("video/mp4", "clip.mp4"));
    }

    #[test]
    fn attachment_key_keeps_extension() {
        let key = attachment_key("report.pdf");
        assert!(key.ends_with(".pdf"));
        assert_eq!(key.len(), "1234567890.pdf".len());

        let bare = attachment_key("noext");
        assert_eq!(bare.len(), 10);
    }

    #[test]
    fn attachment_keys_are_unique_enough() {
        let a = attachment_key("x.zip");
        let b = attachment_key("x.zip");
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn local_store_roundtrip() {
        let root = std::env::temp_dir().join(format!("mindhaven-test-{}", uuid::Uuid::new_v4()));
        let store = LocalFiles::new(&root);

        store.put("abc123.zip", Bytes::from_static(b"payload")).await.unwrap();
        let got = store.get("abc123.zip").await.unwrap();
        assert_eq!(&got[..], b"payload");

        store.delete("abc123.zip").await.unwrap();
        assert!(store.get("abc123.zip").await.is_err());

        tokio::fs::remove_dir_all(&root).await.ok();
    }

    #[tokio::test]
    async fn local_store_rejects_path_traversal_keys() {
        let store = LocalFiles::new(std::env::temp_dir());
        assert!(store.get("../etc/passwd").await.is_err());
        assert!(store.put("a/b.zip", Bytes::new()).await.is_err());
    }
}
