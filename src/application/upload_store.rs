// Upload store - Short-lived upload files and the cleanup of their directories
use anyhow::Context;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// An upload written to disk; the file is removed when this is dropped
#[derive(Debug)]
pub struct TempUpload {
    path: PathBuf,
}

impl TempUpload {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempUpload {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to remove upload");
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    pub uploads: usize,
    pub results: usize,
}

#[derive(Debug, Clone)]
pub struct UploadStore {
    upload_dir: PathBuf,
    results_dir: PathBuf,
}

impl UploadStore {
    pub fn new(upload_dir: impl Into<PathBuf>, results_dir: impl Into<PathBuf>) -> Self {
        Self {
            upload_dir: upload_dir.into(),
            results_dir: results_dir.into(),
        }
    }

    /// Write an upload under a random name keeping its extension
    pub async fn save(&self, bytes: &[u8], extension: &str) -> anyhow::Result<TempUpload> {
        tokio::fs::create_dir_all(&self.upload_dir)
            .await
            .with_context(|| format!("Failed to create {}", self.upload_dir.display()))?;

        let path = self
            .upload_dir
            .join(format!("{}.{}", uuid::Uuid::new_v4(), extension));
        let upload = TempUpload { path };
        tokio::fs::write(upload.path(), bytes)
            .await
            .with_context(|| format!("Failed to write {}", upload.path().display()))?;
        Ok(upload)
    }

    /// Delete every regular file in the upload and result directories
    pub async fn cleanup(&self) -> anyhow::Result<CleanupReport> {
        let uploads = clear_dir(&self.upload_dir).await?;
        let results = clear_dir(&self.results_dir).await?;
        tracing::info!(uploads, results, "Cleaned upload directories");
        Ok(CleanupReport { uploads, results })
    }
}

async fn clear_dir(dir: &Path) -> anyhow::Result<usize> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e).with_context(|| format!("Failed to read {}", dir.display())),
    };

    let mut deleted = 0;
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_file() {
            tokio::fs::remove_file(entry.path())
                .await
                .with_context(|| format!("Failed to delete {}", entry.path().display()))?;
            deleted += 1;
        }
    }
    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_upload_is_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let store = UploadStore::new(dir.path().join("uploads"), dir.path().join("results"));

        let upload = store.save(b"jpeg bytes", "jpg").await.unwrap();
        let path = upload.path().to_path_buf();
        assert!(path.exists());
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("jpg"));

        drop(upload);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_cleanup_counts_files_only() {
        let dir = tempfile::tempdir().unwrap();
        let uploads = dir.path().join("uploads");
        let results = dir.path().join("results");
        std::fs::create_dir_all(uploads.join("nested")).unwrap();
        std::fs::create_dir_all(&results).unwrap();
        std::fs::write(uploads.join("a.jpg"), b"a").unwrap();
        std::fs::write(uploads.join("b.png"), b"b").unwrap();
        std::fs::write(results.join("c.jpg"), b"c").unwrap();

        let store = UploadStore::new(&uploads, &results);
        let report = store.cleanup().await.unwrap();
        assert_eq!(report, CleanupReport { uploads: 2, results: 1 });
        assert!(uploads.join("nested").exists());
    }

    #[tokio::test]
    async fn test_cleanup_of_missing_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let store = UploadStore::new(dir.path().join("none"), dir.path().join("nothing"));
        assert_eq!(
            store.cleanup().await.unwrap(),
            CleanupReport { uploads: 0, results: 0 }
        );
    }
}
