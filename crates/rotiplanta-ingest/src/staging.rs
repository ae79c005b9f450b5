//! Scoped staging of uploaded files on local disk.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use rotiplanta_core::Result;

use crate::file::sanitize_filename;

/// An uploaded file written to the staging directory.
///
/// The file is deleted by [`StagedUpload::remove`] or, if that is never
/// reached, when the guard is dropped.
#[derive(Debug)]
pub struct StagedUpload {
    path: PathBuf,
    removed: bool,
}

impl StagedUpload {
    /// Write `bytes` under `dir` with a unique name derived from `original_name`.
    pub async fn write(dir: &Path, original_name: &str, bytes: &[u8]) -> Result<Self> {
        let path = dir.join(unique_name(original_name));
        tokio::fs::write(&path, bytes).await?;
        debug!("Staged upload at {}", path.display());
        Ok(Self {
            path,
            removed: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the staged file now.
    pub async fn remove(mut self) -> Result<()> {
        self.removed = true;
        tokio::fs::remove_file(&self.path).await?;
        debug!("Removed staged upload {}", self.path.display());
        Ok(())
    }
}

impl Drop for StagedUpload {
    fn drop(&mut self) {
        if self.removed {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!("Removed staged upload {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Could not remove {}: {}", self.path.display(), e),
        }
    }
}

/// `<stem>_<timestamp>_<short uuid>.<ext>`
fn unique_name(original_name: &str) -> String {
    let safe = sanitize_filename(original_name);
    let path = Path::new(&safe);
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("upload");
    let timestamp = chrono::Utc::now().format("%Y%m%d%H%M%S");
    let id = uuid::Uuid::new_v4().simple().to_string();
    let suffix = &id[..8];

    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{}_{}_{}.{}", stem, timestamp, suffix, ext),
        None => format!("{}_{}_{}", stem, timestamp, suffix),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_name_keeps_extension() {
        let a = unique_name("my meal.PNG");
        let b = unique_name("my meal.PNG");
        assert!(a.starts_with("my_meal_"));
        assert!(a.ends_with(".PNG"));
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_remove_deletes_file() {
        let dir = tempfile::tempdir().unwrap();
        let staged = StagedUpload::write(dir.path(), "report.pdf", b"%PDF-1.4")
            .await
            .unwrap();
        let path = staged.path().to_path_buf();
        assert!(path.exists());
        assert_eq!(path.parent(), Some(dir.path()));

        staged.remove().await.unwrap();
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_drop_deletes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = {
            let staged = StagedUpload::write(dir.path(), "plate.jpg", b"jpeg")
                .await
                .unwrap();
            staged.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_write_into_missing_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(StagedUpload::write(&missing, "a.png", b"x").await.is_err());
    }
}
