//! Per-request scratch files.
//!
//! Every file a request touches on local disk is a [`TempArtifact`] owned by
//! that request. The request releases its artifacts with
//! [`TempArtifact::remove`] once it finishes; dropping an artifact that was
//! never released (a cancelled or panicking request) deletes the file
//! synchronously instead.

use chrono::Utc;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;
use uuid::Uuid;

/// Extension used for uploads whose client file name has none.
pub const DEFAULT_UPLOAD_EXTENSION: &str = ".mp4";

/// Shared directory holding every in-flight request's files.
#[derive(Debug, Clone)]
pub struct ScratchDir {
    root: PathBuf,
}

impl ScratchDir {
    /// Uses `root`, creating it if needed.
    pub fn new(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Reserves a unique path for a new file. Nothing is created on disk.
    ///
    /// Names look like `music-1718000000000-3f2a9c1d.mp3`; the timestamp keeps
    /// them sortable and the random suffix keeps concurrent requests apart.
    pub fn allocate(&self, prefix: &str, extension: &str) -> TempArtifact {
        let suffix = Uuid::new_v4().simple().to_string();
        let name = format!(
            "{}-{}-{}{}",
            prefix,
            Utc::now().timestamp_millis(),
            &suffix[..8],
            extension
        );
        TempArtifact {
            path: self.root.join(name),
        }
    }

    /// Extension (with leading dot) to store an upload under.
    ///
    /// Only the extension of the client's file name is kept.
    pub fn upload_extension(file_name: Option<&str>) -> String {
        file_name
            .and_then(|name| Path::new(name).extension())
            .and_then(|e| e.to_str())
            .filter(|e| !e.is_empty() && e.len() <= 8 && e.chars().all(|c| c.is_ascii_alphanumeric()))
            .map(|e| format!(".{}", e.to_ascii_lowercase()))
            .unwrap_or_else(|| DEFAULT_UPLOAD_EXTENSION.to_string())
    }
}

/// A scratch file owned by exactly one request.
#[derive(Debug)]
pub struct TempArtifact {
    path: PathBuf,
}

impl TempArtifact {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Deletes the file on the blocking pool, leaving nothing for `Drop`.
    pub async fn remove(mut self) {
        let path = std::mem::take(&mut self.path);
        log_removal(&path, tokio::fs::remove_file(&path).await);
    }
}

impl Drop for TempArtifact {
    fn drop(&mut self) {
        // empty once `remove` ran
        if self.path.as_os_str().is_empty() {
            return;
        }
        log_removal(&self.path, std::fs::remove_file(&self.path));
    }
}

fn log_removal(path: &Path, result: io::Result<()>) {
    match result {
        Ok(()) => debug!(path = %path.display(), "Removed scratch file"),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => debug!(
            path = %path.display(),
            error = %e,
            "Failed to remove scratch file"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_new_creates_directory() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("nested").join("uploads");
        let scratch = ScratchDir::new(&root).unwrap();
        assert!(root.is_dir());
        assert_eq!(scratch.root(), root.as_path());
    }

    #[test]
    fn test_allocate_is_unique_and_lazy() {
        let temp = TempDir::new().unwrap();
        let scratch = ScratchDir::new(temp.path()).unwrap();

        let a = scratch.allocate("output", ".mp4");
        let b = scratch.allocate("output", ".mp4");

        assert_ne!(a.path(), b.path());
        assert!(!a.exists());
        assert_eq!(a.path().parent(), Some(temp.path()));
        let name = a.path().file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("output-"));
        assert!(name.ends_with(".mp4"));
    }

    #[test]
    fn test_drop_removes_file() {
        let temp = TempDir::new().unwrap();
        let scratch = ScratchDir::new(temp.path()).unwrap();

        let artifact = scratch.allocate("upload", ".mov");
        std::fs::write(artifact.path(), b"clip").unwrap();
        let path = artifact.path().to_path_buf();
        assert!(path.exists());

        drop(artifact);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_remove_deletes_file_without_drop() {
        let temp = TempDir::new().unwrap();
        let scratch = ScratchDir::new(temp.path()).unwrap();

        let artifact = scratch.allocate("output", ".mp4");
        tokio::fs::write(artifact.path(), b"encoded").await.unwrap();
        let path = artifact.path().to_path_buf();

        artifact.remove().await;
        assert!(!path.exists());
        assert_eq!(std::fs::read_dir(temp.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_remove_of_missing_file_is_silent() {
        let temp = TempDir::new().unwrap();
        let scratch = ScratchDir::new(temp.path()).unwrap();
        let artifact = scratch.allocate("music", ".mp3");

        tokio_test::block_on(artifact.remove());
        assert_eq!(std::fs::read_dir(temp.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_drop_of_never_written_file_is_silent() {
        let temp = TempDir::new().unwrap();
        let scratch = ScratchDir::new(temp.path()).unwrap();
        drop(scratch.allocate("music", ".mp3"));
        assert_eq!(std::fs::read_dir(temp.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_upload_extension() {
        assert_eq!(ScratchDir::upload_extension(Some("clip.MOV")), ".mov");
        assert_eq!(ScratchDir::upload_extension(Some("video.webm")), ".webm");
        assert_eq!(ScratchDir::upload_extension(Some("../../etc/passwd")), ".mp4");
        assert_eq!(ScratchDir::upload_extension(Some("blob")), ".mp4");
        assert_eq!(ScratchDir::upload_extension(None), ".mp4");
    }
}
