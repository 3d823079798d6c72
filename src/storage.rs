//! Binary file content on the local filesystem, one directory per task.
//!
//! The relational rows in `files` reference paths produced here. Disk
//! mutations are not covered by the enclosing transaction: uploads write
//! disk before the row insert, deletions remove rows before unlinking, so
//! any mismatch is a reconcilable orphan rather than a dangling reference.

use std::io;
use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::warn;

use crate::util::new_id;

#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create the store root if it does not exist yet.
    pub async fn init(&self) -> io::Result<()> {
        fs::create_dir_all(&self.root).await
    }

    fn task_dir(&self, task_id: &str) -> PathBuf {
        self.root.join(task_id)
    }

    /// Write `content` to a freshly generated path under the task's
    /// directory, creating the directory and any missing ancestors first.
    /// The on-disk name is unrelated to any user-supplied file name.
    pub async fn write(&self, task_id: &str, content: &[u8]) -> io::Result<PathBuf> {
        let dir = self.task_dir(task_id);
        fs::create_dir_all(&dir).await?;

        let path = dir.join(new_id());
        fs::write(&path, content).await?;
        Ok(path)
    }

    /// Unlink a single stored file.
    pub async fn remove(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path).await
    }

    /// Remove a task's directory once its files are gone. A directory that
    /// never existed (task without uploads) is not an error, and a leftover
    /// orphan file keeps the directory alive for later reconciliation
    /// instead of failing the delete.
    pub async fn remove_task_dir(&self, task_id: &str) -> io::Result<()> {
        match fs::remove_dir(self.task_dir(task_id)).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::DirectoryNotEmpty => {
                warn!("task directory {} not empty, leaving orphans", task_id);
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    /// Whether the per-task directory currently exists.
    #[cfg(test)]
    pub async fn task_dir_exists(&self, task_id: &str) -> bool {
        fs::try_exists(self.task_dir(task_id)).await.unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_and_remove_roundtrip() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let store = FileStore::new(dir.path());
        store.init().await.expect("Failed to init store");

        let path = store
            .write("task-1", b"hello world")
            .await
            .expect("Failed to write file");
        assert!(path.starts_with(dir.path().join("task-1")));

        let content = fs::read(&path).await.expect("Failed to read back");
        assert_eq!(content, b"hello world");

        store.remove(&path).await.expect("Failed to remove file");
        assert!(!fs::try_exists(&path).await.unwrap());
    }

    #[tokio::test]
    async fn test_remove_task_dir_after_last_file() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let store = FileStore::new(dir.path());

        let path = store
            .write("task-2", b"bytes")
            .await
            .expect("Failed to write file");
        assert!(store.task_dir_exists("task-2").await);

        store.remove(&path).await.expect("Failed to remove file");
        store
            .remove_task_dir("task-2")
            .await
            .expect("Failed to remove task dir");
        assert!(!store.task_dir_exists("task-2").await);
    }

    #[tokio::test]
    async fn test_remove_missing_task_dir_is_noop() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let store = FileStore::new(dir.path());

        store
            .remove_task_dir("never-created")
            .await
            .expect("Missing dir should not error");
    }
}
