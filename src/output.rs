//! Output directory preparation

use crate::error::Result;
use futures::future::try_join_all;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// File kept when the output directory is cleared
pub const PRESERVED_FILE: &str = "README.md";

/// Create `path` and any missing parents
///
/// Returns `true` if the directory had to be created.
pub async fn ensure_directory(path: &Path) -> Result<bool> {
    if fs::metadata(path).await.is_ok_and(|m| m.is_dir()) {
        return Ok(false);
    }
    fs::create_dir_all(path).await?;
    info!(?path, "created directory");
    Ok(true)
}

/// Remove previous export output from `path`
///
/// Files directly under `path` are deleted, except [`PRESERVED_FILE`]. Each
/// subdirectory has its files deleted and is then removed; anything nested deeper
/// is removed together with its parent. Deletions run concurrently.
///
/// # Errors
///
/// The first failed deletion is returned.
pub async fn clear_directory(path: &Path) -> Result<()> {
    let mut files: Vec<PathBuf> = Vec::new();
    let mut subdirectories: Vec<PathBuf> = Vec::new();

    let mut entries = fs::read_dir(path).await?;
    while let Some(entry) = entries.next_entry().await? {
        let file_type = entry.file_type().await?;
        if file_type.is_dir() {
            subdirectories.push(entry.path());
        } else if entry.file_name() != PRESERVED_FILE {
            files.push(entry.path());
        }
    }

    let mut nested_dirs: Vec<PathBuf> = Vec::new();
    for dir in &subdirectories {
        let mut entries = fs::read_dir(dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_dir() {
                nested_dirs.push(entry.path());
            } else {
                files.push(entry.path());
            }
        }
    }

    let deleted_files = files.len();
    try_join_all(files.into_iter().map(|file| async move {
        fs::remove_file(&file).await?;
        debug!(?file, "deleted file");
        Ok::<_, crate::error::Error>(())
    }))
    .await?;

    try_join_all(nested_dirs.into_iter().map(fs::remove_dir_all)).await?;

    let deleted_dirs = subdirectories.len();
    try_join_all(subdirectories.into_iter().map(fs::remove_dir)).await?;

    info!(?path, deleted_files, deleted_dirs, "cleared output directory");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn ensure_directory_creates_parents_and_is_idempotent() {
        let temp = tempdir().unwrap();
        let target = temp.path().join("a").join("b");

        assert!(ensure_directory(&target).await.unwrap());
        assert!(target.is_dir());
        assert!(!ensure_directory(&target).await.unwrap());
    }

    #[tokio::test]
    async fn clear_keeps_readme_and_removes_the_rest() {
        let temp = tempdir().unwrap();
        let root = temp.path();
        std::fs::write(root.join("README.md"), "docs").unwrap();
        std::fs::write(root.join("icon.svg"), "<svg/>").unwrap();
        std::fs::create_dir(root.join("old")).unwrap();
        std::fs::write(root.join("old").join("stale.svg"), "<svg/>").unwrap();

        clear_directory(root).await.unwrap();

        assert!(root.join("README.md").exists());
        assert!(!root.join("icon.svg").exists());
        assert!(!root.join("old").exists());
        let remaining: Vec<_> = std::fs::read_dir(root).unwrap().collect();
        assert_eq!(remaining.len(), 1);
    }

    #[tokio::test]
    async fn readme_inside_subdirectory_is_not_preserved() {
        let temp = tempdir().unwrap();
        let sub = temp.path().join("group");
        std::fs::create_dir(&sub).unwrap();
        std::fs::write(sub.join("README.md"), "x").unwrap();

        clear_directory(temp.path()).await.unwrap();
        assert!(!sub.exists());
    }

    #[tokio::test]
    async fn deeper_nesting_is_removed_with_its_parent() {
        let temp = tempdir().unwrap();
        let deep = temp.path().join("a").join("b");
        std::fs::create_dir_all(&deep).unwrap();
        std::fs::write(deep.join("c.svg"), "x").unwrap();

        clear_directory(temp.path()).await.unwrap();
        assert!(!temp.path().join("a").exists());
    }

    #[tokio::test]
    async fn clearing_empty_directory_is_a_no_op() {
        let temp = tempdir().unwrap();
        clear_directory(temp.path()).await.unwrap();
        assert!(temp.path().is_dir());
    }

    #[tokio::test]
    async fn clearing_missing_directory_fails() {
        let temp = tempdir().unwrap();
        let result = clear_directory(&temp.path().join("missing")).await;
        assert!(matches!(result, Err(crate::error::Error::Io(_))));
    }
}
