//! VFS cache directory reset
//!
//! Clearing removes the whole tree and recreates an empty directory in its
//! place. The mount must be stopped first; nothing here checks that.
//! Removal time grows with the size of the tree and is not bounded.

use std::path::{Path, PathBuf};

/// Permission bits of a recreated cache directory
pub const CACHE_DIR_MODE: u32 = 0o755;

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache directory is not configured")]
    NotConfigured,
    #[error("failed to remove cache directory {path}: {source}")]
    Remove {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The old tree is gone but no directory replaced it
    #[error("failed to recreate cache directory {path}: {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CacheResetter;

impl CacheResetter {
    pub fn new() -> Self {
        Self
    }

    /// Remove everything under `path` and leave an empty directory behind.
    ///
    /// A path that does not exist yet is created. If removal fails nothing
    /// is recreated. An empty or blank path is `NotConfigured`.
    pub async fn clear_cache(&self, path: &Path) -> Result<(), CacheError> {
        if path.to_str().is_some_and(|p| p.trim().is_empty()) {
            return Err(CacheError::NotConfigured);
        }

        tracing::info!(cache_dir = %path.display(), "clearing cache directory");

        match tokio::fs::remove_dir_all(path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(cache_dir = %path.display(), "cache directory did not exist");
            }
            Err(source) => {
                tracing::error!(cache_dir = %path.display(), error = %source, "failed to remove cache directory");
                return Err(CacheError::Remove {
                    path: path.to_path_buf(),
                    source,
                });
            }
        }

        if let Err(source) = recreate(path).await {
            tracing::error!(cache_dir = %path.display(), error = %source, "failed to recreate cache directory");
            return Err(CacheError::Create {
                path: path.to_path_buf(),
                source,
            });
        }

        tracing::info!(cache_dir = %path.display(), "cache directory cleared");
        Ok(())
    }
}

#[cfg(unix)]
async fn recreate(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    tokio::fs::DirBuilder::new()
        .recursive(true)
        .mode(CACHE_DIR_MODE)
        .create(path)
        .await?;
    // umask may have masked bits off the mode above
    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(CACHE_DIR_MODE)).await
}

#[cfg(not(unix))]
async fn recreate(path: &Path) -> std::io::Result<()> {
    tokio::fs::create_dir_all(path).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_path_not_configured() {
        for blank in ["", "   ", "\t"] {
            let err = CacheResetter::new()
                .clear_cache(Path::new(blank))
                .await
                .unwrap_err();
            assert!(matches!(err, CacheError::NotConfigured), "{blank:?}");
            assert!(!Path::new(blank).exists());
        }
    }

    #[tokio::test]
    async fn test_clear_populated_directory() {
        let temp = tempfile::tempdir().unwrap();
        let cache_dir = temp.path().join("vfs");
        std::fs::create_dir_all(cache_dir.join("vfs/gateway/nested")).unwrap();
        std::fs::write(cache_dir.join("vfs/gateway/nested/chunk"), b"data").unwrap();
        std::fs::write(cache_dir.join("vfsMeta"), b"meta").unwrap();

        CacheResetter::new().clear_cache(&cache_dir).await.unwrap();

        assert!(cache_dir.is_dir());
        assert_eq!(std::fs::read_dir(&cache_dir).unwrap().count(), 0);

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&cache_dir).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, CACHE_DIR_MODE);
        }
    }

    #[tokio::test]
    async fn test_missing_directory_is_created() {
        let temp = tempfile::tempdir().unwrap();
        let cache_dir = temp.path().join("does/not/exist");

        CacheResetter::new().clear_cache(&cache_dir).await.unwrap();
        assert!(cache_dir.is_dir());
    }

    #[tokio::test]
    async fn test_remove_failure_skips_recreate() {
        let temp = tempfile::tempdir().unwrap();
        // parent is a regular file, so removal fails with ENOTDIR
        let blocker = temp.path().join("blocker");
        std::fs::write(&blocker, b"keep").unwrap();
        let cache_dir = blocker.join("cache");

        let err = CacheResetter::new()
            .clear_cache(&cache_dir)
            .await
            .unwrap_err();
        match err {
            CacheError::Remove { path, .. } => assert_eq!(path, cache_dir),
            other => panic!("expected removal failure, got: {other}"),
        }
        assert!(blocker.is_file());
        assert_eq!(std::fs::read(&blocker).unwrap(), b"keep");
    }
}
