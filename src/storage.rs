use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use crate::config::DriverConfig;
use crate::error::{NativeError, OrmDriverError};

/// Makes sure the directory holding a database file exists.
///
/// Implementations must be recursive and idempotent.
#[async_trait]
pub trait StorageProvisioner: Send + Sync + std::fmt::Debug {
    async fn ensure_directory(&self, dir: &Path) -> Result<(), NativeError>;
}

/// Provisioner backed by `tokio::fs::create_dir_all`.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsProvisioner;

#[async_trait]
impl StorageProvisioner for FsProvisioner {
    async fn ensure_directory(&self, dir: &Path) -> Result<(), NativeError> {
        tokio::fs::create_dir_all(dir).await?;
        Ok(())
    }
}

/// Pre-flight step run before a connection is opened.
///
/// Returns the directory that was ensured, or `None` when the locator needs none.
///
/// # Errors
/// Returns `OrmDriverError::ConnectionError` wrapping the filesystem error.
pub async fn provision_storage(
    provisioner: &dyn StorageProvisioner,
    config: &DriverConfig,
) -> Result<Option<PathBuf>, OrmDriverError> {
    let Some(dir) = config.storage_directory() else {
        return Ok(None);
    };
    provisioner.ensure_directory(dir).await.map_err(|err| {
        OrmDriverError::connection(
            format!("failed to create database directory {}", dir.display()),
            err,
        )
    })?;
    debug!(dir = %dir.display(), "database directory ready");
    Ok(Some(dir.to_path_buf()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn creates_nested_directories_idempotently() {
        let tmp = tempfile::tempdir().unwrap();
        let db = tmp.path().join("a/b/c/app.db");
        let config = DriverConfig::new(db.to_string_lossy());

        let dir = provision_storage(&FsProvisioner, &config).await.unwrap();
        assert_eq!(dir.as_deref(), Some(tmp.path().join("a/b/c").as_path()));
        assert!(tmp.path().join("a/b/c").is_dir());

        // second run is a no-op
        provision_storage(&FsProvisioner, &config).await.unwrap();
        assert!(!db.exists());
    }

    #[tokio::test]
    async fn in_memory_needs_no_directory() {
        let config = DriverConfig::new(":memory:");
        assert_eq!(provision_storage(&FsProvisioner, &config).await.unwrap(), None);
    }

    #[tokio::test]
    async fn blocked_path_is_a_connection_error() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("plain-file");
        std::fs::write(&file, b"x").unwrap();
        let config = DriverConfig::new(file.join("sub/app.db").to_string_lossy());

        let err = provision_storage(&FsProvisioner, &config).await.unwrap_err();
        assert!(matches!(err, OrmDriverError::ConnectionError { .. }));
    }
}
