use crate::backend::{DeleteReport, StorageBackend};
use crate::{BackendKind, Listing, Operation, StorageError};
use chrono::{DateTime, Utc};
use stowage_filesystem::FileSystem;
use stowage_utils::{
    is_hidden, is_root_prefix, local_basename, remote_basename, remote_join, validate_remote_path,
    UtilsError,
};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Local filesystem storage backend rooted at a single directory.
/// Put and Get degenerate to file copies; there is no session to manage.
pub struct LocalBackend {
    root: PathBuf,
}

impl LocalBackend {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Creates the root directory if it does not exist yet
    pub async fn initialize(&self) -> Result<(), StorageError> {
        FileSystem::ensure_directory(&self.root, "Local storage root")
            .await
            .map_err(|e| {
                StorageError::ConfigError(format!(
                    "cannot prepare local storage root '{}': {}",
                    self.root.display(),
                    e
                ))
            })?;
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Maps a backend key onto a path below the root
    fn resolve(&self, key: &str) -> Result<PathBuf, UtilsError> {
        validate_remote_path(key)?;
        Ok(self.root.join(key.trim_start_matches('/')))
    }

    async fn remove_one(&self, key: &str) -> Result<(), StorageError> {
        let error = |e: std::io::Error| StorageError::transfer(BackendKind::Local, Operation::Delete, key, e);

        let path = self
            .resolve(key)
            .map_err(|e| StorageError::transfer(BackendKind::Local, Operation::Delete, key, e))?;

        let metadata = fs::symlink_metadata(&path).await.map_err(error)?;
        if metadata.is_dir() {
            fs::remove_dir(&path).await.map_err(error)?;
        } else {
            fs::remove_file(&path).await.map_err(error)?;
        }

        tracing::debug!("Deleted {} from local storage", key);
        Ok(())
    }
}

#[async_trait::async_trait]
impl StorageBackend for LocalBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Local
    }

    async fn put(&self, local_path: &Path, folder: &str) -> Result<(), StorageError> {
        let source = local_path.display().to_string();
        let file_name = local_basename(local_path).ok_or_else(|| {
            StorageError::transfer(BackendKind::Local, Operation::Put, &source, "path has no file name")
        })?;

        let key = remote_join(folder, &file_name);
        let error = |e: std::io::Error| StorageError::transfer(BackendKind::Local, Operation::Put, &key, e);

        let target = self
            .resolve(&key)
            .map_err(|e| StorageError::transfer(BackendKind::Local, Operation::Put, &key, e))?;

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).await.map_err(error)?;
        }

        let bytes = fs::copy(local_path, &target).await.map_err(error)?;

        tracing::info!("Stored {} in local storage ({} bytes)", key, bytes);
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<Listing>, StorageError> {
        let error = |e: std::io::Error| StorageError::enumeration(BackendKind::Local, prefix, e);

        let dir = if is_root_prefix(prefix) {
            self.root.clone()
        } else {
            self.resolve(prefix)
                .map_err(|e| StorageError::enumeration(BackendKind::Local, prefix, e))?
        };

        let mut entries = fs::read_dir(&dir).await.map_err(error)?;
        let mut listing = Vec::new();

        while let Some(entry) = entries.next_entry().await.map_err(error)? {
            let name = entry.file_name().to_string_lossy().to_string();
            if is_hidden(&name) {
                continue;
            }

            let metadata = entry.metadata().await.map_err(error)?;
            let modified = metadata.modified().ok().map(DateTime::<Utc>::from);

            if let Some(record) = Listing::visible(&name, metadata.len(), modified, metadata.is_dir()) {
                listing.push(record);
            }
        }

        // read_dir order is platform dependent
        listing.sort_by(|a, b| a.key.cmp(&b.key));

        Ok(listing)
    }

    async fn remove(&self, keys: &[String]) -> DeleteReport {
        let mut report = DeleteReport::new();

        for key in keys {
            match self.remove_one(key).await {
                Ok(()) => report.record_deleted(key),
                Err(err) => {
                    report.record_failure(key, err);
                    break;
                }
            }
        }

        report
    }

    async fn get(&self, destination: &Path, keys: &[String]) -> Result<(), StorageError> {
        for key in keys {
            let error = |e: std::io::Error| StorageError::transfer(BackendKind::Local, Operation::Get, key, e);

            let name = remote_basename(key).ok_or_else(|| {
                StorageError::transfer(BackendKind::Local, Operation::Get, key, "key has no file name")
            })?;
            let source = self
                .resolve(key)
                .map_err(|e| StorageError::transfer(BackendKind::Local, Operation::Get, key, e))?;

            let bytes = fs::copy(&source, destination.join(name)).await.map_err(error)?;
            tracing::debug!("Fetched {} from local storage ({} bytes)", key, bytes);
        }

        Ok(())
    }
}
