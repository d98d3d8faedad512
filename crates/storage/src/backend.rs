use crate::{BackendKind, Listing, StorageError};
use std::path::Path;

/// Storage backend trait for file storage abstraction.
///
/// Every call is self-contained: adapters open whatever session they need,
/// perform the operation and tear the session down before returning.
#[async_trait::async_trait]
pub trait StorageBackend: Send + Sync {
    /// Which backend this adapter talks to
    fn kind(&self) -> BackendKind;

    /// Transfers `local_path` to `folder/<basename(local_path)>`.
    /// The local file is never modified.
    async fn put(&self, local_path: &Path, folder: &str) -> Result<(), StorageError>;

    /// Immediate, non-hidden entries under `prefix` (`""` or `"/"` is the root)
    async fn list(&self, prefix: &str) -> Result<Vec<Listing>, StorageError>;

    /// Removes keys one at a time, stopping at the first failure
    async fn remove(&self, keys: &[String]) -> DeleteReport;

    /// Streams each key to `destination/<basename(key)>`, stopping at the first failure.
    /// Files fetched before a failure stay on disk.
    async fn get(&self, destination: &Path, keys: &[String]) -> Result<(), StorageError>;

    /// `true` only when every key was deleted. Keys deleted before a failure stay deleted;
    /// use [`StorageBackend::remove`] to learn which key failed.
    async fn delete(&self, keys: &[String]) -> bool {
        let report = self.remove(keys).await;

        if let Some((key, err)) = &report.failed {
            tracing::warn!(
                "{} delete stopped at '{}' after {} key(s): {}",
                self.kind(),
                key,
                report.deleted.len(),
                err
            );
        }

        report.is_complete()
    }
}

/// Outcome of a sequential multi-key delete
#[derive(Debug, Default)]
pub struct DeleteReport {
    pub deleted: Vec<String>,
    /// First key that failed, with its cause. Later keys were not attempted.
    pub failed: Option<(String, StorageError)>,
}

impl DeleteReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_deleted(&mut self, key: &str) {
        self.deleted.push(key.to_string());
    }

    pub fn record_failure(&mut self, key: &str, err: StorageError) {
        self.failed = Some((key.to_string(), err));
    }

    pub fn is_complete(&self) -> bool {
        self.failed.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Operation;

    #[test]
    fn test_empty_report_is_complete() {
        let report = DeleteReport::new();
        assert!(report.is_complete());
        assert!(report.deleted.is_empty());
    }

    #[test]
    fn test_failure_marks_report_incomplete() {
        let mut report = DeleteReport::new();
        report.record_deleted("a.txt");
        report.record_failure(
            "missing.txt",
            StorageError::transfer(BackendKind::Local, Operation::Delete, "missing.txt", "not found"),
        );

        assert!(!report.is_complete());
        assert_eq!(report.deleted, vec!["a.txt"]);
        assert_eq!(report.failed.as_ref().map(|(k, _)| k.as_str()), Some("missing.txt"));
    }
}
