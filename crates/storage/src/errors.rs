use crate::kind::BackendKind;
use std::fmt;
use thiserror::Error;

/// Underlying cause carried by transfer and enumeration failures
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Storage operation that moved or removed data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Put,
    Get,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Put => "put",
            Operation::Get => "get",
            Operation::Delete => "delete",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("{backend} {operation} failed for '{target}': {source}")]
    TransferError {
        backend: BackendKind,
        operation: Operation,
        target: String,
        #[source]
        source: BoxError,
    },

    #[error("{backend} listing failed for '{prefix}': {source}")]
    EnumerationError {
        backend: BackendKind,
        prefix: String,
        #[source]
        source: BoxError,
    },

    #[error("Unknown storage backend: {0}")]
    UnknownBackend(String),

    #[error("Invalid storage configuration: {0}")]
    ConfigError(String),
}

impl StorageError {
    pub fn transfer(
        backend: BackendKind,
        operation: Operation,
        target: impl Into<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        StorageError::TransferError {
            backend,
            operation,
            target: target.into(),
            source: source.into(),
        }
    }

    pub fn enumeration(
        backend: BackendKind,
        prefix: impl Into<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        StorageError::EnumerationError {
            backend,
            prefix: prefix.into(),
            source: source.into(),
        }
    }
}
