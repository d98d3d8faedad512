use std::path::PathBuf;
use stowage_storage::StorageError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("File type '{0}' is not allowed")]
    InvalidFileType(String),

    #[error("Upload exceeds the {limit} byte limit")]
    PayloadTooLarge { limit: u64 },

    #[error("Malformed upload request: {0}")]
    MalformedRequest(String),

    #[error("Failed to stage upload at {path}: {source}")]
    StagingError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    TransferError(#[from] StorageError),
}

impl UploadError {
    pub(crate) fn staging(path: &std::path::Path, source: std::io::Error) -> Self {
        UploadError::StagingError {
            path: path.to_path_buf(),
            source,
        }
    }
}
