// Re-export all public APIs from the workspace crates

pub use stowage_events::*;
pub use stowage_utils::*;
pub use stowage_filesystem::*;
pub use stowage_config::*;
pub use stowage_storage::*;
pub use stowage_upload::*;

/// Prelude module for convenient imports
pub mod prelude {
    // Storage contract and adapters
    pub use stowage_storage::{
        BackendKind, BackendRegistry, Listing, LocalBackend, StorageBackend, StorageError,
        WebDavBackend,
    };

    #[cfg(feature = "s3")]
    pub use stowage_storage::S3Backend;

    #[cfg(feature = "sftp")]
    pub use stowage_storage::SftpBackend;

    // Upload pipeline
    pub use stowage_upload::{StagedUpload, UploadError, UploadPipeline};

    // Events
    pub use stowage_events::{AppEvent, EventBus};

    // Configuration
    pub use stowage_config::Config;

    // Filesystem
    pub use stowage_filesystem::FileSystem;
}
