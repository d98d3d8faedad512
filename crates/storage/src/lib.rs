mod backend;
mod errors;
mod kind;
mod listing;
mod local;
mod registry;
mod webdav;

#[cfg(feature = "s3")]
mod s3;

#[cfg(feature = "sftp")]
mod sftp;

pub use backend::{DeleteReport, StorageBackend};
pub use errors::{BoxError, Operation, StorageError};
pub use kind::BackendKind;
pub use listing::Listing;
pub use local::LocalBackend;
pub use registry::BackendRegistry;
pub use webdav::WebDavBackend;

#[cfg(feature = "s3")]
pub use s3::S3Backend;

#[cfg(feature = "sftp")]
pub use sftp::SftpBackend;
