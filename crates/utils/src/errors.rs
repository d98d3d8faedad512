use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UtilsError {
    #[error("Invalid path: {0}")]
    PathError(String),

    #[error("Invalid file name: {0}")]
    FileNameError(String),
}
