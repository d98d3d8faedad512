use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Closed set of supported backends. The canonical name doubles as the registry key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BackendKind {
    Local,
    S3,
    Minio,
    Sftp,
    WebDav,
}

impl BackendKind {
    pub const ALL: [BackendKind; 5] = [
        BackendKind::Local,
        BackendKind::S3,
        BackendKind::Minio,
        BackendKind::Sftp,
        BackendKind::WebDav,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Local => "LOCAL",
            BackendKind::S3 => "S3",
            BackendKind::Minio => "MINIO",
            BackendKind::Sftp => "SFTP",
            BackendKind::WebDav => "WEBDAV",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BackendKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| s.to_string())
    }
}
