use chrono::{DateTime, Utc};
use serde::Serialize;
use stowage_utils::{bytes_to_megabytes, is_hidden};

/// Normalized description of one entry returned by `List`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub key: String,
    /// Size in megabytes (`bytes / 1024 / 1024`)
    pub size: f64,
    pub last_modified: Option<DateTime<Utc>>,
    #[serde(rename = "isDirectory")]
    pub is_dir: bool,
}

impl Listing {
    /// Builds a record for a visible entry. Hidden (`.`-prefixed) and empty names yield `None`.
    pub fn visible(
        name: &str,
        size_bytes: u64,
        last_modified: Option<DateTime<Utc>>,
        is_dir: bool,
    ) -> Option<Self> {
        if name.is_empty() || is_hidden(name) {
            return None;
        }

        Some(Self {
            key: name.to_string(),
            size: bytes_to_megabytes(size_bytes),
            last_modified,
            is_dir,
        })
    }
}
