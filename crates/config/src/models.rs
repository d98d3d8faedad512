use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default = "super::defaults::upload_settings")]
    pub uploads: UploadSettings,
    #[serde(default = "super::defaults::storage_settings")]
    pub storage: StorageSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UploadSettings {
    #[serde(default = "super::defaults::temp_dir")]
    pub temp_dir: String,
    #[serde(default = "super::defaults::max_upload_size_mb")]
    pub max_upload_size_mb: u64,
    #[serde(default = "super::defaults::allowed_mime_types")]
    pub allowed_mime_types: Vec<String>,
}

impl UploadSettings {
    /// Clamped to `u64::MAX` for absurd megabyte counts
    pub fn max_upload_bytes(&self) -> u64 {
        self.max_upload_size_mb.saturating_mul(1024 * 1024)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageSettings {
    #[serde(default = "super::defaults::local_settings")]
    pub local: LocalSettings,
    #[serde(default = "super::defaults::s3_settings")]
    pub s3: S3Settings,
    #[serde(default = "super::defaults::minio_settings")]
    pub minio: MinioSettings,
    #[serde(default = "super::defaults::sftp_settings")]
    pub sftp: SftpSettings,
    #[serde(default = "super::defaults::webdav_settings")]
    pub webdav: WebDavSettings,
}

impl StorageSettings {
    /// Number of backend sections with `enabled = true`
    pub fn enabled_count(&self) -> usize {
        [
            self.local.enabled,
            self.s3.enabled,
            self.minio.enabled,
            self.sftp.enabled,
            self.webdav.enabled,
        ]
        .into_iter()
        .filter(|enabled| *enabled)
        .count()
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LocalSettings {
    #[serde(default = "super::defaults::local_enabled")]
    pub enabled: bool,
    #[serde(default = "super::defaults::local_root")]
    pub root: String,
}

/// AWS S3 (or any S3-compatible service addressed by region)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct S3Settings {
    #[serde(default)]
    pub enabled: bool,
    /// Empty means the AWS endpoint for `region`
    #[serde(default)]
    pub endpoint_url: String,
    #[serde(default = "super::defaults::s3_region")]
    pub region: String,
    #[serde(default)]
    pub access_key_id: String,
    #[serde(default)]
    pub secret_access_key: String,
    #[serde(default)]
    pub bucket: String,
}

/// MinIO addressed by `host:port`, always path-style
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MinioSettings {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "super::defaults::minio_endpoint")]
    pub endpoint: String,
    #[serde(default)]
    pub access_key_id: String,
    #[serde(default)]
    pub secret_access_key: String,
    #[serde(default)]
    pub use_ssl: bool,
    #[serde(default = "super::defaults::s3_region")]
    pub region: String,
    #[serde(default)]
    pub bucket: String,
}

impl MinioSettings {
    pub fn endpoint_url(&self) -> String {
        let scheme = if self.use_ssl { "https" } else { "http" };
        format!("{}://{}", scheme, self.endpoint)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SftpSettings {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub host: String,
    #[serde(default = "super::defaults::sftp_port")]
    pub port: u16,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WebDavSettings {
    #[serde(default)]
    pub enabled: bool,
    /// Base URL of the WebDAV collection, e.g. `https://dav.example.com/remote.php/dav`
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub password: String,
}
