use super::models::{Config, StorageSettings, UploadSettings};
use super::ConfigError;

impl Config {
    /// Rejects settings that would only fail later, at the first storage call
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_uploads(&self.uploads)?;
        validate_storage(&self.storage)?;
        Ok(())
    }
}

fn validate_uploads(uploads: &UploadSettings) -> Result<(), ConfigError> {
    if uploads.temp_dir.trim().is_empty() {
        return Err(invalid("uploads.temp_dir must not be empty"));
    }
    if uploads.max_upload_size_mb == 0 {
        return Err(invalid("uploads.max_upload_size_mb must be greater than 0"));
    }
    if uploads.allowed_mime_types.is_empty() {
        tracing::warn!("uploads.allowed_mime_types is empty: every upload will be rejected");
    }
    Ok(())
}

fn validate_storage(storage: &StorageSettings) -> Result<(), ConfigError> {
    if storage.local.enabled {
        require("storage.local.root", &storage.local.root)?;
    }

    if storage.s3.enabled {
        require("storage.s3.region", &storage.s3.region)?;
        require("storage.s3.bucket", &storage.s3.bucket)?;
    }

    if storage.minio.enabled {
        require("storage.minio.endpoint", &storage.minio.endpoint)?;
        require("storage.minio.bucket", &storage.minio.bucket)?;
        if storage.minio.endpoint.contains("://") {
            return Err(invalid("storage.minio.endpoint must be host:port without a scheme (see use_ssl)"));
        }
    }

    if storage.sftp.enabled {
        require("storage.sftp.host", &storage.sftp.host)?;
        require("storage.sftp.user", &storage.sftp.user)?;
    }

    if storage.webdav.enabled {
        require("storage.webdav.host", &storage.webdav.host)?;
        let host = &storage.webdav.host;
        if !host.starts_with("http://") && !host.starts_with("https://") {
            return Err(invalid("storage.webdav.host must be an http(s) URL"));
        }
    }

    Ok(())
}

fn require(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        Err(invalid(&format!("{} is required when the backend is enabled", field)))
    } else {
        Ok(())
    }
}

fn invalid(message: &str) -> ConfigError {
    ConfigError::InvalidConfig(message.to_string())
}
