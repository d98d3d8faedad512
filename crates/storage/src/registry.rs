use crate::backend::StorageBackend;
use crate::local::LocalBackend;
use crate::webdav::WebDavBackend;
use crate::{BackendKind, StorageError};
use stowage_config::StorageSettings;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

/// Named storage backends, built once at startup and shared read-only
#[derive(Default)]
pub struct BackendRegistry {
    backends: HashMap<String, Arc<dyn StorageBackend>>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        name: impl Into<String>,
        backend: Arc<dyn StorageBackend>,
    ) -> Result<(), StorageError> {
        let name = name.into();
        if self.backends.contains_key(&name) {
            return Err(StorageError::ConfigError(format!(
                "backend '{}' is registered twice",
                name
            )));
        }

        tracing::debug!("Registered {} storage backend as '{}'", backend.kind(), name);
        self.backends.insert(name, backend);
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Option<Arc<dyn StorageBackend>> {
        self.backends.get(name).cloned()
    }

    /// Like [`lookup`](Self::lookup), but also accepts backend kinds in any case ("webdav")
    pub fn require(&self, name: &str) -> Result<Arc<dyn StorageBackend>, StorageError> {
        self.lookup(name)
            .or_else(|| {
                let kind = name.parse::<BackendKind>().ok()?;
                self.lookup(kind.as_str())
            })
            .ok_or_else(|| StorageError::UnknownBackend(name.to_string()))
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.backends.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    /// Builds one backend per enabled section, keyed by its canonical kind name
    pub async fn from_config(settings: &StorageSettings) -> Result<Self, StorageError> {
        let mut registry = Self::new();

        if settings.local.enabled {
            let backend = LocalBackend::new(PathBuf::from(&settings.local.root));
            backend.initialize().await?;
            registry.register(BackendKind::Local.as_str(), Arc::new(backend))?;
        }

        if settings.s3.enabled {
            registry.register(BackendKind::S3.as_str(), build_s3(settings).await?)?;
        }

        if settings.minio.enabled {
            registry.register(BackendKind::Minio.as_str(), build_minio(settings).await?)?;
        }

        if settings.sftp.enabled {
            registry.register(BackendKind::Sftp.as_str(), build_sftp(settings)?)?;
        }

        if settings.webdav.enabled {
            let webdav = &settings.webdav;
            let backend = WebDavBackend::new(
                webdav.host.clone(),
                webdav.user.clone(),
                webdav.password.clone(),
            );
            tracing::info!("Initialized WebDAV storage backend: {}", webdav.host);
            registry.register(BackendKind::WebDav.as_str(), Arc::new(backend))?;
        }

        Ok(registry)
    }
}

#[cfg(feature = "s3")]
async fn build_s3(settings: &StorageSettings) -> Result<Arc<dyn StorageBackend>, StorageError> {
    let s3 = &settings.s3;
    let endpoint = (!s3.endpoint_url.is_empty()).then(|| s3.endpoint_url.clone());

    let backend = crate::S3Backend::new(
        BackendKind::S3,
        endpoint,
        s3.region.clone(),
        s3.access_key_id.clone(),
        s3.secret_access_key.clone(),
        s3.bucket.clone(),
    )
    .await;

    tracing::info!("Initialized S3 storage backend: bucket={}, region={}", s3.bucket, s3.region);
    Ok(Arc::new(backend))
}

#[cfg(feature = "s3")]
async fn build_minio(settings: &StorageSettings) -> Result<Arc<dyn StorageBackend>, StorageError> {
    let minio = &settings.minio;

    let backend = crate::S3Backend::new(
        BackendKind::Minio,
        Some(minio.endpoint_url()),
        minio.region.clone(),
        minio.access_key_id.clone(),
        minio.secret_access_key.clone(),
        minio.bucket.clone(),
    )
    .await;

    tracing::info!(
        "Initialized MinIO storage backend: bucket={}, endpoint={}",
        minio.bucket,
        minio.endpoint_url()
    );
    Ok(Arc::new(backend))
}

#[cfg(not(feature = "s3"))]
async fn build_s3(_settings: &StorageSettings) -> Result<Arc<dyn StorageBackend>, StorageError> {
    Err(not_compiled(BackendKind::S3, "s3"))
}

#[cfg(not(feature = "s3"))]
async fn build_minio(_settings: &StorageSettings) -> Result<Arc<dyn StorageBackend>, StorageError> {
    Err(not_compiled(BackendKind::Minio, "s3"))
}

#[cfg(feature = "sftp")]
fn build_sftp(settings: &StorageSettings) -> Result<Arc<dyn StorageBackend>, StorageError> {
    let sftp = &settings.sftp;

    let backend = crate::SftpBackend::new(
        sftp.host.clone(),
        sftp.port,
        sftp.user.clone(),
        sftp.password.clone(),
    );

    tracing::info!("Initialized SFTP storage backend: {}@{}:{}", sftp.user, sftp.host, sftp.port);
    Ok(Arc::new(backend))
}

#[cfg(not(feature = "sftp"))]
fn build_sftp(_settings: &StorageSettings) -> Result<Arc<dyn StorageBackend>, StorageError> {
    Err(not_compiled(BackendKind::Sftp, "sftp"))
}

#[cfg(any(not(feature = "s3"), not(feature = "sftp")))]
fn not_compiled(kind: BackendKind, feature: &str) -> StorageError {
    StorageError::ConfigError(format!(
        "{} backend enabled but not compiled. Rebuild with --features {} to enable it.",
        kind, feature
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use stowage_config::Config;
    use tempfile::TempDir;

    fn settings(toml: &str) -> StorageSettings {
        Config::from_toml(toml).unwrap().storage
    }

    #[tokio::test]
    async fn test_from_config_registers_enabled_backends() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("store");
        let toml = format!(
            r#"
[storage.local]
enabled = true
root = "{}"

[storage.webdav]
enabled = true
host = "https://dav.example.com/files"
user = "alice"
password = "secret"
"#,
            root.display().to_string().replace('\\', "/")
        );

        let registry = BackendRegistry::from_config(&settings(&toml)).await.unwrap();

        assert_eq!(registry.names(), vec!["LOCAL", "WEBDAV"]);
        assert!(root.is_dir());
        assert_eq!(registry.lookup("WEBDAV").unwrap().kind(), BackendKind::WebDav);
        assert!(registry.lookup("webdav").is_none());
        assert_eq!(registry.require("webdav").unwrap().kind(), BackendKind::WebDav);
    }

    #[tokio::test]
    async fn test_unknown_backend() {
        let registry = BackendRegistry::new();

        assert!(registry.is_empty());
        assert!(registry.lookup("FTP").is_none());
        assert!(matches!(
            registry.require("FTP"),
            Err(StorageError::UnknownBackend(name)) if name == "FTP"
        ));
    }

    #[test]
    fn test_duplicate_registration_is_rejected() {
        let mut registry = BackendRegistry::new();
        let backend: Arc<dyn StorageBackend> = Arc::new(LocalBackend::new(PathBuf::from("./a")));

        registry.register("LOCAL", backend.clone()).unwrap();
        let err = registry.register("LOCAL", backend).unwrap_err();

        assert!(matches!(err, StorageError::ConfigError(_)));
        assert_eq!(registry.len(), 1);
    }

    #[cfg(not(feature = "s3"))]
    #[tokio::test]
    async fn test_s3_without_feature_is_config_error() {
        let toml = r#"
[storage.local]
enabled = false

[storage.s3]
enabled = true
region = "eu-west-1"
access_key_id = "AKIA"
secret_access_key = "secret"
bucket = "uploads"
"#;

        let err = BackendRegistry::from_config(&settings(toml)).await.err().unwrap();

        assert!(matches!(err, StorageError::ConfigError(msg) if msg.contains("--features s3")));
    }
}
