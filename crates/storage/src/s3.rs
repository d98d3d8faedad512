use crate::backend::{DeleteReport, StorageBackend};
use crate::{BackendKind, Listing, Operation, StorageError};
use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::{ByteStream, DateTime as AwsDateTime};
use aws_sdk_s3::{Client, Config};
use chrono::{DateTime, Utc};
use stowage_utils::{is_root_prefix, local_basename, remote_basename, remote_join};
use std::path::Path;
use tokio::io::AsyncWriteExt;

/// S3-compatible storage backend
/// Compatible with: AWS S3, MinIO, Cloudflare R2, DigitalOcean Spaces, etc.
///
/// Only the resolved SDK configuration is kept; a client is built per call.
pub struct S3Backend {
    kind: BackendKind,
    config: Config,
    bucket: String,
}

impl S3Backend {
    /// `kind` is [`BackendKind::S3`] or [`BackendKind::Minio`]. MinIO needs path-style addressing.
    pub async fn new(
        kind: BackendKind,
        endpoint_url: Option<String>,
        region: String,
        access_key_id: String,
        secret_access_key: String,
        bucket: String,
    ) -> Self {
        let credentials = Credentials::new(
            access_key_id,
            secret_access_key,
            None,
            None,
            "stowage-s3",
        );

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .credentials_provider(credentials)
            .region(Region::new(region));

        if let Some(endpoint) = endpoint_url.filter(|e| !e.is_empty()) {
            loader = loader.endpoint_url(endpoint);
        }

        let sdk_config = loader.load().await;
        let config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(kind == BackendKind::Minio)
            .build();

        Self { kind, config, bucket }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    fn client(&self) -> Client {
        Client::from_conf(self.config.clone())
    }

    async fn remove_one(&self, client: &Client, key: &str) -> Result<(), StorageError> {
        let error = |message: String| StorageError::transfer(self.kind, Operation::Delete, key, message);

        // delete_object succeeds on missing keys
        client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| error(DisplayErrorContext(e).to_string()))?;

        client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| error(DisplayErrorContext(e).to_string()))?;

        tracing::debug!("Deleted {} from bucket {}", key, self.bucket);
        Ok(())
    }

    async fn fetch_one(&self, client: &Client, destination: &Path, key: &str) -> Result<(), StorageError> {
        let error = |message: String| StorageError::transfer(self.kind, Operation::Get, key, message);

        let name = remote_basename(key).ok_or_else(|| error("key has no file name".to_string()))?;

        let object = client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| error(DisplayErrorContext(e).to_string()))?;

        let mut file = tokio::fs::File::create(destination.join(name))
            .await
            .map_err(|e| error(e.to_string()))?;

        let mut body = object.body.into_async_read();
        let bytes = tokio::io::copy(&mut body, &mut file)
            .await
            .map_err(|e| error(e.to_string()))?;
        file.flush().await.map_err(|e| error(e.to_string()))?;

        tracing::debug!("Fetched {} from bucket {} ({} bytes)", key, self.bucket, bytes);
        Ok(())
    }
}

fn to_chrono(timestamp: &AwsDateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(timestamp.secs(), timestamp.subsec_nanos())
}

/// Object-store prefix for an immediate listing: root is "", anything else ends in "/"
fn list_prefix(prefix: &str) -> String {
    if is_root_prefix(prefix) {
        String::new()
    } else {
        format!("{}/", prefix.trim_matches('/'))
    }
}

#[async_trait::async_trait]
impl StorageBackend for S3Backend {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    async fn put(&self, local_path: &Path, folder: &str) -> Result<(), StorageError> {
        let source = local_path.display().to_string();
        let file_name = local_basename(local_path).ok_or_else(|| {
            StorageError::transfer(self.kind, Operation::Put, &source, "path has no file name")
        })?;

        let key = remote_join(folder, &file_name);
        let error = |message: String| StorageError::transfer(self.kind, Operation::Put, &key, message);

        let body = ByteStream::from_path(local_path)
            .await
            .map_err(|e| error(e.to_string()))?;
        let content_type = mime_guess::from_path(local_path)
            .first_or_octet_stream()
            .to_string();

        tracing::info!("Uploading {} to bucket {}", key, self.bucket);

        self.client()
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .content_type(content_type)
            .body(body)
            .send()
            .await
            .map_err(|e| error(DisplayErrorContext(e).to_string()))?;

        tracing::info!("Upload complete: {}", key);
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<Listing>, StorageError> {
        let error = |message: String| StorageError::enumeration(self.kind, prefix, message);

        let object_prefix = list_prefix(prefix);
        let client = self.client();
        let mut pages = client
            .list_objects_v2()
            .bucket(&self.bucket)
            .prefix(&object_prefix)
            .delimiter("/")
            .into_paginator()
            .send();

        let mut listing = Vec::new();

        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| error(DisplayErrorContext(e).to_string()))?;

            for common in page.common_prefixes() {
                let Some(full) = common.prefix() else { continue };
                let name = full.strip_prefix(&object_prefix).unwrap_or(full).trim_end_matches('/');
                if let Some(record) = Listing::visible(name, 0, None, true) {
                    listing.push(record);
                }
            }

            for object in page.contents() {
                let Some(key) = object.key() else { continue };
                let name = key.strip_prefix(&object_prefix).unwrap_or(key);
                let size = object.size().unwrap_or(0).max(0) as u64;
                let modified = object.last_modified().and_then(to_chrono);

                if let Some(record) = Listing::visible(name, size, modified, false) {
                    listing.push(record);
                }
            }
        }

        Ok(listing)
    }

    async fn remove(&self, keys: &[String]) -> DeleteReport {
        let mut report = DeleteReport::new();
        let client = self.client();

        for key in keys {
            match self.remove_one(&client, key).await {
                Ok(()) => report.record_deleted(key),
                Err(err) => {
                    report.record_failure(key, err);
                    break;
                }
            }
        }

        report
    }

    async fn get(&self, destination: &Path, keys: &[String]) -> Result<(), StorageError> {
        let client = self.client();

        for key in keys {
            self.fetch_one(&client, destination, key).await?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_prefix() {
        assert_eq!(list_prefix(""), "");
        assert_eq!(list_prefix("/"), "");
        assert_eq!(list_prefix("photos"), "photos/");
        assert_eq!(list_prefix("/photos/2024/"), "photos/2024/");
    }

    #[test]
    fn test_to_chrono() {
        let timestamp = AwsDateTime::from_secs(1_704_285_000);
        let converted = to_chrono(&timestamp).unwrap();
        assert_eq!(converted.to_rfc3339(), "2024-01-03T12:30:00+00:00");
    }

    #[tokio::test]
    async fn test_minio_backend_reports_its_kind() {
        let backend = S3Backend::new(
            BackendKind::Minio,
            Some("http://localhost:9000".to_string()),
            "us-east-1".to_string(),
            "minioadmin".to_string(),
            "minioadmin".to_string(),
            "uploads".to_string(),
        )
        .await;

        assert_eq!(backend.kind(), BackendKind::Minio);
        assert_eq!(backend.bucket(), "uploads");
    }
}
