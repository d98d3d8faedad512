mod multistatus;

use crate::backend::{DeleteReport, StorageBackend};
use crate::{BackendKind, Listing, Operation, StorageError};
use multistatus::{parse_multistatus, PROPFIND_BODY};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::{Client, Method, RequestBuilder};
use stowage_utils::{local_basename, remote_basename, remote_join};
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;

/// Characters escaped inside a single URL path segment
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// WebDAV storage backend (Nextcloud, Apache mod_dav, nginx dav, ...)
///
/// Each call builds its own HTTP client, so no connection outlives the operation.
pub struct WebDavBackend {
    base_url: String,
    user: String,
    password: String,
}

impl WebDavBackend {
    pub fn new(base_url: String, user: String, password: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            user,
            password,
        }
    }

    /// Absolute URL for a backend path, each segment percent-encoded
    fn url(&self, path: &str) -> String {
        let encoded: Vec<String> = path
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(|segment| utf8_percent_encode(segment, PATH_SEGMENT).to_string())
            .collect();

        format!("{}/{}", self.base_url, encoded.join("/"))
    }

    fn client() -> Result<Client, reqwest::Error> {
        Client::builder().build()
    }

    fn request(&self, client: &Client, method: Method, url: &str) -> RequestBuilder {
        client
            .request(method, url)
            .basic_auth(&self.user, Some(&self.password))
    }

    async fn remove_one(&self, client: &Client, key: &str) -> Result<(), StorageError> {
        let error = |e: reqwest::Error| StorageError::transfer(BackendKind::WebDav, Operation::Delete, key, e);

        self.request(client, Method::DELETE, &self.url(key))
            .send()
            .await
            .map_err(error)?
            .error_for_status()
            .map_err(error)?;

        tracing::debug!("Deleted {} from WebDAV", key);
        Ok(())
    }

    async fn fetch_one(&self, client: &Client, destination: &Path, key: &str) -> Result<(), StorageError> {
        let error = |e: Box<dyn std::error::Error + Send + Sync>| {
            StorageError::transfer(BackendKind::WebDav, Operation::Get, key, e)
        };

        let name = remote_basename(key).ok_or_else(|| error("key has no file name".into()))?;

        let mut response = self
            .request(client, Method::GET, &self.url(key))
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| error(e.into()))?;

        let mut file = tokio::fs::File::create(destination.join(name))
            .await
            .map_err(|e| error(e.into()))?;

        let mut bytes = 0u64;
        while let Some(chunk) = response.chunk().await.map_err(|e| error(e.into()))? {
            file.write_all(&chunk).await.map_err(|e| error(e.into()))?;
            bytes += chunk.len() as u64;
        }
        file.flush().await.map_err(|e| error(e.into()))?;

        tracing::debug!("Fetched {} from WebDAV ({} bytes)", key, bytes);
        Ok(())
    }
}

#[async_trait::async_trait]
impl StorageBackend for WebDavBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::WebDav
    }

    async fn put(&self, local_path: &Path, folder: &str) -> Result<(), StorageError> {
        let source = local_path.display().to_string();
        let file_name = local_basename(local_path).ok_or_else(|| {
            StorageError::transfer(BackendKind::WebDav, Operation::Put, &source, "path has no file name")
        })?;

        let key = remote_join(folder, &file_name);
        let error = |e: Box<dyn std::error::Error + Send + Sync>| {
            StorageError::transfer(BackendKind::WebDav, Operation::Put, &key, e)
        };

        let file = tokio::fs::File::open(local_path).await.map_err(|e| error(e.into()))?;
        let length = file.metadata().await.map_err(|e| error(e.into()))?.len();
        let mime_type = mime_guess::from_path(local_path)
            .first_or_octet_stream()
            .to_string();

        let client = Self::client().map_err(|e| error(e.into()))?;

        tracing::info!("Uploading {} to WebDAV ({} bytes)", key, length);

        self.request(&client, Method::PUT, &self.url(&key))
            .header(CONTENT_TYPE, mime_type)
            .header(CONTENT_LENGTH, length)
            .body(reqwest::Body::wrap_stream(ReaderStream::new(file)))
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| error(e.into()))?;

        tracing::info!("Upload complete: {}", key);
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<Listing>, StorageError> {
        let error = |e: Box<dyn std::error::Error + Send + Sync>| {
            StorageError::enumeration(BackendKind::WebDav, prefix, e)
        };

        // Collections are addressed with a trailing slash
        let url = format!("{}/", self.url(prefix).trim_end_matches('/'));
        let method = Method::from_bytes(b"PROPFIND").map_err(|e| error(e.into()))?;
        let client = Self::client().map_err(|e| error(e.into()))?;

        let body = self
            .request(&client, method, &url)
            .header("Depth", "1")
            .header(CONTENT_TYPE, "application/xml; charset=utf-8")
            .body(PROPFIND_BODY)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| error(e.into()))?
            .text()
            .await
            .map_err(|e| error(e.into()))?;

        parse_multistatus(&body, &url).map_err(|e| error(e.into()))
    }

    async fn remove(&self, keys: &[String]) -> DeleteReport {
        let mut report = DeleteReport::new();

        let client = match Self::client() {
            Ok(client) => client,
            Err(e) => {
                if let Some(first) = keys.first() {
                    let err = StorageError::transfer(BackendKind::WebDav, Operation::Delete, first, e);
                    report.record_failure(first, err);
                }
                return report;
            }
        };

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
        let client = Self::client().map_err(|e| {
            let target = keys.first().map(String::as_str).unwrap_or_default();
            StorageError::transfer(BackendKind::WebDav, Operation::Get, target, e)
        })?;

        for key in keys {
            self.fetch_one(&client, destination, key).await?;
        }

        Ok(())
    }
}
