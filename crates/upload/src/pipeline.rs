use crate::errors::UploadError;
use crate::sniff::{detect, SNIFF_LEN};
use axum::extract::multipart::{Field, MultipartError};
use axum::extract::{DefaultBodyLimit, Multipart};
use axum::http::StatusCode;
use stowage_config::UploadSettings;
use stowage_storage::{BackendKind, Operation, StorageBackend, StorageError};
use stowage_utils::sanitize_file_name;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

/// Room for multipart boundaries, part headers and small text fields on top of the file bytes
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// A file written to the temp directory after passing content sniffing
#[derive(Debug, Clone, PartialEq)]
pub struct StagedUpload {
    pub path: PathBuf,
    /// Sanitized client file name
    pub file_name: String,
    /// Sniffed content type
    pub content_type: String,
    pub size: u64,
}

/// Parse → Sniff → Stage → Place for a single multipart file field
#[derive(Debug, Clone)]
pub struct UploadPipeline {
    temp_dir: PathBuf,
    max_bytes: u64,
    allowed_mime_types: Vec<String>,
}

impl From<&UploadSettings> for UploadPipeline {
    fn from(settings: &UploadSettings) -> Self {
        Self {
            temp_dir: PathBuf::from(&settings.temp_dir),
            max_bytes: settings.max_upload_bytes(),
            allowed_mime_types: settings.allowed_mime_types.clone(),
        }
    }
}

impl UploadPipeline {
    pub fn new(settings: UploadSettings) -> Self {
        Self::from(&settings)
    }

    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Request body cap for routes that feed this pipeline.
    ///
    /// `Multipart` otherwise stops at axum's 2 MiB default. The file itself is still
    /// bounded by [`max_bytes`](Self::max_bytes).
    pub fn body_limit(&self) -> DefaultBodyLimit {
        DefaultBodyLimit::max(self.body_limit_bytes())
    }

    pub fn body_limit_bytes(&self) -> usize {
        usize::try_from(self.max_bytes)
            .unwrap_or(usize::MAX)
            .saturating_add(MULTIPART_OVERHEAD)
    }

    /// Compares media types only, so `text/plain; charset=utf-8` in the allow-list admits `text/plain`
    pub fn allows(&self, content_type: &str) -> bool {
        let sniffed = essence(content_type);
        self.allowed_mime_types
            .iter()
            .any(|allowed| essence(allowed).eq_ignore_ascii_case(sniffed))
    }

    /// Reads the part named `field`, checks its sniffed type and writes it to the temp directory.
    /// Nothing is written when the type is rejected.
    pub async fn stage(&self, multipart: &mut Multipart, field: &str) -> Result<StagedUpload, UploadError> {
        let mut part = loop {
            match multipart
                .next_field()
                .await
                .map_err(|e| self.multipart_error(e))?
            {
                Some(part) if part.name() == Some(field) => break part,
                Some(_) => continue,
                None => {
                    return Err(UploadError::MalformedRequest(format!(
                        "missing file field '{}'",
                        field
                    )))
                }
            }
        };

        let client_name = part
            .file_name()
            .ok_or_else(|| UploadError::MalformedRequest(format!("field '{}' carries no file", field)))?
            .to_string();
        let file_name = sanitize_file_name(&client_name)
            .map_err(|e| UploadError::MalformedRequest(e.to_string()))?;

        let mut received = 0u64;
        let mut head = Vec::with_capacity(SNIFF_LEN);
        while head.len() < SNIFF_LEN {
            match self.next_chunk(&mut part, &mut received).await? {
                Some(chunk) => head.extend_from_slice(&chunk),
                None => break,
            }
        }

        let content_type = detect(&head);
        if !self.allows(content_type) {
            tracing::warn!("Rejected upload '{}': sniffed type {}", file_name, content_type);
            return Err(UploadError::InvalidFileType(content_type.to_string()));
        }

        tokio::fs::create_dir_all(&self.temp_dir)
            .await
            .map_err(|e| UploadError::staging(&self.temp_dir, e))?;

        let path = self.temp_dir.join(&file_name);
        let size = match self.write_staged(&path, &head, &mut part, &mut received).await {
            Ok(size) => size,
            Err(e) => {
                if let Err(cleanup) = tokio::fs::remove_file(&path).await {
                    tracing::debug!("Could not remove partial upload {}: {}", path.display(), cleanup);
                }
                return Err(e);
            }
        };

        tracing::info!("Staged {} ({}, {} bytes)", path.display(), content_type, size);

        Ok(StagedUpload {
            path,
            file_name,
            content_type: content_type.to_string(),
            size,
        })
    }

    /// Stages `field`, then hands it to `backend` under `destination`.
    /// Without a backend the staged file is moved into the local directory `destination`.
    pub async fn upload(
        &self,
        multipart: &mut Multipart,
        field: &str,
        destination: &str,
        backend: Option<&dyn StorageBackend>,
    ) -> Result<(), UploadError> {
        let staged = self.stage(multipart, field).await?;

        match backend {
            Some(backend) => {
                backend.put(&staged.path, destination).await?;

                if let Err(e) = tokio::fs::remove_file(&staged.path).await {
                    tracing::warn!("Could not remove staged file {}: {}", staged.path.display(), e);
                }
            }
            None => {
                let target = Path::new(destination).join(&staged.file_name);
                tokio::fs::rename(&staged.path, &target).await.map_err(|e| {
                    StorageError::transfer(
                        BackendKind::Local,
                        Operation::Put,
                        target.display().to_string(),
                        e,
                    )
                })?;
            }
        }

        tracing::info!("Placed {} under '{}'", staged.file_name, destination);
        Ok(())
    }

    /// The extractor reports its body cap as 413
    fn multipart_error(&self, e: MultipartError) -> UploadError {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            UploadError::PayloadTooLarge {
                limit: self.body_limit_bytes() as u64,
            }
        } else {
            UploadError::MalformedRequest(e.body_text())
        }
    }

    async fn next_chunk(
        &self,
        part: &mut Field<'_>,
        received: &mut u64,
    ) -> Result<Option<bytes::Bytes>, UploadError> {
        let chunk = part
            .chunk()
            .await
            .map_err(|e| self.multipart_error(e))?;

        if let Some(chunk) = &chunk {
            *received += chunk.len() as u64;
            if *received > self.max_bytes {
                return Err(UploadError::PayloadTooLarge { limit: self.max_bytes });
            }
        }

        Ok(chunk)
    }

    async fn write_staged(
        &self,
        path: &Path,
        head: &[u8],
        part: &mut Field<'_>,
        received: &mut u64,
    ) -> Result<u64, UploadError> {
        let mut file = File::create(path).await.map_err(|e| UploadError::staging(path, e))?;
        file.write_all(head).await.map_err(|e| UploadError::staging(path, e))?;

        while let Some(chunk) = self.next_chunk(part, received).await? {
            file.write_all(&chunk).await.map_err(|e| UploadError::staging(path, e))?;
        }

        file.flush().await.map_err(|e| UploadError::staging(path, e))?;
        Ok(*received)
    }
}


fn essence(content_type: &str) -> &str {
    content_type.split(';').next().unwrap_or(content_type).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::extract::{FromRequest, State};
    use axum::http::Request;
    use axum::routing::post;
    use axum::Router;
    use std::sync::Arc;
    use stowage_storage::LocalBackend;
    use tempfile::TempDir;
    use tower::ServiceExt;

    const BOUNDARY: &str = "stowage-test-boundary";
    const PNG_SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

    struct Part<'a> {
        name: &'a str,
        file_name: Option<&'a str>,
        data: &'a [u8],
    }

    fn file_part<'a>(file_name: &'a str, data: &'a [u8]) -> Part<'a> {
        Part { name: "file", file_name: Some(file_name), data }
    }

    fn multipart_request(parts: &[Part<'_>]) -> Request<Body> {
        let mut body = Vec::new();
        for part in parts {
            body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
            match part.file_name {
                Some(file_name) => body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                         Content-Type: application/octet-stream\r\n\r\n",
                        part.name, file_name
                    )
                    .as_bytes(),
                ),
                None => body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", part.name).as_bytes(),
                ),
            }
            body.extend_from_slice(part.data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

        Request::builder()
            .method("POST")
            .uri("/upload")
            .header("content-type", format!("multipart/form-data; boundary={}", BOUNDARY))
            .body(Body::from(body))
            .unwrap()
    }

    async fn multipart(parts: &[Part<'_>]) -> Multipart {
        Multipart::from_request(multipart_request(parts), &()).await.unwrap()
    }

    async fn stage_handler(
        State(pipeline): State<Arc<UploadPipeline>>,
        mut multipart: Multipart,
    ) -> (StatusCode, String) {
        match pipeline.stage(&mut multipart, "file").await {
            Ok(staged) => (StatusCode::CREATED, staged.size.to_string()),
            Err(UploadError::PayloadTooLarge { limit }) => (StatusCode::PAYLOAD_TOO_LARGE, limit.to_string()),
            Err(e) => (StatusCode::BAD_REQUEST, e.to_string()),
        }
    }

    /// Serves `request` through a route layered with the pipeline's body limit
    async fn stage_via_router(pipeline: UploadPipeline, request: Request<Body>) -> (StatusCode, String) {
        let body_limit = pipeline.body_limit();
        let app = Router::new()
            .route("/upload", post(stage_handler))
            .with_state(Arc::new(pipeline))
            .layer(body_limit);

        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    fn png_bytes(len: usize) -> Vec<u8> {
        let mut data = PNG_SIGNATURE.to_vec();
        data.extend((0..len - PNG_SIGNATURE.len()).map(|i| (i % 253) as u8));
        data
    }

    fn create_test_pipeline(temp: &TempDir, allowed: &[&str], max_mb: u64) -> UploadPipeline {
        UploadPipeline::new(UploadSettings {
            temp_dir: temp.path().join("tmp").display().to_string(),
            max_upload_size_mb: max_mb,
            allowed_mime_types: allowed.iter().map(|m| m.to_string()).collect(),
        })
    }

    async fn temp_entries(pipeline: &UploadPipeline) -> usize {
        match tokio::fs::read_dir(pipeline.temp_dir()).await {
            Ok(mut entries) => {
                let mut count = 0;
                while entries.next_entry().await.unwrap().is_some() {
                    count += 1;
                }
                count
            }
            Err(_) => 0,
        }
    }

    #[tokio::test]
    async fn test_stage_png_is_byte_identical() {
        let temp = TempDir::new().unwrap();
        let pipeline = create_test_pipeline(&temp, &["image/png", "image/jpeg"], 10);
        let data = png_bytes(2048);

        let mut form = multipart(&[file_part("photo.png", &data)]).await;
        let staged = pipeline.stage(&mut form, "file").await.unwrap();

        assert_eq!(staged.content_type, "image/png");
        assert_eq!(staged.file_name, "photo.png");
        assert_eq!(staged.size, 2048);
        assert_eq!(staged.path, pipeline.temp_dir().join("photo.png"));
        assert_eq!(tokio::fs::read(&staged.path).await.unwrap(), data);
    }

    #[tokio::test]
    async fn test_stage_creates_missing_temp_dir() {
        let temp = TempDir::new().unwrap();
        let pipeline = create_test_pipeline(&temp, &["image/png"], 10);
        assert!(!pipeline.temp_dir().exists());

        let mut form = multipart(&[file_part("photo.png", &png_bytes(64))]).await;
        let staged = pipeline.stage(&mut form, "file").await.unwrap();

        assert!(pipeline.temp_dir().is_dir());
        assert!(staged.path.is_file());
    }

    #[tokio::test]
    async fn test_large_file_is_staged_intact() {
        let temp = TempDir::new().unwrap();
        let pipeline = create_test_pipeline(&temp, &["image/png"], 1);
        let data = png_bytes(300_000);

        let mut form = multipart(&[file_part("big.png", &data)]).await;
        let staged = pipeline.stage(&mut form, "file").await.unwrap();

        assert_eq!(staged.size, data.len() as u64);
        assert_eq!(tokio::fs::read(&staged.path).await.unwrap(), data);
    }

    #[tokio::test]
    async fn test_text_file_is_rejected_and_nothing_staged() {
        let temp = TempDir::new().unwrap();
        let pipeline = create_test_pipeline(&temp, &["image/png"], 10);

        let mut form = multipart(&[file_part("notes.txt", b"just some notes\n")]).await;
        let err = pipeline.stage(&mut form, "file").await.unwrap_err();

        assert!(matches!(err, UploadError::InvalidFileType(ref t) if t == "text/plain"));
        assert_eq!(temp_entries(&pipeline).await, 0);
    }

    #[tokio::test]
    async fn test_extension_does_not_decide_type() {
        let temp = TempDir::new().unwrap();
        let pipeline = create_test_pipeline(&temp, &["image/png"], 10);

        let mut form = multipart(&[file_part("fake.png", b"not really an image")]).await;
        let err = pipeline.stage(&mut form, "file").await.unwrap_err();

        assert!(matches!(err, UploadError::InvalidFileType(_)));
        assert!(!pipeline.temp_dir().join("fake.png").exists());
    }

    #[tokio::test]
    async fn test_empty_allow_list_rejects_everything() {
        let temp = TempDir::new().unwrap();
        let pipeline = create_test_pipeline(&temp, &[], 10);
        let data = png_bytes(128);

        let mut form = multipart(&[file_part("photo.png", &data)]).await;
        let err = pipeline.stage(&mut form, "file").await.unwrap_err();

        assert!(matches!(err, UploadError::InvalidFileType(ref t) if t == "image/png"));
    }

    #[tokio::test]
    async fn test_oversized_upload_is_rejected_and_cleaned_up() {
        let temp = TempDir::new().unwrap();
        let pipeline = create_test_pipeline(&temp, &["image/png"], 1);
        let data = png_bytes(1024 * 1024 + 10);

        let mut form = multipart(&[file_part("huge.png", &data)]).await;
        let err = pipeline.stage(&mut form, "file").await.unwrap_err();

        assert!(matches!(err, UploadError::PayloadTooLarge { limit } if limit == 1024 * 1024));
        assert!(!pipeline.temp_dir().join("huge.png").exists());
    }

    #[tokio::test]
    async fn test_missing_field_is_malformed() {
        let temp = TempDir::new().unwrap();
        let pipeline = create_test_pipeline(&temp, &["image/png"], 10);

        let mut form = multipart(&[Part { name: "comment", file_name: None, data: b"hi" }]).await;
        let err = pipeline.stage(&mut form, "file").await.unwrap_err();

        assert!(matches!(err, UploadError::MalformedRequest(_)));
    }

    #[tokio::test]
    async fn test_field_found_after_other_parts() {
        let temp = TempDir::new().unwrap();
        let pipeline = create_test_pipeline(&temp, &["image/png"], 10);
        let data = png_bytes(512);

        let mut form = multipart(&[
            Part { name: "comment", file_name: None, data: b"holiday" },
            file_part("photo.png", &data),
        ])
        .await;
        let staged = pipeline.stage(&mut form, "file").await.unwrap();

        assert_eq!(staged.size, 512);
    }

    #[tokio::test]
    async fn test_client_path_is_reduced_to_file_name() {
        let temp = TempDir::new().unwrap();
        let pipeline = create_test_pipeline(&temp, &["image/png"], 10);
        let data = png_bytes(64);

        let mut form = multipart(&[file_part("../../etc/photo.png", &data)]).await;
        let staged = pipeline.stage(&mut form, "file").await.unwrap();

        assert_eq!(staged.file_name, "photo.png");
        assert!(staged.path.starts_with(pipeline.temp_dir()));
    }

    #[tokio::test]
    async fn test_upload_with_backend_removes_staged_file() {
        let temp = TempDir::new().unwrap();
        let pipeline = create_test_pipeline(&temp, &["image/png"], 10);
        let backend = LocalBackend::new(temp.path().join("store"));
        backend.initialize().await.unwrap();
        let data = png_bytes(2048);

        let mut form = multipart(&[file_part("photo.png", &data)]).await;
        pipeline
            .upload(&mut form, "file", "albums", Some(&backend))
            .await
            .unwrap();

        let stored = backend.root().join("albums").join("photo.png");
        assert_eq!(tokio::fs::read(stored).await.unwrap(), data);
        assert!(!pipeline.temp_dir().join("photo.png").exists());
    }

    #[tokio::test]
    async fn test_upload_without_backend_moves_file() {
        let temp = TempDir::new().unwrap();
        let pipeline = create_test_pipeline(&temp, &["image/png"], 10);
        let destination = temp.path().join("final");
        tokio::fs::create_dir(&destination).await.unwrap();
        let data = png_bytes(256);

        let mut form = multipart(&[file_part("photo.png", &data)]).await;
        pipeline
            .upload(&mut form, "file", &destination.display().to_string(), None)
            .await
            .unwrap();

        assert_eq!(tokio::fs::read(destination.join("photo.png")).await.unwrap(), data);
        assert!(!pipeline.temp_dir().join("photo.png").exists());
    }

    #[tokio::test]
    async fn test_upload_to_missing_directory_keeps_staged_file() {
        let temp = TempDir::new().unwrap();
        let pipeline = create_test_pipeline(&temp, &["image/png"], 10);
        let data = png_bytes(256);
        let missing = temp.path().join("nowhere").display().to_string();

        let mut form = multipart(&[file_part("photo.png", &data)]).await;
        let err = pipeline.upload(&mut form, "file", &missing, None).await.unwrap_err();

        assert!(matches!(
            err,
            UploadError::TransferError(StorageError::TransferError { operation: Operation::Put, .. })
        ));
        assert!(pipeline.temp_dir().join("photo.png").exists());
    }

    #[tokio::test]
    async fn test_file_above_two_mebibytes_stages_under_body_limit() {
        let temp = TempDir::new().unwrap();
        let pipeline = create_test_pipeline(&temp, &["image/png"], 10);
        let staged_path = pipeline.temp_dir().join("large.png");
        let data = png_bytes(3 * 1024 * 1024);

        let request = multipart_request(&[file_part("large.png", &data)]);
        let (status, body) = stage_via_router(pipeline, request).await;

        assert_eq!(status, StatusCode::CREATED, "{}", body);
        assert_eq!(body, (3 * 1024 * 1024).to_string());
        assert_eq!(tokio::fs::read(staged_path).await.unwrap(), data);
    }

    #[tokio::test]
    async fn test_byte_counter_enforces_configured_maximum() {
        let temp = TempDir::new().unwrap();
        let pipeline = create_test_pipeline(&temp, &["image/png"], 1);
        let staged_path = pipeline.temp_dir().join("over.png");
        let data = png_bytes(1024 * 1024 + 10);

        let request = multipart_request(&[file_part("over.png", &data)]);
        let (status, body) = stage_via_router(pipeline, request).await;

        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body, (1024 * 1024).to_string());
        assert!(!staged_path.exists());
    }

    #[tokio::test]
    async fn test_body_over_limit_reports_enforced_limit() {
        let temp = TempDir::new().unwrap();
        let pipeline = create_test_pipeline(&temp, &["image/png"], 1);
        let enforced = pipeline.body_limit_bytes();
        let data = png_bytes(3 * 1024 * 1024);

        let request = multipart_request(&[file_part("huge.png", &data)]);
        let (status, body) = stage_via_router(pipeline, request).await;

        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body, enforced.to_string());
    }

    #[test]
    fn test_body_limit_leaves_room_for_framing() {
        let temp = TempDir::new().unwrap();
        let pipeline = create_test_pipeline(&temp, &["image/png"], 10);

        assert!(pipeline.body_limit_bytes() > pipeline.max_bytes() as usize);
    }

    #[test]
    fn test_allow_list_ignores_parameters() {
        let temp = TempDir::new().unwrap();
        let pipeline = create_test_pipeline(&temp, &["text/plain; charset=utf-8", "IMAGE/PNG"], 10);

        assert!(pipeline.allows("text/plain"));
        assert!(pipeline.allows("image/png"));
        assert!(!pipeline.allows("image/gif"));
    }

    #[tokio::test]
    async fn test_text_accepted_by_charset_entry() {
        let temp = TempDir::new().unwrap();
        let pipeline = create_test_pipeline(&temp, &["text/plain; charset=utf-8"], 10);

        let mut form = multipart(&[file_part("notes.txt", b"meeting notes\n")]).await;
        let staged = pipeline.stage(&mut form, "file").await.unwrap();

        assert_eq!(staged.content_type, "text/plain");
    }
}
