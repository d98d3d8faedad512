use crate::backend::{DeleteReport, StorageBackend};
use crate::{BackendKind, BoxError, Listing, Operation, StorageError};
use chrono::{DateTime, Utc};
use ssh2::{Session, Sftp};
use stowage_utils::{is_root_prefix, local_basename, remote_basename, remote_join};
use std::net::TcpStream;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Connection parameters for an SFTP server using password authentication
#[derive(Debug, Clone)]
struct Credentials {
    host: String,
    port: u16,
    user: String,
    password: String,
}

/// An authenticated SFTP channel. The session must outlive the channel.
struct Connection {
    sftp: Sftp,
    _session: Session,
}

impl Connection {
    fn open(credentials: &Credentials) -> Result<Self, BoxError> {
        let tcp = TcpStream::connect((credentials.host.as_str(), credentials.port))?;

        let mut session = Session::new()?;
        session.set_tcp_stream(tcp);
        session.handshake()?;
        session.userauth_password(&credentials.user, &credentials.password)?;

        let sftp = session.sftp()?;
        if let Ok(home) = sftp.realpath(Path::new(".")) {
            tracing::debug!("SFTP session opened on {} (home {})", credentials.host, home.display());
        }

        Ok(Self { sftp, _session: session })
    }
}

/// SFTP storage backend
///
/// ssh2 is blocking, so every operation runs on the blocking pool with its own session.
pub struct SftpBackend {
    credentials: Arc<Credentials>,
}

impl SftpBackend {
    pub fn new(host: String, port: u16, user: String, password: String) -> Self {
        Self {
            credentials: Arc::new(Credentials { host, port, user, password }),
        }
    }

    /// Runs `work` against a fresh connection on the blocking pool
    async fn with_connection<T, F>(&self, work: F) -> Result<T, BoxError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, BoxError> + Send + 'static,
    {
        let credentials = Arc::clone(&self.credentials);

        tokio::task::spawn_blocking(move || {
            let connection = Connection::open(&credentials)?;
            work(&connection)
        })
        .await?
    }
}

fn remote_dir(prefix: &str) -> PathBuf {
    if is_root_prefix(prefix) {
        PathBuf::from("/")
    } else {
        PathBuf::from(prefix)
    }
}

fn remove_key(sftp: &Sftp, key: &str) -> Result<(), ssh2::Error> {
    let path = Path::new(key);
    if sftp.stat(path)?.is_dir() {
        sftp.rmdir(path)
    } else {
        sftp.unlink(path)
    }
}

fn fetch_key(sftp: &Sftp, destination: &Path, key: &str) -> Result<u64, BoxError> {
    let name = remote_basename(key).ok_or("key has no file name")?;

    let mut remote = sftp.open(Path::new(key))?;
    let mut local = std::fs::File::create(destination.join(name))?;
    let bytes = std::io::copy(&mut remote, &mut local)?;
    local.sync_all()?;

    Ok(bytes)
}

#[async_trait::async_trait]
impl StorageBackend for SftpBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Sftp
    }

    async fn put(&self, local_path: &Path, folder: &str) -> Result<(), StorageError> {
        let source = local_path.display().to_string();
        let file_name = local_basename(local_path).ok_or_else(|| {
            StorageError::transfer(BackendKind::Sftp, Operation::Put, &source, "path has no file name")
        })?;

        let key = remote_join(folder, &file_name);
        let local = local_path.to_path_buf();
        let remote = PathBuf::from(&key);

        tracing::info!("Uploading {} to SFTP", key);

        let bytes = self
            .with_connection(move |conn| {
                let mut input = std::fs::File::open(&local)?;
                let mut output = conn.sftp.create(&remote)?;
                Ok(std::io::copy(&mut input, &mut output)?)
            })
            .await
            .map_err(|e| StorageError::transfer(BackendKind::Sftp, Operation::Put, &key, e))?;

        tracing::info!("Upload complete: {} ({} bytes)", key, bytes);
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<Listing>, StorageError> {
        let dir = remote_dir(prefix);

        let entries = self
            .with_connection(move |conn| Ok(conn.sftp.readdir(&dir)?))
            .await
            .map_err(|e| StorageError::enumeration(BackendKind::Sftp, prefix, e))?;

        let listing = entries
            .into_iter()
            .filter_map(|(path, stat)| {
                let name = path.file_name()?.to_string_lossy().to_string();
                let modified = stat
                    .mtime
                    .and_then(|secs| DateTime::<Utc>::from_timestamp(secs as i64, 0));
                Listing::visible(&name, stat.size.unwrap_or(0), modified, stat.is_dir())
            })
            .collect();

        Ok(listing)
    }

    async fn remove(&self, keys: &[String]) -> DeleteReport {
        let owned = keys.to_vec();

        let outcome = self
            .with_connection(move |conn| {
                let mut deleted = Vec::new();
                for key in &owned {
                    if let Err(e) = remove_key(&conn.sftp, key) {
                        return Ok((deleted, Some((key.clone(), e))));
                    }
                    deleted.push(key.clone());
                }
                Ok((deleted, None))
            })
            .await;

        let mut report = DeleteReport::new();
        match outcome {
            Ok((deleted, failure)) => {
                for key in &deleted {
                    tracing::debug!("Deleted {} from SFTP", key);
                    report.record_deleted(key);
                }
                if let Some((key, e)) = failure {
                    let err = StorageError::transfer(BackendKind::Sftp, Operation::Delete, &key, e);
                    report.record_failure(&key, err);
                }
            }
            Err(e) => {
                if let Some(first) = keys.first() {
                    let err = StorageError::transfer(BackendKind::Sftp, Operation::Delete, first, e);
                    report.record_failure(first, err);
                }
            }
        }

        report
    }

    async fn get(&self, destination: &Path, keys: &[String]) -> Result<(), StorageError> {
        let owned = keys.to_vec();
        let destination = destination.to_path_buf();

        let outcome = self
            .with_connection(move |conn| {
                for key in &owned {
                    match fetch_key(&conn.sftp, &destination, key) {
                        Ok(bytes) => tracing::debug!("Fetched {} from SFTP ({} bytes)", key, bytes),
                        Err(e) => return Ok(Some((key.clone(), e))),
                    }
                }
                Ok(None)
            })
            .await;

        match outcome {
            Ok(None) => Ok(()),
            Ok(Some((key, e))) => Err(StorageError::transfer(BackendKind::Sftp, Operation::Get, key, e)),
            Err(e) => {
                let target = keys.first().cloned().unwrap_or_default();
                Err(StorageError::transfer(BackendKind::Sftp, Operation::Get, target, e))
            }
        }
    }
}
