use super::models::FileSystem;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;

impl FileSystem {
    /// Creates `path` (and parents) if missing, returning its absolute form.
    pub async fn ensure_directory<P: AsRef<Path>>(path: P, description: &str) -> io::Result<PathBuf> {
        let abs_path = Self::get_absolute_path(path.as_ref())?;
        Self::create_directory(&abs_path, description).await?;
        Ok(abs_path)
    }

    async fn create_directory(path: &Path, description: &str) -> io::Result<()> {
        if !fs::try_exists(path).await? {
            fs::create_dir_all(path).await?;
            tracing::debug!("    Created: {} ({})", path.display(), description);
        } else {
            tracing::debug!("    Exists:  {} ({})", path.display(), description);
        }
        Ok(())
    }

    pub fn get_absolute_path(path: &Path) -> io::Result<PathBuf> {
        let abs_path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()?.join(path)
        };
        Ok(abs_path)
    }

    pub fn get_absolute_path_string(path: &str) -> io::Result<String> {
        let path_buf = PathBuf::from(path);
        let abs = Self::get_absolute_path(&path_buf)?;
        Ok(abs.to_string_lossy().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_ensure_directory_creates_nested_path() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("uploads").join("staging");

        let created = FileSystem::ensure_directory(&target, "Staging directory").await.unwrap();

        assert_eq!(created, target);
        assert!(target.is_dir());

        // Second call is a no-op
        FileSystem::ensure_directory(&target, "Staging directory").await.unwrap();
        assert!(target.is_dir());
    }

    #[test]
    fn test_absolute_path_keeps_absolute_input() {
        let abs = FileSystem::get_absolute_path(Path::new("/var/lib/stowage")).unwrap();
        assert_eq!(abs, PathBuf::from("/var/lib/stowage"));

        let relative = FileSystem::get_absolute_path(Path::new("tmp")).unwrap();
        assert!(relative.is_absolute());
        assert!(relative.ends_with("tmp"));
    }
}
