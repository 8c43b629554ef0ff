//! File System Access Implementation using Tokio

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    storage::{FileMetadata, FileSystemAccess},
};
use bytes::Bytes;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio::fs;
use tokio::io::AsyncReadExt;
use tracing::debug;

/// Tokio-based file system implementation
///
/// All operations go through `tokio::fs`. The private data directory defaults
/// to the platform data dir (via `dirs`) and holds the library database and
/// resolved artwork files.
pub struct TokioFileSystem {
    data_dir: PathBuf,
}

impl TokioFileSystem {
    /// Create a new file system accessor with the default data directory
    pub fn new() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| {
                dirs::home_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join(".local")
                    .join("share")
            })
            .join("muziko");

        Self { data_dir }
    }

    /// Create a new file system accessor rooted at a custom data directory
    pub fn with_data_directory(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    fn map_io_error(e: std::io::Error) -> BridgeError {
        BridgeError::Io(e)
    }

    fn epoch_millis(time: std::io::Result<SystemTime>) -> Option<i64> {
        time.ok()
            .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
            .map(|d| d.as_millis() as i64)
    }
}

impl Default for TokioFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FileSystemAccess for TokioFileSystem {
    async fn get_data_directory(&self) -> Result<PathBuf> {
        if !fs::try_exists(&self.data_dir).await.unwrap_or(false) {
            fs::create_dir_all(&self.data_dir)
                .await
                .map_err(Self::map_io_error)?;
            debug!(path = ?self.data_dir, "Created data directory");
        }
        Ok(self.data_dir.clone())
    }

    async fn exists(&self, path: &Path) -> Result<bool> {
        fs::try_exists(path).await.map_err(Self::map_io_error)
    }

    async fn metadata(&self, path: &Path) -> Result<FileMetadata> {
        let metadata = fs::metadata(path).await.map_err(Self::map_io_error)?;

        Ok(FileMetadata {
            size: metadata.len(),
            created_at: Self::epoch_millis(metadata.created()),
            modified_at: Self::epoch_millis(metadata.modified()),
            is_directory: metadata.is_dir(),
        })
    }

    async fn create_dir_all(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path)
            .await
            .map_err(Self::map_io_error)?;
        debug!(path = ?path, "Created directory");
        Ok(())
    }

    async fn read_prefix(&self, path: &Path, max_len: usize) -> Result<Bytes> {
        let file = fs::File::open(path).await.map_err(Self::map_io_error)?;
        let mut buffer = Vec::with_capacity(max_len.min(4 * 1024 * 1024));
        file.take(max_len as u64)
            .read_to_end(&mut buffer)
            .await
            .map_err(Self::map_io_error)?;
        debug!(path = ?path, size = buffer.len(), max_len, "Read file prefix");
        Ok(Bytes::from(buffer))
    }

    async fn read_file(&self, path: &Path) -> Result<Bytes> {
        let data = fs::read(path).await.map_err(Self::map_io_error)?;
        debug!(path = ?path, size = data.len(), "Read file");
        Ok(Bytes::from(data))
    }

    async fn write_file(&self, path: &Path, data: Bytes) -> Result<()> {
        if let Some(parent) = path.parent() {
            self.create_dir_all(parent).await?;
        }

        fs::write(path, data.as_ref())
            .await
            .map_err(Self::map_io_error)?;
        debug!(path = ?path, size = data.len(), "Wrote file");
        Ok(())
    }

    async fn delete_file(&self, path: &Path) -> Result<()> {
        fs::remove_file(path).await.map_err(Self::map_io_error)?;
        debug!(path = ?path, "Deleted file");
        Ok(())
    }

    async fn list_directory(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let mut entries = Vec::new();
        let mut dir = fs::read_dir(path).await.map_err(Self::map_io_error)?;

        while let Some(entry) = dir.next_entry().await.map_err(Self::map_io_error)? {
            entries.push(entry.path());
        }

        entries.sort();
        Ok(entries)
    }
}
