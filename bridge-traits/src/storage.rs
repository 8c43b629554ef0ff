//! Storage and File System Abstractions
//!
//! Platform-agnostic file I/O used by the metadata extractor (bounded prefix
//! reads) and the artwork store (writing and clearing image files).

use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// File metadata information
#[derive(Debug, Clone)]
pub struct FileMetadata {
    pub size: u64,
    pub created_at: Option<i64>,
    pub modified_at: Option<i64>,
    pub is_directory: bool,
}

/// File system access trait
///
/// Abstracts file I/O so that the core never touches `std::fs` directly:
/// - Desktop: direct filesystem access through `tokio::fs`
/// - Mobile: sandboxed app directories
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::FileSystemAccess;
///
/// async fn header(fs: &dyn FileSystemAccess, path: &Path) -> Result<Bytes> {
///     // Only the first 48 KiB are needed to parse most tag headers.
///     fs.read_prefix(path, 48 * 1024).await
/// }
/// ```
#[async_trait]
pub trait FileSystemAccess: Send + Sync {
    /// Get the application's private data directory
    async fn get_data_directory(&self) -> Result<PathBuf>;

    /// Check if a file or directory exists
    async fn exists(&self, path: &Path) -> Result<bool>;

    /// Get metadata for a file or directory
    async fn metadata(&self, path: &Path) -> Result<FileMetadata>;

    /// Create a directory and all parent directories if they don't exist
    async fn create_dir_all(&self, path: &Path) -> Result<()>;

    /// Read at most `max_len` bytes from the start of the file.
    ///
    /// Files shorter than `max_len` yield their whole contents.
    async fn read_prefix(&self, path: &Path, max_len: usize) -> Result<Bytes>;

    /// Read entire file contents into memory
    async fn read_file(&self, path: &Path) -> Result<Bytes>;

    /// Write data to a file, creating or truncating it
    async fn write_file(&self, path: &Path, data: Bytes) -> Result<()>;

    /// Delete a file
    async fn delete_file(&self, path: &Path) -> Result<()>;

    /// List all entries in a directory
    async fn list_directory(&self, path: &Path) -> Result<Vec<PathBuf>>;
}
