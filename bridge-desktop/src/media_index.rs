//! Directory-backed media index
//!
//! Desktop hosts have no system media index, so the music directory is walked
//! and its audio files are served in cursor pages. A snapshot of the listing is
//! taken whenever a query starts from the beginning (no cursor), so that pages
//! of one enumeration stay consistent even if files change mid-sync.

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    media::{MediaAsset, MediaIndex, MediaPage, PermissionStatus},
};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info};

const AUDIO_EXTENSIONS: &[&str] = &["mp3", "flac", "ogg", "opus", "m4a", "mp4", "aac", "wav"];

pub struct DirectoryMediaIndex {
    root: PathBuf,
    snapshot: Mutex<Option<Vec<MediaAsset>>>,
}

impl DirectoryMediaIndex {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            snapshot: Mutex::new(None),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn is_audio(path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| AUDIO_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
            .unwrap_or(false)
    }

    fn epoch_millis(time: std::io::Result<SystemTime>) -> Option<i64> {
        time.ok()
            .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
            .map(|d| d.as_millis() as i64)
    }

    async fn scan(&self) -> Result<Vec<MediaAsset>> {
        let mut pending = vec![self.root.clone()];
        let mut files = Vec::new();

        while let Some(dir) = pending.pop() {
            let mut entries = fs::read_dir(&dir).await.map_err(BridgeError::Io)?;
            while let Some(entry) = entries.next_entry().await.map_err(BridgeError::Io)? {
                let path = entry.path();
                let file_type = entry.file_type().await.map_err(BridgeError::Io)?;
                if file_type.is_dir() {
                    pending.push(path);
                } else if file_type.is_file() && Self::is_audio(&path) {
                    files.push(path);
                }
            }
        }

        files.sort();

        let mut assets = Vec::with_capacity(files.len());
        for path in files {
            let metadata = fs::metadata(&path).await.map_err(BridgeError::Io)?;
            let relative = path.strip_prefix(&self.root).unwrap_or(&path);
            assets.push(MediaAsset {
                id: relative.to_string_lossy().into_owned(),
                filename: path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                uri: path.to_string_lossy().into_owned(),
                duration: 0.0,
                creation_time: Self::epoch_millis(metadata.created()),
                modification_time: Self::epoch_millis(metadata.modified()),
            });
        }

        info!(root = ?self.root, count = assets.len(), "Scanned music directory");
        Ok(assets)
    }
}

#[async_trait]
impl MediaIndex for DirectoryMediaIndex {
    async fn request_permission(&self) -> Result<PermissionStatus> {
        let readable = fs::metadata(&self.root)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false);

        Ok(if readable {
            PermissionStatus::Granted
        } else {
            PermissionStatus::Denied
        })
    }

    async fn audio_assets(&self, first: usize, after: Option<String>) -> Result<MediaPage> {
        let mut snapshot = self.snapshot.lock().await;
        if after.is_none() || snapshot.is_none() {
            *snapshot = Some(self.scan().await?);
        }
        let assets = snapshot.as_deref().unwrap_or_default();

        let start = match after {
            Some(cursor) => cursor.parse::<usize>().map_err(|_| {
                BridgeError::OperationFailed(format!("Invalid media cursor: {}", cursor))
            })?,
            None => 0,
        };
        let start = start.min(assets.len());
        let end = start.saturating_add(first).min(assets.len());
        let page: Vec<MediaAsset> = assets[start..end].to_vec();

        debug!(start, end, total = assets.len(), "Served media index page");

        Ok(MediaPage {
            assets: page,
            end_cursor: (end > start).then(|| end.to_string()),
            has_next_page: end < assets.len(),
            total_count: assets.len() as u64,
        })
    }
}
