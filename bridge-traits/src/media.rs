//! Device Media Index Abstraction
//!
//! The local source provider enumerates audio assets through the host's media
//! index (MediaStore on Android, the Photos/MediaPlayer library on iOS, a
//! directory walk on desktop). The index answers paginated queries with an
//! opaque cursor and only coarse per-asset metadata; tag data is read
//! separately from the file itself.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Outcome of a media permission request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PermissionStatus {
    Granted,
    Denied,
    Undetermined,
}

impl PermissionStatus {
    pub fn is_granted(&self) -> bool {
        matches!(self, PermissionStatus::Granted)
    }
}

/// A single audio asset known to the device media index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaAsset {
    /// Index-assigned identifier, stable for the lifetime of the asset.
    pub id: String,
    pub filename: String,
    /// Locator the file can be read from.
    pub uri: String,
    /// Duration in seconds.
    pub duration: f64,
    /// Creation time (epoch milliseconds).
    pub creation_time: Option<i64>,
    /// Modification time (epoch milliseconds).
    pub modification_time: Option<i64>,
}

/// One page of a media index query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MediaPage {
    pub assets: Vec<MediaAsset>,
    /// Cursor to pass as `after` for the next page.
    pub end_cursor: Option<String>,
    pub has_next_page: bool,
    /// Total number of audio assets known to the index.
    pub total_count: u64,
}

/// Paginated access to the device media index.
///
/// A query with `first == 0` returns no assets but reports `total_count`.
#[async_trait]
pub trait MediaIndex: Send + Sync {
    /// Request (or re-check) permission to read the media index.
    async fn request_permission(&self) -> Result<PermissionStatus>;

    /// Fetch up to `first` audio assets following the `after` cursor.
    async fn audio_assets(&self, first: usize, after: Option<String>) -> Result<MediaPage>;
}
