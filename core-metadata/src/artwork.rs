//! Artwork Resolution
//!
//! Stores artwork files for artists and albums and runs the ordered provider
//! chain that finds them.
//!
//! ## Overview
//!
//! - `ArtworkStore` writes image bytes into the artwork directory under the
//!   entity id and can wipe that directory between runs
//! - `ArtworkChain` asks each `ArtworkProvider` in turn; the first one that
//!   returns a valid image wins, every failure falls through to the next
//! - Each resolution is awaited to completion, so a path is only recorded once
//!   the file is on disk
//!
//! ## Usage
//!
//! ```ignore
//! use core_metadata::artwork::{ArtworkChain, ArtworkRequest, ArtworkStore};
//!
//! let chain = ArtworkChain::new(ArtworkStore::new(fs, artwork_dir))
//!     .with_provider(Arc::new(EmbeddedArtworkProvider::new(extractor)))
//!     .with_provider(Arc::new(SpotifyArtworkProvider::new(http, spotify_config)));
//!
//! let request = ArtworkRequest::album(album.id.as_str(), &track);
//! album.artwork = chain.resolve(&request).await;
//! ```

use crate::error::{MetadataError, Result};
use crate::providers::ArtworkProvider;
use bridge_traits::storage::FileSystemAccess;
use bytes::Bytes;
use core_library::models::Track;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Name of the entry in the artwork directory that clearing must keep.
pub const PRESERVED_ENTRY: &str = "sqlite";

// =============================================================================
// Requests
// =============================================================================

/// Entity kind an artwork lookup is for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtworkTarget {
    Album,
    Artist,
}

/// Everything a provider may need to find artwork for one entity.
///
/// The track is the one that introduced the entity in the current run.
#[derive(Debug, Clone)]
pub struct ArtworkRequest {
    pub target: ArtworkTarget,
    /// Id of the artist or album, used as the file name
    pub entity_id: String,
    pub track_id: String,
    pub title: String,
    pub artist: Option<String>,
    pub album: Option<String>,
    /// File path (local) or stream URL (remote)
    pub locator: String,
    pub is_remote: bool,
}

impl ArtworkRequest {
    pub fn album(album_id: &str, track: &Track) -> Self {
        Self::for_track(ArtworkTarget::Album, album_id, track)
    }

    pub fn artist(artist_id: &str, track: &Track) -> Self {
        Self::for_track(ArtworkTarget::Artist, artist_id, track)
    }

    fn for_track(target: ArtworkTarget, entity_id: &str, track: &Track) -> Self {
        Self {
            target,
            entity_id: entity_id.to_string(),
            track_id: track.id.to_string(),
            title: track.title.clone(),
            artist: track.artist.clone(),
            album: track.album.clone(),
            locator: track.url.clone(),
            is_remote: track.is_remote,
        }
    }
}

// =============================================================================
// Store
// =============================================================================

/// Artwork files on disk, one per entity id
pub struct ArtworkStore {
    file_system: Arc<dyn FileSystemAccess>,
    directory: PathBuf,
}

impl ArtworkStore {
    pub fn new(file_system: Arc<dyn FileSystemAccess>, directory: impl Into<PathBuf>) -> Self {
        Self {
            file_system,
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &PathBuf {
        &self.directory
    }

    pub fn path_for(&self, entity_id: &str) -> PathBuf {
        self.directory.join(entity_id)
    }

    /// Write `data` as the artwork of `entity_id`.
    ///
    /// # Errors
    ///
    /// `ArtworkError` if the bytes are not a recognizable image, or a bridge
    /// error if the write fails.
    pub async fn save(&self, entity_id: &str, data: Bytes) -> Result<PathBuf> {
        let format = image::guess_format(&data)
            .map_err(|e| MetadataError::ArtworkError(format!("Unrecognized image data: {}", e)))?;

        self.file_system.create_dir_all(&self.directory).await?;
        let path = self.path_for(entity_id);
        let size = data.len();
        self.file_system.write_file(&path, data).await?;

        debug!(path = %path.display(), size, format = ?format, "Saved artwork");
        Ok(path)
    }

    /// Delete every file in the artwork directory except the `sqlite` entry.
    /// Subdirectories are left in place.
    ///
    /// Returns the number of files removed. A missing directory is empty.
    pub async fn clear(&self) -> Result<usize> {
        if !self.file_system.exists(&self.directory).await? {
            return Ok(0);
        }

        let mut removed = 0;
        for entry in self.file_system.list_directory(&self.directory).await? {
            let preserved = entry
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.eq_ignore_ascii_case(PRESERVED_ENTRY));
            if preserved {
                continue;
            }

            if self.file_system.metadata(&entry).await?.is_directory {
                debug!(path = %entry.display(), "Keeping directory in artwork directory");
                continue;
            }

            self.file_system.delete_file(&entry).await?;
            removed += 1;
        }

        info!(removed, directory = %self.directory.display(), "Cleared artwork directory");
        Ok(removed)
    }
}

// =============================================================================
// Chain
// =============================================================================

/// Ordered fallback of artwork providers
pub struct ArtworkChain {
    providers: Vec<Arc<dyn ArtworkProvider>>,
    store: ArtworkStore,
}

impl ArtworkChain {
    pub fn new(store: ArtworkStore) -> Self {
        Self {
            providers: Vec::new(),
            store,
        }
    }

    /// Append a provider; providers are tried in insertion order.
    pub fn with_provider(mut self, provider: Arc<dyn ArtworkProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    pub fn store(&self) -> &ArtworkStore {
        &self.store
    }

    pub fn provider_names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Resolve artwork for one entity and return the stored file path.
    ///
    /// Returns `None` when no provider produced a usable image.
    pub async fn resolve(&self, request: &ArtworkRequest) -> Option<String> {
        for provider in &self.providers {
            if !provider.supports(request) {
                continue;
            }

            let data = match provider.fetch(request).await {
                Ok(Some(data)) => data,
                Ok(None) => {
                    debug!(provider = provider.name(), entity = %request.entity_id, "No artwork");
                    continue;
                }
                Err(e) => {
                    warn!(provider = provider.name(), entity = %request.entity_id, error = %e, "Artwork provider failed");
                    continue;
                }
            };

            match self.store.save(&request.entity_id, data).await {
                Ok(path) => {
                    debug!(provider = provider.name(), target = ?request.target, entity = %request.entity_id, "Resolved artwork");
                    return Some(path.to_string_lossy().into_owned());
                }
                Err(e) => {
                    warn!(provider = provider.name(), entity = %request.entity_id, error = %e, "Discarding artwork");
                }
            }
        }

        None
    }
}
