//! # Bulk Persistence Writer
//!
//! Writes a built [`LibraryGraph`] through the repository traits in bounded
//! chunks, always artists first, then albums, then tracks, so every foreign key
//! refers to a row that is already stored.

use crate::builder::LibraryGraph;
use crate::Result;
use core_library::repositories::{
    AlbumRepository, ArtistRepository, QueueRepository, TrackRepository,
};
use core_runtime::config::SyncConfig;
use std::sync::Arc;
use tracing::{debug, info};

/// Repository set a sync run reads and writes
#[derive(Clone)]
pub struct LibraryRepositories {
    pub artists: Arc<dyn ArtistRepository>,
    pub albums: Arc<dyn AlbumRepository>,
    pub tracks: Arc<dyn TrackRepository>,
    pub queue: Arc<dyn QueueRepository>,
}

impl LibraryRepositories {
    /// Delete tracks, albums and artists, in that order.
    ///
    /// The play queue is left alone; see [`LibraryRepositories::clear_queue`].
    pub async fn clear_entities(&self) -> Result<ClearSummary> {
        let tracks = self.tracks.delete_all().await?;
        let albums = self.albums.delete_all().await?;
        let artists = self.artists.delete_all().await?;

        let summary = ClearSummary {
            artists,
            albums,
            tracks,
        };
        debug!(?summary, "Deleted library entities");
        Ok(summary)
    }

    pub async fn clear_queue(&self) -> Result<()> {
        self.queue.clear().await?;
        Ok(())
    }
}

/// Rows removed by a clear
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClearSummary {
    pub artists: u64,
    pub albums: u64,
    pub tracks: u64,
}

/// Rows written by one [`BulkWriter::write`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteSummary {
    pub artists: u64,
    pub albums: u64,
    pub tracks: u64,
}

/// Chunked writer for a whole run
pub struct BulkWriter {
    repositories: LibraryRepositories,
    artist_chunk_size: usize,
    album_chunk_size: usize,
    track_chunk_size: usize,
}

impl BulkWriter {
    pub fn new(repositories: LibraryRepositories, config: &SyncConfig) -> Self {
        Self::with_chunk_sizes(
            repositories,
            config.artist_chunk_size,
            config.album_chunk_size,
            config.track_chunk_size,
        )
    }

    pub fn with_chunk_sizes(
        repositories: LibraryRepositories,
        artist_chunk_size: usize,
        album_chunk_size: usize,
        track_chunk_size: usize,
    ) -> Self {
        Self {
            repositories,
            artist_chunk_size,
            album_chunk_size,
            track_chunk_size,
        }
    }

    pub fn repositories(&self) -> &LibraryRepositories {
        &self.repositories
    }

    /// Persist `graph`. Each entity kind completes before the next begins.
    ///
    /// # Errors
    ///
    /// The first repository error stops the write; rows of earlier kinds stay
    /// committed.
    pub async fn write(&self, graph: &LibraryGraph) -> Result<WriteSummary> {
        let artists = self
            .repositories
            .artists
            .create_bulk(&graph.artists, self.artist_chunk_size)
            .await?;
        let albums = self
            .repositories
            .albums
            .create_bulk(&graph.albums, self.album_chunk_size)
            .await?;
        let tracks = self
            .repositories
            .tracks
            .create_bulk(&graph.tracks, self.track_chunk_size)
            .await?;

        info!(artists, albums, tracks, "Library written");
        Ok(WriteSummary {
            artists,
            albums,
            tracks,
        })
    }
}
