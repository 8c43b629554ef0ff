//! # Repository Pattern Implementation
//!
//! Repository traits and implementations for the library entities.
//!
//! ## Architecture
//!
//! - Traits define the capability set the sync pipeline and views depend on
//! - SQLite implementations use sqlx; bulk inserts are chunked multi-row
//!   `INSERT`s committed in one transaction
//! - In-memory implementations back tests and hosts without a database
//!
//! ## Available Repositories
//!
//! - `ArtistRepository` - Artists, listed ignoring a leading article
//! - `AlbumRepository` - Albums with their first-seen artist
//! - `TrackRepository` - Local and remote tracks
//! - `QueueRepository` - The persisted play queue

pub mod album;
pub mod artist;
pub mod memory;
pub mod queue;
pub mod track;

pub use album::{AlbumRepository, SqliteAlbumRepository};
pub use artist::{ArtistRepository, SqliteArtistRepository};
pub use memory::{
    BulkWrite, EntityKind, InMemoryAlbumRepository, InMemoryArtistRepository, InMemoryQueueRepository,
    InMemoryTrackRepository, WriteJournal,
};
pub use queue::{QueueRepository, SqliteQueueRepository};
pub use track::{SqliteTrackRepository, TrackRepository};

use crate::error::{LibraryError, Result};

/// Largest accepted bulk-insert chunk.
pub const MAX_CHUNK_SIZE: usize = 1000;

pub(crate) fn validate_chunk_size(chunk_size: usize) -> Result<()> {
    if chunk_size == 0 || chunk_size > MAX_CHUNK_SIZE {
        return Err(LibraryError::InvalidInput {
            field: "chunk_size".to_string(),
            message: format!("must be between 1 and {}, got {}", MAX_CHUNK_SIZE, chunk_size),
        });
    }
    Ok(())
}

pub(crate) fn invalid(entity: &str, message: String) -> LibraryError {
    LibraryError::InvalidInput {
        field: entity.to_string(),
        message,
    }
}
