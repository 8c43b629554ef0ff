//! In-memory repositories
//!
//! Vector-backed implementations of the repository traits for tests and for
//! hosts that run a sync without a database. Every bulk insert records one
//! [`BulkWrite`] per chunk into an optional shared [`WriteJournal`], which lets
//! callers observe write ordering and chunking across repositories.

use crate::error::{LibraryError, Result};
use crate::models::{Album, AlbumId, Artist, ArtistId, QueuedTrack, Track, TrackId};
use crate::repositories::{
    invalid, validate_chunk_size, AlbumRepository, ArtistRepository, QueueRepository,
    TrackRepository,
};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

// =============================================================================
// Write journal
// =============================================================================

/// Entity table touched by a bulk write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Artist,
    Album,
    Track,
}

/// One chunk of a bulk insert
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkWrite {
    pub entity: EntityKind,
    pub rows: usize,
}

/// Shared, append-only record of bulk writes
#[derive(Debug, Clone, Default)]
pub struct WriteJournal {
    entries: Arc<Mutex<Vec<BulkWrite>>>,
}

impl WriteJournal {
    pub fn new() -> Self {
        Self::default()
    }

    async fn record(&self, entity: EntityKind, rows: usize) {
        self.entries.lock().await.push(BulkWrite { entity, rows });
    }

    /// Every chunk written so far, in write order
    pub async fn entries(&self) -> Vec<BulkWrite> {
        self.entries.lock().await.clone()
    }

    /// Chunk sizes written for one entity kind
    pub async fn chunk_sizes(&self, entity: EntityKind) -> Vec<usize> {
        self.entries
            .lock()
            .await
            .iter()
            .filter(|w| w.entity == entity)
            .map(|w| w.rows)
            .collect()
    }
}

/// Common state of the bulk-writing in-memory repositories
#[derive(Debug)]
struct Store<T> {
    rows: Mutex<Vec<T>>,
    journal: Option<WriteJournal>,
    fail_writes: AtomicBool,
}

impl<T> Default for Store<T> {
    fn default() -> Self {
        Self {
            rows: Mutex::new(Vec::new()),
            journal: None,
            fail_writes: AtomicBool::new(false),
        }
    }
}

impl<T: Clone> Store<T> {
    fn with_journal(journal: WriteJournal) -> Self {
        Self {
            journal: Some(journal),
            ..Self::default()
        }
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(LibraryError::Database(sqlx::Error::PoolClosed));
        }
        Ok(())
    }

    async fn insert_chunks(&self, kind: EntityKind, items: &[T], chunk_size: usize) -> Result<u64> {
        validate_chunk_size(chunk_size)?;
        if items.is_empty() {
            return Ok(0);
        }
        self.check_writable()?;

        let mut rows = self.rows.lock().await;
        for chunk in items.chunks(chunk_size) {
            rows.extend_from_slice(chunk);
            if let Some(journal) = &self.journal {
                journal.record(kind, chunk.len()).await;
            }
        }
        Ok(items.len() as u64)
    }

    async fn clear(&self) -> Result<u64> {
        self.check_writable()?;
        let mut rows = self.rows.lock().await;
        let removed = rows.len() as u64;
        rows.clear();
        Ok(removed)
    }
}

macro_rules! failure_switch {
    ($repo:ty) => {
        impl $repo {
            /// Make every subsequent write fail with a database error
            pub fn fail_writes(&self, fail: bool) {
                self.store.fail_writes.store(fail, Ordering::SeqCst);
            }
        }
    };
}

// =============================================================================
// Artists
// =============================================================================

#[derive(Debug, Default)]
pub struct InMemoryArtistRepository {
    store: Store<Artist>,
}

impl InMemoryArtistRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_journal(journal: WriteJournal) -> Self {
        Self {
            store: Store::with_journal(journal),
        }
    }
}

failure_switch!(InMemoryArtistRepository);

#[async_trait]
impl ArtistRepository for InMemoryArtistRepository {
    async fn get_all(&self) -> Result<Vec<Artist>> {
        let mut artists = self.store.rows.lock().await.clone();
        artists.sort_by(|a, b| a.sort_key().cmp(b.sort_key()));
        Ok(artists)
    }

    async fn get(&self, id: &ArtistId) -> Result<Option<Artist>> {
        let rows = self.store.rows.lock().await;
        Ok(rows.iter().find(|a| &a.id == id).cloned())
    }

    async fn create_or_get(&self, name: &str) -> Result<Artist> {
        self.store.check_writable()?;
        let mut rows = self.store.rows.lock().await;
        if let Some(existing) = rows.iter().find(|a| a.name == name) {
            return Ok(existing.clone());
        }

        let artist = Artist::new(name);
        artist.validate().map_err(|e| invalid("Artist", e))?;
        rows.push(artist.clone());
        Ok(artist)
    }

    async fn update(&self, artist: &Artist) -> Result<()> {
        self.store.check_writable()?;
        let mut rows = self.store.rows.lock().await;
        match rows.iter_mut().find(|a| a.id == artist.id) {
            Some(row) => {
                *row = artist.clone();
                Ok(())
            }
            None => Err(LibraryError::NotFound {
                entity_type: "Artist".to_string(),
                id: artist.id.to_string(),
            }),
        }
    }

    async fn create_bulk(&self, artists: &[Artist], chunk_size: usize) -> Result<u64> {
        for artist in artists {
            artist.validate().map_err(|e| invalid("Artist", e))?;
        }
        self.store
            .insert_chunks(EntityKind::Artist, artists, chunk_size)
            .await
    }

    async fn delete_all(&self) -> Result<u64> {
        self.store.clear().await
    }

    async fn delete(&self, id: &ArtistId) -> Result<bool> {
        self.store.check_writable()?;
        let mut rows = self.store.rows.lock().await;
        let before = rows.len();
        rows.retain(|a| &a.id != id);
        Ok(rows.len() < before)
    }
}

// =============================================================================
// Albums
// =============================================================================

#[derive(Debug, Default)]
pub struct InMemoryAlbumRepository {
    store: Store<Album>,
}

impl InMemoryAlbumRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_journal(journal: WriteJournal) -> Self {
        Self {
            store: Store::with_journal(journal),
        }
    }
}

failure_switch!(InMemoryAlbumRepository);

#[async_trait]
impl AlbumRepository for InMemoryAlbumRepository {
    async fn get_all(&self) -> Result<Vec<Album>> {
        let mut albums = self.store.rows.lock().await.clone();
        albums.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(albums)
    }

    async fn get(&self, id: &AlbumId) -> Result<Option<Album>> {
        let rows = self.store.rows.lock().await;
        Ok(rows.iter().find(|a| &a.id == id).cloned())
    }

    async fn get_by_artist(&self, artist_id: &ArtistId) -> Result<Vec<Album>> {
        let mut albums: Vec<Album> = self
            .store
            .rows
            .lock()
            .await
            .iter()
            .filter(|a| a.artist_id.as_ref() == Some(artist_id))
            .cloned()
            .collect();
        albums.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(albums)
    }

    async fn create_or_get(&self, name: &str, artist_id: Option<&ArtistId>) -> Result<Album> {
        self.store.check_writable()?;
        let mut rows = self.store.rows.lock().await;
        if let Some(existing) = rows.iter().find(|a| a.name == name) {
            return Ok(existing.clone());
        }

        let album = Album::new(name, artist_id.cloned());
        album.validate().map_err(|e| invalid("Album", e))?;
        rows.push(album.clone());
        Ok(album)
    }

    async fn update(&self, album: &Album) -> Result<()> {
        self.store.check_writable()?;
        let mut rows = self.store.rows.lock().await;
        match rows.iter_mut().find(|a| a.id == album.id) {
            Some(row) => {
                *row = album.clone();
                Ok(())
            }
            None => Err(LibraryError::NotFound {
                entity_type: "Album".to_string(),
                id: album.id.to_string(),
            }),
        }
    }

    async fn create_bulk(&self, albums: &[Album], chunk_size: usize) -> Result<u64> {
        for album in albums {
            album.validate().map_err(|e| invalid("Album", e))?;
        }
        self.store
            .insert_chunks(EntityKind::Album, albums, chunk_size)
            .await
    }

    async fn delete_all(&self) -> Result<u64> {
        self.store.clear().await
    }

    async fn delete(&self, id: &AlbumId) -> Result<bool> {
        self.store.check_writable()?;
        let mut rows = self.store.rows.lock().await;
        let before = rows.len();
        rows.retain(|a| &a.id != id);
        Ok(rows.len() < before)
    }
}

// =============================================================================
// Tracks
// =============================================================================

#[derive(Debug, Default)]
pub struct InMemoryTrackRepository {
    store: Store<Track>,
}

impl InMemoryTrackRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_journal(journal: WriteJournal) -> Self {
        Self {
            store: Store::with_journal(journal),
        }
    }
}

failure_switch!(InMemoryTrackRepository);

#[async_trait]
impl TrackRepository for InMemoryTrackRepository {
    async fn get_all(&self) -> Result<Vec<Track>> {
        let mut tracks = self.store.rows.lock().await.clone();
        tracks.sort_by(|a, b| {
            (&a.artist, &a.album, a.disk_no, a.track_no, &a.title)
                .cmp(&(&b.artist, &b.album, b.disk_no, b.track_no, &b.title))
        });
        Ok(tracks)
    }

    async fn get(&self, id: &TrackId) -> Result<Option<Track>> {
        let rows = self.store.rows.lock().await;
        Ok(rows.iter().find(|t| &t.id == id).cloned())
    }

    async fn get_by_album(&self, album_id: &AlbumId) -> Result<Vec<Track>> {
        let rows = self.store.rows.lock().await;
        Ok(rows
            .iter()
            .filter(|t| t.album_id.as_ref() == Some(album_id))
            .cloned()
            .collect())
    }

    async fn get_by_artist(&self, artist_id: &ArtistId) -> Result<Vec<Track>> {
        let rows = self.store.rows.lock().await;
        Ok(rows
            .iter()
            .filter(|t| t.artist_id.as_ref() == Some(artist_id))
            .cloned()
            .collect())
    }

    async fn count(&self) -> Result<i64> {
        Ok(self.store.rows.lock().await.len() as i64)
    }

    async fn count_by_artist(&self, artist_id: &ArtistId) -> Result<i64> {
        let rows = self.store.rows.lock().await;
        Ok(rows
            .iter()
            .filter(|t| t.artist_id.as_ref() == Some(artist_id))
            .count() as i64)
    }

    async fn create_bulk(&self, tracks: &[Track], chunk_size: usize) -> Result<u64> {
        for track in tracks {
            track
                .validate()
                .map_err(|e| invalid("Track", format!("{}: {}", track.url, e)))?;
        }
        self.store
            .insert_chunks(EntityKind::Track, tracks, chunk_size)
            .await
    }

    async fn delete_all(&self) -> Result<u64> {
        self.store.clear().await
    }

    async fn delete(&self, id: &TrackId) -> Result<bool> {
        self.store.check_writable()?;
        let mut rows = self.store.rows.lock().await;
        let before = rows.len();
        rows.retain(|t| &t.id != id);
        Ok(rows.len() < before)
    }
}

// =============================================================================
// Queue
// =============================================================================

#[derive(Debug, Default)]
pub struct InMemoryQueueRepository {
    entries: Mutex<Vec<QueuedTrack>>,
}

impl InMemoryQueueRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl QueueRepository for InMemoryQueueRepository {
    async fn get_all(&self) -> Result<Vec<QueuedTrack>> {
        let mut entries = self.entries.lock().await.clone();
        entries.sort_by_key(|e| e.position);
        Ok(entries)
    }

    async fn insert(&self, entry: &QueuedTrack) -> Result<()> {
        self.entries.lock().await.push(entry.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<u64> {
        let mut entries = self.entries.lock().await;
        let removed = entries.len() as u64;
        entries.clear();
        Ok(removed)
    }
}
