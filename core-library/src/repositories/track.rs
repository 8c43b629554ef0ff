//! Track repository trait and implementation

use crate::error::Result;
use crate::models::{AlbumId, ArtistId, Track, TrackId};
use crate::repositories::{invalid, validate_chunk_size};
use async_trait::async_trait;
use sqlx::{query, query_as, query_scalar, QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

const TRACK_COLUMNS: &str = "INSERT INTO tracks (id, library_id, track_no, disk_no, year, title, \
     album_artist, date, genre, duration, creation_time, modification_time, filename, url, \
     artist, album, artwork, is_remote, artist_id, album_id) ";

/// Track repository interface for data access operations
#[async_trait]
pub trait TrackRepository: Send + Sync {
    /// All tracks ordered by artist, album and track number
    async fn get_all(&self) -> Result<Vec<Track>>;

    async fn get(&self, id: &TrackId) -> Result<Option<Track>>;

    async fn get_by_album(&self, album_id: &AlbumId) -> Result<Vec<Track>>;

    async fn get_by_artist(&self, artist_id: &ArtistId) -> Result<Vec<Track>>;

    async fn count(&self) -> Result<i64>;

    async fn count_by_artist(&self, artist_id: &ArtistId) -> Result<i64>;

    /// Insert `tracks` in chunks of `chunk_size` rows
    async fn create_bulk(&self, tracks: &[Track], chunk_size: usize) -> Result<u64>;

    async fn delete_all(&self) -> Result<u64>;

    async fn delete(&self, id: &TrackId) -> Result<bool>;
}

pub struct SqliteTrackRepository {
    pool: SqlitePool,
}

impl SqliteTrackRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TrackRepository for SqliteTrackRepository {
    async fn get_all(&self) -> Result<Vec<Track>> {
        let tracks = query_as::<_, Track>(
            "SELECT * FROM tracks ORDER BY artist, album, disk_no, track_no, title",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(tracks)
    }

    async fn get(&self, id: &TrackId) -> Result<Option<Track>> {
        let track = query_as::<_, Track>("SELECT * FROM tracks WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(track)
    }

    async fn get_by_album(&self, album_id: &AlbumId) -> Result<Vec<Track>> {
        let tracks = query_as::<_, Track>(
            "SELECT * FROM tracks WHERE album_id = ? ORDER BY disk_no, track_no, title",
        )
        .bind(album_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(tracks)
    }

    async fn get_by_artist(&self, artist_id: &ArtistId) -> Result<Vec<Track>> {
        let tracks = query_as::<_, Track>(
            "SELECT * FROM tracks WHERE artist_id = ? ORDER BY album, disk_no, track_no",
        )
        .bind(artist_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(tracks)
    }

    async fn count(&self) -> Result<i64> {
        let count: i64 = query_scalar("SELECT COUNT(*) FROM tracks")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn count_by_artist(&self, artist_id: &ArtistId) -> Result<i64> {
        let count: i64 = query_scalar("SELECT COUNT(*) FROM tracks WHERE artist_id = ?")
            .bind(artist_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn create_bulk(&self, tracks: &[Track], chunk_size: usize) -> Result<u64> {
        validate_chunk_size(chunk_size)?;
        if tracks.is_empty() {
            return Ok(0);
        }
        for track in tracks {
            track
                .validate()
                .map_err(|e| invalid("Track", format!("{}: {}", track.url, e)))?;
        }

        let mut tx = self.pool.begin().await?;
        let mut written = 0;

        for chunk in tracks.chunks(chunk_size) {
            let mut builder = QueryBuilder::<Sqlite>::new(TRACK_COLUMNS);
            builder.push_values(chunk, |mut row, track| {
                row.push_bind(&track.id)
                    .push_bind(&track.library_id)
                    .push_bind(track.track_no)
                    .push_bind(track.disk_no)
                    .push_bind(track.year)
                    .push_bind(&track.title)
                    .push_bind(&track.album_artist)
                    .push_bind(&track.date)
                    .push_bind(&track.genre)
                    .push_bind(track.duration)
                    .push_bind(track.creation_time)
                    .push_bind(track.modification_time)
                    .push_bind(&track.filename)
                    .push_bind(&track.url)
                    .push_bind(&track.artist)
                    .push_bind(&track.album)
                    .push_bind(&track.artwork)
                    .push_bind(track.is_remote)
                    .push_bind(&track.artist_id)
                    .push_bind(&track.album_id);
            });
            written += builder.build().execute(&mut *tx).await?.rows_affected();
        }

        tx.commit().await?;
        debug!(count = written, chunk_size, "Inserted tracks");
        Ok(written)
    }

    async fn delete_all(&self) -> Result<u64> {
        let result = query("DELETE FROM tracks").execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn delete(&self, id: &TrackId) -> Result<bool> {
        let result = query("DELETE FROM tracks WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            debug!(track_id = %id, "Track not found for delete");
        }
        Ok(result.rows_affected() > 0)
    }
}
