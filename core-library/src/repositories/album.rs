//! Album repository trait and implementation

use crate::error::{LibraryError, Result};
use crate::models::{Album, AlbumId, ArtistId};
use crate::repositories::{invalid, validate_chunk_size};
use async_trait::async_trait;
use sqlx::{query, query_as, QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

/// Album repository interface for data access operations
#[async_trait]
pub trait AlbumRepository: Send + Sync {
    /// All albums ordered by name
    async fn get_all(&self) -> Result<Vec<Album>>;

    async fn get(&self, id: &AlbumId) -> Result<Option<Album>>;

    async fn get_by_artist(&self, artist_id: &ArtistId) -> Result<Vec<Album>>;

    /// Return the album with exactly this name, inserting it with `artist_id`
    /// if missing. An existing album keeps its artist.
    async fn create_or_get(&self, name: &str, artist_id: Option<&ArtistId>) -> Result<Album>;

    async fn update(&self, album: &Album) -> Result<()>;

    /// Insert `albums` in chunks of `chunk_size` rows
    async fn create_bulk(&self, albums: &[Album], chunk_size: usize) -> Result<u64>;

    async fn delete_all(&self) -> Result<u64>;

    async fn delete(&self, id: &AlbumId) -> Result<bool>;
}

pub struct SqliteAlbumRepository {
    pool: SqlitePool,
}

impl SqliteAlbumRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AlbumRepository for SqliteAlbumRepository {
    async fn get_all(&self) -> Result<Vec<Album>> {
        let albums = query_as::<_, Album>("SELECT * FROM albums ORDER BY name")
            .fetch_all(&self.pool)
            .await?;

        Ok(albums)
    }

    async fn get(&self, id: &AlbumId) -> Result<Option<Album>> {
        let album = query_as::<_, Album>("SELECT * FROM albums WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(album)
    }

    async fn get_by_artist(&self, artist_id: &ArtistId) -> Result<Vec<Album>> {
        let albums = query_as::<_, Album>("SELECT * FROM albums WHERE artist_id = ? ORDER BY name")
            .bind(artist_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(albums)
    }

    async fn create_or_get(&self, name: &str, artist_id: Option<&ArtistId>) -> Result<Album> {
        let existing = query_as::<_, Album>("SELECT * FROM albums WHERE name = ? LIMIT 1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        if let Some(album) = existing {
            return Ok(album);
        }

        let album = Album::new(name, artist_id.cloned());
        album.validate().map_err(|e| invalid("Album", e))?;

        query("INSERT INTO albums (id, name, artwork, no_artwork, artist_id) VALUES (?, ?, ?, ?, ?)")
            .bind(&album.id)
            .bind(&album.name)
            .bind(&album.artwork)
            .bind(album.no_artwork)
            .bind(&album.artist_id)
            .execute(&self.pool)
            .await?;

        Ok(album)
    }

    async fn update(&self, album: &Album) -> Result<()> {
        album.validate().map_err(|e| invalid("Album", e))?;

        let result = query(
            "UPDATE albums SET name = ?, artwork = ?, no_artwork = ?, artist_id = ? WHERE id = ?",
        )
        .bind(&album.name)
        .bind(&album.artwork)
        .bind(album.no_artwork)
        .bind(&album.artist_id)
        .bind(&album.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(LibraryError::NotFound {
                entity_type: "Album".to_string(),
                id: album.id.to_string(),
            });
        }

        Ok(())
    }

    async fn create_bulk(&self, albums: &[Album], chunk_size: usize) -> Result<u64> {
        validate_chunk_size(chunk_size)?;
        if albums.is_empty() {
            return Ok(0);
        }
        for album in albums {
            album.validate().map_err(|e| invalid("Album", e))?;
        }

        let mut tx = self.pool.begin().await?;
        let mut written = 0;

        for chunk in albums.chunks(chunk_size) {
            let mut builder = QueryBuilder::<Sqlite>::new(
                "INSERT INTO albums (id, name, artwork, no_artwork, artist_id) ",
            );
            builder.push_values(chunk, |mut row, album| {
                row.push_bind(&album.id)
                    .push_bind(&album.name)
                    .push_bind(&album.artwork)
                    .push_bind(album.no_artwork)
                    .push_bind(&album.artist_id);
            });
            written += builder.build().execute(&mut *tx).await?.rows_affected();
        }

        tx.commit().await?;
        debug!(count = written, chunk_size, "Inserted albums");
        Ok(written)
    }

    async fn delete_all(&self) -> Result<u64> {
        let result = query("DELETE FROM albums").execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn delete(&self, id: &AlbumId) -> Result<bool> {
        let result = query("DELETE FROM albums WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
