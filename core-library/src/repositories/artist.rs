//! Artist repository trait and implementation

use crate::error::{LibraryError, Result};
use crate::models::{Artist, ArtistId};
use crate::repositories::{invalid, validate_chunk_size};
use async_trait::async_trait;
use sqlx::{query, query_as, QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

/// Artist repository interface for data access operations
#[async_trait]
pub trait ArtistRepository: Send + Sync {
    /// All artists, ordered by name ignoring a leading "The " or "A "
    async fn get_all(&self) -> Result<Vec<Artist>>;

    async fn get(&self, id: &ArtistId) -> Result<Option<Artist>>;

    /// Return the artist with exactly this name, inserting it if missing
    async fn create_or_get(&self, name: &str) -> Result<Artist>;

    /// # Errors
    /// Returns `NotFound` if the artist does not exist
    async fn update(&self, artist: &Artist) -> Result<()>;

    /// Insert `artists` in chunks of `chunk_size` rows.
    ///
    /// Returns the number of rows written. An empty slice is a no-op.
    async fn create_bulk(&self, artists: &[Artist], chunk_size: usize) -> Result<u64>;

    async fn delete_all(&self) -> Result<u64>;

    /// Returns `true` if a row was deleted
    async fn delete(&self, id: &ArtistId) -> Result<bool>;
}

/// SQLite implementation of ArtistRepository
pub struct SqliteArtistRepository {
    pool: SqlitePool,
}

impl SqliteArtistRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ArtistRepository for SqliteArtistRepository {
    async fn get_all(&self) -> Result<Vec<Artist>> {
        let mut artists = query_as::<_, Artist>("SELECT * FROM artists")
            .fetch_all(&self.pool)
            .await?;

        artists.sort_by(|a, b| a.sort_key().cmp(b.sort_key()));
        Ok(artists)
    }

    async fn get(&self, id: &ArtistId) -> Result<Option<Artist>> {
        let artist = query_as::<_, Artist>("SELECT * FROM artists WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(artist)
    }

    async fn create_or_get(&self, name: &str) -> Result<Artist> {
        let existing = query_as::<_, Artist>("SELECT * FROM artists WHERE name = ? LIMIT 1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        if let Some(artist) = existing {
            return Ok(artist);
        }

        let artist = Artist::new(name);
        artist.validate().map_err(|e| invalid("Artist", e))?;

        query("INSERT INTO artists (id, name, artwork, no_artwork) VALUES (?, ?, ?, ?)")
            .bind(&artist.id)
            .bind(&artist.name)
            .bind(&artist.artwork)
            .bind(artist.no_artwork)
            .execute(&self.pool)
            .await?;

        Ok(artist)
    }

    async fn update(&self, artist: &Artist) -> Result<()> {
        artist.validate().map_err(|e| invalid("Artist", e))?;

        let result = query("UPDATE artists SET name = ?, artwork = ?, no_artwork = ? WHERE id = ?")
            .bind(&artist.name)
            .bind(&artist.artwork)
            .bind(artist.no_artwork)
            .bind(&artist.id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(LibraryError::NotFound {
                entity_type: "Artist".to_string(),
                id: artist.id.to_string(),
            });
        }

        Ok(())
    }

    async fn create_bulk(&self, artists: &[Artist], chunk_size: usize) -> Result<u64> {
        validate_chunk_size(chunk_size)?;
        if artists.is_empty() {
            return Ok(0);
        }
        for artist in artists {
            artist.validate().map_err(|e| invalid("Artist", e))?;
        }

        let mut tx = self.pool.begin().await?;
        let mut written = 0;

        for chunk in artists.chunks(chunk_size) {
            let mut builder =
                QueryBuilder::<Sqlite>::new("INSERT INTO artists (id, name, artwork, no_artwork) ");
            builder.push_values(chunk, |mut row, artist| {
                row.push_bind(&artist.id)
                    .push_bind(&artist.name)
                    .push_bind(&artist.artwork)
                    .push_bind(artist.no_artwork);
            });
            written += builder.build().execute(&mut *tx).await?.rows_affected();
        }

        tx.commit().await?;
        debug!(count = written, chunk_size, "Inserted artists");
        Ok(written)
    }

    async fn delete_all(&self) -> Result<u64> {
        let result = query("DELETE FROM artists").execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn delete(&self, id: &ArtistId) -> Result<bool> {
        let result = query("DELETE FROM artists WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
