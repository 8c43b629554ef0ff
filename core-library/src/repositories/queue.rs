//! Queue repository trait and implementation

use crate::error::Result;
use crate::models::QueuedTrack;
use async_trait::async_trait;
use sqlx::{query, query_as, SqlitePool};

/// Persisted play queue
#[async_trait]
pub trait QueueRepository: Send + Sync {
    /// Queue entries in play order
    async fn get_all(&self) -> Result<Vec<QueuedTrack>>;

    async fn insert(&self, entry: &QueuedTrack) -> Result<()>;

    /// Remove every entry, returning how many were removed
    async fn clear(&self) -> Result<u64>;
}

pub struct SqliteQueueRepository {
    pool: SqlitePool,
}

impl SqliteQueueRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl QueueRepository for SqliteQueueRepository {
    async fn get_all(&self) -> Result<Vec<QueuedTrack>> {
        let entries = query_as::<_, QueuedTrack>("SELECT * FROM queue ORDER BY position")
            .fetch_all(&self.pool)
            .await?;

        Ok(entries)
    }

    async fn insert(&self, entry: &QueuedTrack) -> Result<()> {
        query(
            r#"
            INSERT INTO queue (id, position, url, title, artist, duration, album, genre, date, artwork, track_id)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&entry.id)
        .bind(entry.position)
        .bind(&entry.url)
        .bind(&entry.title)
        .bind(&entry.artist)
        .bind(entry.duration)
        .bind(&entry.album)
        .bind(&entry.genre)
        .bind(&entry.date)
        .bind(&entry.artwork)
        .bind(&entry.track_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn clear(&self) -> Result<u64> {
        let result = query("DELETE FROM queue").execute(&self.pool).await?;
        Ok(result.rows_affected())
    }
}
