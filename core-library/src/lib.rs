//! # Library Management Module
//!
//! Owns the music library database and the repositories the sync pipeline
//! writes through.
//!
//! ## Overview
//!
//! This module manages:
//! - SQLite schema and migrations for artists, albums, tracks and the queue
//! - Repository traits with SQLite and in-memory implementations
//! - Chunked bulk inserts used by the sync writer
//!
//! ## Usage
//!
//! ```rust,ignore
//! use core_library::db::{create_pool, DatabaseConfig};
//! use core_library::repositories::{SqliteTrackRepository, TrackRepository};
//!
//! let pool = create_pool(DatabaseConfig::new("library.db")).await?;
//! let tracks = SqliteTrackRepository::new(pool);
//! let all = tracks.get_all().await?;
//! ```

pub mod db;
pub mod error;
pub mod models;
pub mod repositories;

pub use error::{LibraryError, Result};
pub use models::{Album, AlbumId, Artist, ArtistId, QueuedTrack, Track, TrackId};
pub use sqlx::SqlitePool;
