//! # Metadata & Artwork Module
//!
//! Extracts tags from audio files and resolves artwork for artists and albums.
//!
//! ## Overview
//!
//! This module handles:
//! - Tag extraction from a bounded file prefix (ID3, Vorbis, MP4, FLAC, RIFF)
//! - Embedded cover art extraction
//! - Artwork storage in the private artwork directory
//! - The artwork provider chain: embedded art, the remote catalog, Spotify

pub mod artwork;
pub mod error;
pub mod extractor;
pub mod providers;

pub use artwork::{ArtworkChain, ArtworkRequest, ArtworkStore, ArtworkTarget};
pub use error::{MetadataError, Result};
pub use extractor::{audio_mime_type, parse_uri, EmbeddedArtwork, ExtractedMetadata, MetadataExtractor};
pub use providers::{
    ArtworkProvider, CatalogArtworkProvider, EmbeddedArtworkProvider, SpotifyArtworkProvider,
};
