//! Audio Tag Extraction
//!
//! Parses embedded tags from the first bytes of an audio file using the
//! `lofty` crate. Only a bounded prefix is read: a small chunk when only text
//! tags are wanted, a larger one when embedded cover art is requested.
//!
//! ## Overview
//!
//! - Reads `tag_chunk_bytes` (or `artwork_chunk_bytes`) through `FileSystemAccess`
//! - Guesses the container from the bytes, falling back to the file extension
//! - Trims text fields; empty values become `None`
//! - Requires a title and an artist, otherwise the file is skipped
//!
//! ## Usage
//!
//! ```ignore
//! use core_metadata::extractor::MetadataExtractor;
//!
//! let extractor = MetadataExtractor::new(file_system, &SyncConfig::default());
//! if let Some(metadata) = extractor.extract(Path::new("/music/song.mp3"), false).await {
//!     println!("{} - {}", metadata.artist, metadata.title);
//! }
//! ```

use bridge_traits::storage::FileSystemAccess;
use bytes::Bytes;
use core_runtime::config::SyncConfig;
use lofty::config::{ParseOptions, ParsingMode};
use lofty::file::{AudioFile, FileType, TaggedFileExt};
use lofty::picture::{MimeType, PictureType};
use lofty::probe::Probe;
use lofty::tag::{Accessor, ItemKey, Tag};
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use crate::error::{MetadataError, Result};

/// Tags read from the head of an audio file
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedMetadata {
    pub title: String,
    pub artist: String,
    pub album: Option<String>,
    pub album_artist: Option<String>,
    pub track_no: Option<i64>,
    pub disk_no: Option<i64>,
    pub year: Option<i64>,
    /// Recording date, or the year when no date tag is present
    pub date: Option<String>,
    pub genre: Option<String>,
    /// Seconds, as far as the prefix allows the container to report it
    pub duration: f64,
    pub mime_type: String,
    /// Front cover (or first picture), present only when requested
    pub artwork: Option<EmbeddedArtwork>,
}

/// Cover art embedded in a tag
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedArtwork {
    pub data: Bytes,
    pub mime_type: String,
}

/// Bounded-read tag extractor
pub struct MetadataExtractor {
    file_system: Arc<dyn FileSystemAccess>,
    tag_chunk_bytes: usize,
    artwork_chunk_bytes: usize,
}

impl MetadataExtractor {
    pub fn new(file_system: Arc<dyn FileSystemAccess>, config: &SyncConfig) -> Self {
        Self::with_chunk_sizes(file_system, config.tag_chunk_bytes, config.artwork_chunk_bytes)
    }

    pub fn with_chunk_sizes(
        file_system: Arc<dyn FileSystemAccess>,
        tag_chunk_bytes: usize,
        artwork_chunk_bytes: usize,
    ) -> Self {
        Self {
            file_system,
            tag_chunk_bytes,
            artwork_chunk_bytes,
        }
    }

    /// Number of bytes read for one extraction
    pub fn chunk_len(&self, with_artwork: bool) -> usize {
        if with_artwork {
            self.artwork_chunk_bytes
        } else {
            self.tag_chunk_bytes
        }
    }

    /// Extract tags, returning `None` when the file should be skipped.
    ///
    /// Failures are logged at `debug` and never propagate.
    pub async fn extract(&self, path: &Path, with_artwork: bool) -> Option<ExtractedMetadata> {
        match self.try_extract(path, with_artwork).await {
            Ok(metadata) => Some(metadata),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "Skipping file");
                None
            }
        }
    }

    /// Extract tags, reporting why a file was rejected.
    ///
    /// # Errors
    ///
    /// - the prefix cannot be read
    /// - the container is unknown or the tags cannot be parsed
    /// - the title or artist tag is missing or blank
    pub async fn try_extract(&self, path: &Path, with_artwork: bool) -> Result<ExtractedMetadata> {
        let prefix = self
            .file_system
            .read_prefix(path, self.chunk_len(with_artwork))
            .await?;

        Self::parse(path, prefix, with_artwork)
    }

    fn parse(path: &Path, prefix: Bytes, with_artwork: bool) -> Result<ExtractedMetadata> {
        let options = ParseOptions::new().parsing_mode(ParsingMode::Relaxed);

        let mut probe = Probe::new(Cursor::new(prefix))
            .options(options)
            .guess_file_type()
            .map_err(|e| MetadataError::ExtractionFailed(format!("Failed to probe file: {}", e)))?;

        if probe.file_type().is_none() {
            if let Some(file_type) = path.extension().and_then(FileType::from_ext) {
                probe = probe.set_file_type(file_type);
            }
        }

        let tagged_file = probe
            .read()
            .map_err(|e| MetadataError::ExtractionFailed(format!("Failed to parse file: {}", e)))?;

        let duration = tagged_file.properties().duration().as_secs_f64();
        let tag = tagged_file
            .primary_tag()
            .or_else(|| tagged_file.first_tag())
            .ok_or(MetadataError::MissingTag("title"))?;

        let title = clean(tag.title().as_deref()).ok_or(MetadataError::MissingTag("title"))?;
        let artist = clean(tag.artist().as_deref()).ok_or(MetadataError::MissingTag("artist"))?;

        let year = tag.year().map(i64::from);
        let date = clean(tag.get_string(&ItemKey::RecordingDate))
            .or_else(|| year.map(|y| y.to_string()));

        Ok(ExtractedMetadata {
            title,
            artist,
            album: clean(tag.album().as_deref()),
            album_artist: clean(tag.get_string(&ItemKey::AlbumArtist)),
            track_no: tag.track().map(i64::from),
            disk_no: tag.disk().map(i64::from),
            year,
            date,
            genre: clean(tag.genre().as_deref()),
            duration,
            mime_type: audio_mime_type(path).to_string(),
            artwork: if with_artwork { cover_art(tag) } else { None },
        })
    }
}

/// Container MIME type by file extension; unknown extensions are treated as MPEG.
pub fn audio_mime_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("flac") => "audio/flac",
        Some("ogg") => "audio/ogg",
        Some("aac") => "audio/aac",
        Some("mp4") => "audio/mp4",
        _ => "audio/mpeg",
    }
}

/// Locator form of a file path: `#` is percent-encoded.
pub fn parse_uri(path: &str) -> String {
    path.replace('#', "%23")
}

fn clean(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn cover_art(tag: &Tag) -> Option<EmbeddedArtwork> {
    let pictures = tag.pictures();
    let picture = pictures
        .iter()
        .find(|p| p.pic_type() == PictureType::CoverFront)
        .or_else(|| pictures.first())?;

    if picture.data().is_empty() {
        return None;
    }

    Some(EmbeddedArtwork {
        data: Bytes::copy_from_slice(picture.data()),
        mime_type: picture
            .mime_type()
            .map(image_mime_type)
            .unwrap_or("image/jpeg")
            .to_string(),
    })
}

fn image_mime_type(mime_type: &MimeType) -> &'static str {
    match mime_type {
        MimeType::Png => "image/png",
        MimeType::Tiff => "image/tiff",
        MimeType::Bmp => "image/bmp",
        MimeType::Gif => "image/gif",
        _ => "image/jpeg",
    }
}
