//! Shared fixtures for the metadata integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use bytes::Bytes;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use lofty::config::WriteOptions;
use lofty::file::{AudioFile, TaggedFileExt};
use lofty::picture::{MimeType, Picture, PictureType};
use lofty::tag::{Accessor, ItemKey, Tag, TagType};
use std::io::Cursor;
use std::path::Path;
use std::sync::Mutex;

/// Tags written into a fixture file
#[derive(Default)]
pub struct FixtureTags<'a> {
    pub title: Option<&'a str>,
    pub artist: Option<&'a str>,
    pub album: Option<&'a str>,
    pub album_artist: Option<&'a str>,
    pub year: Option<u32>,
    pub track: Option<u32>,
    pub genre: Option<&'a str>,
    pub cover: Option<Vec<u8>>,
}

/// One second of 8 kHz mono silence as a PCM WAV file
pub fn silent_wav() -> Vec<u8> {
    let data_len: u32 = 16_000;
    let mut wav = Vec::with_capacity(44 + data_len as usize);
    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&(36 + data_len).to_le_bytes());
    wav.extend_from_slice(b"WAVE");
    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&16u32.to_le_bytes());
    wav.extend_from_slice(&1u16.to_le_bytes()); // PCM
    wav.extend_from_slice(&1u16.to_le_bytes()); // mono
    wav.extend_from_slice(&8000u32.to_le_bytes());
    wav.extend_from_slice(&16_000u32.to_le_bytes());
    wav.extend_from_slice(&2u16.to_le_bytes());
    wav.extend_from_slice(&16u16.to_le_bytes());
    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&data_len.to_le_bytes());
    wav.resize(44 + data_len as usize, 0);
    wav
}

/// Write a WAV file at `path` carrying an ID3v2 tag with `tags`
pub fn write_tagged_wav(path: &Path, tags: FixtureTags<'_>) {
    std::fs::write(path, silent_wav()).unwrap();

    let mut tag = Tag::new(TagType::Id3v2);
    if let Some(title) = tags.title {
        tag.set_title(title.to_string());
    }
    if let Some(artist) = tags.artist {
        tag.set_artist(artist.to_string());
    }
    if let Some(album) = tags.album {
        tag.set_album(album.to_string());
    }
    if let Some(album_artist) = tags.album_artist {
        tag.insert_text(ItemKey::AlbumArtist, album_artist.to_string());
    }
    if let Some(year) = tags.year {
        tag.set_year(year);
    }
    if let Some(track) = tags.track {
        tag.set_track(track);
    }
    if let Some(genre) = tags.genre {
        tag.set_genre(genre.to_string());
    }
    if let Some(cover) = tags.cover {
        tag.push_picture(Picture::new_unchecked(
            PictureType::CoverFront,
            Some(MimeType::Png),
            None,
            cover,
        ));
    }

    let mut tagged = lofty::read_from_path(path).unwrap();
    tagged.insert_tag(tag);
    tagged.save_to_path(path, WriteOptions::default()).unwrap();
}

/// A small red PNG
pub fn png_bytes() -> Vec<u8> {
    let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 4, Rgb([200, 10, 10])));
    let mut buffer = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .unwrap();
    buffer
}

/// HTTP client answering from a route table and recording every request
pub struct FakeHttpClient {
    routes: Vec<(String, HttpResponse)>,
    requests: Mutex<Vec<(HttpMethod, String)>>,
}

impl FakeHttpClient {
    pub fn new() -> Self {
        Self {
            routes: Vec::new(),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Answer any URL containing `pattern`; earlier routes win.
    pub fn route(mut self, pattern: &str, status: u16, body: impl Into<Bytes>) -> Self {
        self.routes
            .push((pattern.to_string(), HttpResponse::new(status, body)));
        self
    }

    pub fn requests(&self) -> Vec<(HttpMethod, String)> {
        self.requests.lock().unwrap().clone()
    }

    pub fn count_matching(&self, pattern: &str) -> usize {
        self.requests()
            .iter()
            .filter(|(_, url)| url.contains(pattern))
            .count()
    }
}

#[async_trait]
impl HttpClient for FakeHttpClient {
    async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse> {
        self.requests
            .lock()
            .unwrap()
            .push((request.method, request.url.clone()));

        Ok(self
            .routes
            .iter()
            .find(|(pattern, _)| request.url.contains(pattern.as_str()))
            .map(|(_, response)| response.clone())
            .unwrap_or_else(|| HttpResponse::new(404, Bytes::new())))
    }
}
