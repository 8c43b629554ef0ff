//! Shared fixtures for the sync integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use bridge_desktop::TokioFileSystem;
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
use bridge_traits::media::{MediaIndex, MediaPage, PermissionStatus};
use bridge_traits::time::SystemClock;
use bytes::Bytes;
use core_library::repositories::{
    InMemoryAlbumRepository, InMemoryArtistRepository, InMemoryQueueRepository,
    InMemoryTrackRepository, WriteJournal,
};
use core_metadata::artwork::{ArtworkChain, ArtworkRequest, ArtworkStore, ArtworkTarget};
use core_metadata::extractor::MetadataExtractor;
use core_metadata::providers::ArtworkProvider;
use core_runtime::config::SyncConfig;
use core_runtime::events::{CoreEvent, EventBus};
use core_sync::{LibraryRepositories, SyncController};
use lofty::config::WriteOptions;
use lofty::file::{AudioFile, TaggedFileExt};
use lofty::tag::{Accessor, Tag, TagType};
use mockall::mock;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;

mock! {
    pub MediaIndex {}

    #[async_trait]
    impl MediaIndex for MediaIndex {
        async fn request_permission(&self) -> BridgeResult<PermissionStatus>;
        async fn audio_assets(&self, first: usize, after: Option<String>) -> BridgeResult<MediaPage>;
    }
}

// =============================================================================
// Audio fixtures
// =============================================================================

/// One second of 8 kHz mono silence as a PCM WAV file
pub fn silent_wav() -> Vec<u8> {
    let data_len: u32 = 16_000;
    let mut wav = Vec::with_capacity(44 + data_len as usize);
    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&(36 + data_len).to_le_bytes());
    wav.extend_from_slice(b"WAVEfmt ");
    wav.extend_from_slice(&16u32.to_le_bytes());
    wav.extend_from_slice(&1u16.to_le_bytes());
    wav.extend_from_slice(&1u16.to_le_bytes());
    wav.extend_from_slice(&8000u32.to_le_bytes());
    wav.extend_from_slice(&16_000u32.to_le_bytes());
    wav.extend_from_slice(&2u16.to_le_bytes());
    wav.extend_from_slice(&16u16.to_le_bytes());
    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&data_len.to_le_bytes());
    wav.resize(44 + data_len as usize, 0);
    wav
}

/// Write a tagged WAV file and return its path
pub fn tagged_wav(dir: &Path, name: &str, title: &str, artist: &str, album: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, silent_wav()).unwrap();

    let mut tag = Tag::new(TagType::Id3v2);
    tag.set_title(title.to_string());
    tag.set_artist(artist.to_string());
    tag.set_album(album.to_string());

    let mut tagged = lofty::read_from_path(&path).unwrap();
    tagged.insert_tag(tag);
    tagged.save_to_path(&path, WriteOptions::default()).unwrap();
    path
}

/// A file with an audio extension that no parser accepts
pub fn garbage_file(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, b"this is not an audio file at all").unwrap();
    path
}

// =============================================================================
// Remote catalog
// =============================================================================

/// In-process catalog service answering the health, count and page endpoints
pub struct FakeCatalog {
    total: usize,
    healthy: bool,
    fail_pages_from: Option<u64>,
    requests: Mutex<Vec<String>>,
}

impl FakeCatalog {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            healthy: true,
            fail_pages_from: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn unreachable() -> Self {
        Self {
            healthy: false,
            ..Self::new(10)
        }
    }

    /// Answer HTTP 500 for pages starting at `offset` or later
    pub fn failing_pages_from(mut self, offset: u64) -> Self {
        self.fail_pages_from = Some(offset);
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    /// `(offset, take)` of every page request, count requests excluded
    pub fn page_requests(&self) -> Vec<(u64, i64)> {
        self.requests()
            .iter()
            .filter_map(|url| Self::paging(url))
            .filter(|(_, take)| *take >= 0)
            .collect()
    }

    fn paging(url: &str) -> Option<(u64, i64)> {
        let query = url.split_once("tracks?")?.1;
        let mut offset = None;
        let mut take = None;
        for pair in query.split('&') {
            match pair.split_once('=')? {
                ("offset", value) => offset = value.parse().ok(),
                ("take", value) => take = value.parse().ok(),
                _ => {}
            }
        }
        Some((offset?, take?))
    }

    fn track_json(index: usize) -> serde_json::Value {
        serde_json::json!({
            "id": index,
            "title": format!("Track {}", index),
            "artist": format!("Artist {}", index % 3),
            "album": format!("Album {}", index % 5),
            "trackNo": index % 12 + 1,
            "duration": 180.0,
        })
    }

    fn envelope(&self, data: Vec<serde_json::Value>) -> HttpResponse {
        let body = serde_json::json!({
            "_status": "ok",
            "_meta": { "stats": { "count": self.total, "limit": -1, "offset": 0 } },
            "data": data,
        });
        HttpResponse::new(200, serde_json::to_vec(&body).unwrap())
    }
}

#[async_trait]
impl HttpClient for FakeCatalog {
    async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse> {
        self.requests.lock().unwrap().push(request.url.clone());

        if request.url.ends_with("/health") {
            return if self.healthy {
                Ok(HttpResponse::new(200, Bytes::from_static(b"ok")))
            } else {
                Err(BridgeError::Timeout(20))
            };
        }

        if let Some((offset, take)) = Self::paging(&request.url) {
            if take < 0 {
                return Ok(self.envelope(Vec::new()));
            }
            if self.fail_pages_from.is_some_and(|from| offset >= from) {
                return Ok(HttpResponse::new(500, Bytes::new()));
            }
            let start = (offset as usize).min(self.total);
            let end = (start + take as usize).min(self.total);
            return Ok(self.envelope((start..end).map(Self::track_json).collect()));
        }

        Ok(HttpResponse::new(404, Bytes::new()))
    }
}

// =============================================================================
// Artwork
// =============================================================================

/// Provider that counts lookups and always returns a PNG signature
#[derive(Default)]
pub struct CountingArtwork {
    pub albums: AtomicUsize,
    pub artists: AtomicUsize,
}

#[async_trait]
impl ArtworkProvider for CountingArtwork {
    fn name(&self) -> &'static str {
        "counting"
    }

    fn supports(&self, _request: &ArtworkRequest) -> bool {
        true
    }

    async fn fetch(&self, request: &ArtworkRequest) -> core_metadata::Result<Option<Bytes>> {
        match request.target {
            ArtworkTarget::Album => self.albums.fetch_add(1, Ordering::SeqCst),
            ArtworkTarget::Artist => self.artists.fetch_add(1, Ordering::SeqCst),
        };
        Ok(Some(Bytes::from_static(b"\x89PNG\r\n\x1a\n")))
    }
}

// =============================================================================
// Controller harness
// =============================================================================

pub struct Harness {
    pub controller: SyncController,
    pub journal: WriteJournal,
    pub repositories: LibraryRepositories,
    pub artwork_dir: PathBuf,
}

pub struct HarnessBuilder {
    artwork_dir: PathBuf,
    config: SyncConfig,
    providers: Vec<Arc<dyn ArtworkProvider>>,
    repositories: Option<LibraryRepositories>,
}

impl HarnessBuilder {
    pub fn new(dir: &Path) -> Self {
        Self {
            artwork_dir: dir.join("artwork"),
            config: SyncConfig::default(),
            providers: Vec::new(),
            repositories: None,
        }
    }

    pub fn config(mut self, config: SyncConfig) -> Self {
        self.config = config;
        self
    }

    pub fn artwork_provider(mut self, provider: Arc<dyn ArtworkProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    /// Use these repositories instead of journaled in-memory ones
    pub fn repositories(mut self, repositories: LibraryRepositories) -> Self {
        self.repositories = Some(repositories);
        self
    }

    pub fn build(self) -> Harness {
        let journal = WriteJournal::new();
        let repositories = self
            .repositories
            .unwrap_or_else(|| in_memory_repositories(&journal));

        let fs = Arc::new(TokioFileSystem::new());
        let mut chain = ArtworkChain::new(ArtworkStore::new(fs.clone(), self.artwork_dir.clone()));
        for provider in self.providers {
            chain = chain.with_provider(provider);
        }
        let extractor = MetadataExtractor::new(fs, &self.config);

        let controller = SyncController::new(
            repositories.clone(),
            Arc::new(chain),
            Arc::new(extractor),
            EventBus::new(10_000),
            Arc::new(SystemClock),
            &self.config,
        );

        Harness {
            controller,
            journal,
            repositories,
            artwork_dir: self.artwork_dir,
        }
    }
}

/// In-memory repositories recording their bulk writes into `journal`
pub fn in_memory_repositories(journal: &WriteJournal) -> LibraryRepositories {
    LibraryRepositories {
        artists: Arc::new(InMemoryArtistRepository::with_journal(journal.clone())),
        albums: Arc::new(InMemoryAlbumRepository::with_journal(journal.clone())),
        tracks: Arc::new(InMemoryTrackRepository::with_journal(journal.clone())),
        queue: Arc::new(InMemoryQueueRepository::new()),
    }
}

/// Drain every event currently buffered on `receiver`
pub fn drain(receiver: &mut broadcast::Receiver<CoreEvent>) -> Vec<CoreEvent> {
    let mut events = Vec::new();
    while let Ok(event) = receiver.try_recv() {
        events.push(event);
    }
    events
}
