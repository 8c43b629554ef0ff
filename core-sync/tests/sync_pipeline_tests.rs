//! End-to-end sync runs against fake sources and in-memory repositories

mod common;

use async_trait::async_trait;
use bridge_traits::media::{MediaAsset, MediaPage, PermissionStatus};
use common::{drain, garbage_file, tagged_wav, CountingArtwork, FakeCatalog, HarnessBuilder, MockMediaIndex};
use core_library::models::{Artist, Track};
use core_library::repositories::{BulkWrite, EntityKind, InMemoryTrackRepository};
use core_runtime::config::{RemoteCatalogConfig, SyncConfig};
use core_runtime::events::{CoreEvent, LibraryEvent, SyncEvent};
use core_sync::{
    LocalSource, RemoteSource, SourceItem, SourceKind, SourcePage, SourceProvider, SyncPhase,
};
use std::path::Path;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

fn remote_source(catalog: Arc<FakeCatalog>, page_size: usize) -> Arc<RemoteSource> {
    Arc::new(RemoteSource::new(
        catalog,
        &RemoteCatalogConfig::new("http://catalog.test:8080"),
        page_size,
        Duration::from_millis(20),
    ))
}

fn asset(id: &str, path: &Path, duration: f64) -> MediaAsset {
    MediaAsset {
        id: id.to_string(),
        filename: path.file_name().unwrap().to_string_lossy().into_owned(),
        uri: path.to_string_lossy().into_owned(),
        duration,
        creation_time: Some(1_700_000_000_000),
        modification_time: Some(1_700_000_500_000),
    }
}

fn position(events: &[CoreEvent], predicate: impl Fn(&CoreEvent) -> bool) -> Option<usize> {
    events.iter().position(predicate)
}

/// Source serving prebuilt remote tracks in one page
struct StaticSource {
    tracks: Vec<Track>,
}

#[async_trait]
impl SourceProvider for StaticSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Remote
    }

    fn page_size(&self) -> usize {
        1000
    }

    async fn count(&self) -> core_sync::Result<u64> {
        Ok(self.tracks.len() as u64)
    }

    async fn fetch_page(&self, _cursor: Option<String>) -> core_sync::Result<SourcePage> {
        Ok(SourcePage {
            items: self.tracks.iter().cloned().map(SourceItem::Remote).collect(),
            next_cursor: None,
            is_last: true,
        })
    }
}

// =============================================================================
// Local runs
// =============================================================================

#[tokio::test]
async fn test_local_run_skips_unreadable_file() {
    let dir = tempfile::tempdir().unwrap();
    let first = tagged_wav(dir.path(), "one.wav", "One", "Bob", "X");
    let second = tagged_wav(dir.path(), "two #2.wav", "Two", "Bob", "X");
    let broken = garbage_file(dir.path(), "three.mp3");

    let assets = vec![
        asset("a1", &first, 42.0),
        asset("a2", &second, 0.0),
        asset("a3", &broken, 12.0),
    ];

    let mut index = MockMediaIndex::new();
    index
        .expect_request_permission()
        .returning(|| Ok(PermissionStatus::Granted));
    index
        .expect_audio_assets()
        .withf(|first, _| *first == 0)
        .returning(|_, _| {
            Ok(MediaPage {
                total_count: 3,
                ..MediaPage::default()
            })
        });
    index
        .expect_audio_assets()
        .withf(|first, after| *first == 1000 && after.is_none())
        .times(1)
        .returning(move |_, _| {
            Ok(MediaPage {
                assets: assets.clone(),
                end_cursor: Some("3".to_string()),
                has_next_page: false,
                total_count: 3,
            })
        });

    let harness = HarnessBuilder::new(dir.path()).build();
    let controller = harness
        .controller
        .with_local_source(Arc::new(LocalSource::new(Arc::new(index), 1000)));

    let run = controller.start_local().await;
    assert_eq!(run.phase, SyncPhase::Completed);
    assert!(run.succeeded);
    assert_eq!(run.processed, 3);
    assert_eq!(run.total, 3);
    assert_eq!(run.message, "Completed");

    let repos = &harness.repositories;
    let artists = repos.artists.get_all().await.unwrap();
    let albums = repos.albums.get_all().await.unwrap();
    let tracks = repos.tracks.get_all().await.unwrap();
    assert_eq!(artists.len(), 1);
    assert_eq!(artists[0].name, "Bob");
    assert_eq!(albums.len(), 1);
    assert_eq!(albums[0].artist_id.as_ref(), Some(&artists[0].id));
    assert_eq!(tracks.len(), 2);

    for track in &tracks {
        assert_eq!(track.artist_id.as_ref(), Some(&artists[0].id));
        assert_eq!(track.album_id.as_ref(), Some(&albums[0].id));
        assert!(!track.is_remote);
        assert_eq!(track.creation_time, Some(1_700_000_000_000));
    }

    let one = tracks.iter().find(|t| t.title == "One").unwrap();
    assert_eq!(one.library_id.as_deref(), Some("a1"));
    assert_eq!(one.duration, 42.0);

    let two = tracks.iter().find(|t| t.title == "Two").unwrap();
    assert!(two.url.ends_with("two %232.wav"));
    assert!(two.duration > 0.9 && two.duration < 1.1);
}

#[tokio::test]
async fn test_local_run_without_permission_is_empty() {
    let dir = tempfile::tempdir().unwrap();

    let mut index = MockMediaIndex::new();
    index
        .expect_request_permission()
        .returning(|| Ok(PermissionStatus::Denied));
    index.expect_audio_assets().never();

    let harness = HarnessBuilder::new(dir.path()).build();
    let controller = harness
        .controller
        .with_local_source(Arc::new(LocalSource::new(Arc::new(index), 1000)));

    let run = controller.start_local().await;
    assert_eq!(run.phase, SyncPhase::Completed);
    assert_eq!(run.total, 0);
    assert_eq!(run.processed, 0);
    assert!(harness.repositories.tracks.get_all().await.unwrap().is_empty());
}

// =============================================================================
// Remote runs
// =============================================================================

#[tokio::test]
async fn test_precheck_failure_mutates_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let harness = HarnessBuilder::new(dir.path()).build();
    harness
        .repositories
        .artists
        .create_bulk(&[Artist::new("Existing")], 10)
        .await
        .unwrap();

    let catalog = Arc::new(FakeCatalog::unreachable());
    let controller = harness
        .controller
        .with_remote_source(remote_source(catalog.clone(), 1000));
    let mut events = controller.subscribe();

    let run = controller.start_remote().await;
    assert_eq!(run.phase, SyncPhase::Failed);
    assert_eq!(run.message, "Network Failure");
    assert!(!run.succeeded);

    assert_eq!(catalog.requests().len(), 1);
    assert_eq!(harness.journal.entries().await.len(), 1);
    assert_eq!(harness.repositories.artists.get_all().await.unwrap().len(), 1);

    let events = drain(&mut events);
    assert!(!events.contains(&CoreEvent::Sync(SyncEvent::Clearing)));
    assert!(events.iter().any(|e| matches!(
        e,
        CoreEvent::Sync(SyncEvent::Failed { message, .. }) if message == "Network Failure"
    )));
}

#[tokio::test]
async fn test_remote_run_pages_through_catalog() {
    let dir = tempfile::tempdir().unwrap();
    let harness = HarnessBuilder::new(dir.path()).build();
    let catalog = Arc::new(FakeCatalog::new(2500));
    let controller = harness
        .controller
        .with_remote_source(remote_source(catalog.clone(), 1000));
    let mut events = controller.subscribe();

    let run = controller.start_remote().await;
    assert_eq!(run.phase, SyncPhase::Completed);
    assert_eq!(run.processed, 2500);
    assert_eq!(run.total, 2500);

    assert_eq!(
        catalog.page_requests(),
        vec![(0, 1000), (1000, 1000), (2000, 1000)]
    );

    let tracks = harness.repositories.tracks.get_all().await.unwrap();
    assert_eq!(tracks.len(), 2500);
    assert!(tracks.iter().all(|t| t.is_remote));
    let sample = tracks.iter().find(|t| t.title == "Track 7").unwrap();
    assert_eq!(
        sample.url,
        "http://catalog.test:8080/muziko/api/tracks/7/stream"
    );
    assert_eq!(harness.repositories.artists.get_all().await.unwrap().len(), 3);
    assert_eq!(harness.repositories.albums.get_all().await.unwrap().len(), 5);

    let events = drain(&mut events);
    let progress: Vec<u64> = events
        .iter()
        .filter_map(|e| match e {
            CoreEvent::Sync(SyncEvent::Progress { processed, total, .. }) => {
                assert!(processed <= total);
                Some(*processed)
            }
            _ => None,
        })
        .collect();
    assert_eq!(progress.len(), 2500);
    assert_eq!(progress.last(), Some(&2500));

    let last_progress = events
        .iter()
        .rposition(|e| matches!(e, CoreEvent::Sync(SyncEvent::Progress { .. })))
        .unwrap();
    let saving = position(&events, |e| matches!(e, CoreEvent::Sync(SyncEvent::Saving { .. }))).unwrap();
    assert!(last_progress < saving);
}

#[tokio::test]
async fn test_writes_run_artists_then_albums_then_tracks() {
    let dir = tempfile::tempdir().unwrap();
    let harness = HarnessBuilder::new(dir.path())
        .config(SyncConfig {
            album_chunk_size: 40,
            ..SyncConfig::default()
        })
        .build();

    let tracks = (0..100)
        .map(|i| {
            let mut track = Track::new(format!("t{}", i), format!("http://c/{}", i), "f");
            track.artist = Some(format!("Artist {}", i % 7));
            track.album = Some(format!("Album {}", i));
            track.is_remote = true;
            track
        })
        .collect();

    let run = harness
        .controller
        .start(Arc::new(StaticSource { tracks }))
        .await;
    assert!(run.succeeded);

    let entries = harness.journal.entries().await;
    let albums: Vec<&BulkWrite> = entries
        .iter()
        .filter(|w| w.entity == EntityKind::Album)
        .collect();
    assert_eq!(
        albums.iter().map(|w| w.rows).collect::<Vec<_>>(),
        vec![40, 40, 20]
    );

    let last_artist = entries
        .iter()
        .rposition(|w| w.entity == EntityKind::Artist)
        .unwrap();
    let first_album = entries
        .iter()
        .position(|w| w.entity == EntityKind::Album)
        .unwrap();
    let first_track = entries
        .iter()
        .position(|w| w.entity == EntityKind::Track)
        .unwrap();
    let last_album = entries
        .iter()
        .rposition(|w| w.entity == EntityKind::Album)
        .unwrap();
    assert!(last_artist < first_album);
    assert!(last_album < first_track);
    assert_eq!(
        harness.journal.chunk_sizes(EntityKind::Track).await,
        vec![40, 40, 20]
    );
}

#[tokio::test]
async fn test_artwork_resolved_once_per_entity() {
    let dir = tempfile::tempdir().unwrap();
    let artwork = Arc::new(CountingArtwork::default());
    let harness = HarnessBuilder::new(dir.path())
        .artwork_provider(artwork.clone())
        .build();
    let controller = harness
        .controller
        .with_remote_source(remote_source(Arc::new(FakeCatalog::new(30)), 1000));

    let run = controller.start_remote().await;
    assert!(run.succeeded);
    assert_eq!(artwork.albums.load(Ordering::SeqCst), 5);
    assert_eq!(artwork.artists.load(Ordering::SeqCst), 3);

    let albums = harness.repositories.albums.get_all().await.unwrap();
    let tracks = harness.repositories.tracks.get_all().await.unwrap();
    for album in &albums {
        assert!(!album.no_artwork);
        let path = album.artwork.as_deref().unwrap();
        assert!(Path::new(path).exists());
        assert!(tracks
            .iter()
            .filter(|t| t.album_id.as_ref() == Some(&album.id))
            .all(|t| t.artwork.as_deref() == Some(path)));
    }
}

#[tokio::test]
async fn test_missing_artwork_is_flagged() {
    let dir = tempfile::tempdir().unwrap();
    let harness = HarnessBuilder::new(dir.path()).build();
    let controller = harness
        .controller
        .with_remote_source(remote_source(Arc::new(FakeCatalog::new(4)), 1000));

    assert!(controller.start_remote().await.succeeded);
    let artists = harness.repositories.artists.get_all().await.unwrap();
    assert!(artists.iter().all(|a| a.no_artwork && a.artwork.is_none()));
}

// =============================================================================
// Failures
// =============================================================================

#[tokio::test]
async fn test_page_failure_routes_to_failed() {
    let dir = tempfile::tempdir().unwrap();
    let harness = HarnessBuilder::new(dir.path()).build();
    let catalog = Arc::new(FakeCatalog::new(2500).failing_pages_from(1000));
    let controller = harness
        .controller
        .with_remote_source(remote_source(catalog, 1000));

    let run = controller.start_remote().await;
    assert_eq!(run.phase, SyncPhase::Failed);
    assert!(!run.succeeded);
    assert!(run.message.contains("HTTP 500"), "message: {}", run.message);
    assert_eq!(run.processed, 1000);
    assert!(harness.repositories.tracks.get_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_persistence_failure_routes_to_failed() {
    let dir = tempfile::tempdir().unwrap();
    let harness = HarnessBuilder::new(dir.path())
        .config(SyncConfig {
            track_chunk_size: 0,
            ..SyncConfig::default()
        })
        .build();
    let controller = harness
        .controller
        .with_remote_source(remote_source(Arc::new(FakeCatalog::new(10)), 1000));
    let mut events = controller.subscribe();

    let run = controller.start_remote().await;
    assert_eq!(run.phase, SyncPhase::Failed);
    assert!(run.message.contains("chunk_size"), "message: {}", run.message);
    assert_eq!(run.processed, 10);

    let events = drain(&mut events);
    let saving = position(&events, |e| matches!(e, CoreEvent::Sync(SyncEvent::Saving { .. })));
    let failed = position(&events, |e| matches!(e, CoreEvent::Sync(SyncEvent::Failed { .. })));
    assert!(saving.unwrap() < failed.unwrap());
    assert!(matches!(
        events.last(),
        Some(CoreEvent::Library(LibraryEvent::Refreshed { .. }))
    ));
}

#[tokio::test]
async fn test_clear_failure_routes_to_failed() {
    let dir = tempfile::tempdir().unwrap();
    let tracks = Arc::new(InMemoryTrackRepository::new());
    tracks.fail_writes(true);

    let journal = core_library::repositories::WriteJournal::new();
    let repositories = core_sync::LibraryRepositories {
        tracks,
        ..common::in_memory_repositories(&journal)
    };
    let harness = HarnessBuilder::new(dir.path())
        .repositories(repositories)
        .build();

    let run = harness.controller.clear().await;
    assert_eq!(run.phase, SyncPhase::Failed);
    assert!(!run.succeeded);
    assert!(!harness.controller.is_running());
}

#[tokio::test]
async fn test_unconfigured_source_fails_run() {
    let dir = tempfile::tempdir().unwrap();
    let harness = HarnessBuilder::new(dir.path()).build();

    let run = harness.controller.start_remote().await;
    assert_eq!(run.phase, SyncPhase::Failed);
    assert_eq!(run.message, "remote source is not configured");
}

// =============================================================================
// Observation and commands
// =============================================================================

#[tokio::test]
async fn test_event_sequence() {
    let dir = tempfile::tempdir().unwrap();
    let harness = HarnessBuilder::new(dir.path()).build();
    let controller = harness
        .controller
        .with_remote_source(remote_source(Arc::new(FakeCatalog::new(2)), 1000));
    let mut events = controller.subscribe();

    controller.start_remote().await;

    let events = drain(&mut events);
    assert_eq!(events.len(), 7);
    assert_eq!(events[0], CoreEvent::Sync(SyncEvent::Clearing));
    assert_eq!(events[1], CoreEvent::Sync(SyncEvent::Started { total: 2 }));
    assert_eq!(
        events[2],
        CoreEvent::Sync(SyncEvent::Progress {
            processed: 1,
            total: 2,
            percent: 50.0,
            message: "1 / 2".to_string(),
        })
    );
    assert!(matches!(
        events[4],
        CoreEvent::Sync(SyncEvent::Saving { artists: 2, albums: 2, tracks: 2 })
    ));
    assert!(matches!(
        events[5],
        CoreEvent::Sync(SyncEvent::Completed { tracks: 2, .. })
    ));
    assert!(matches!(
        events[6],
        CoreEvent::Library(LibraryEvent::Refreshed { .. })
    ));
}

#[tokio::test]
async fn test_clear_resets_library_and_artwork() {
    let dir = tempfile::tempdir().unwrap();
    let harness = HarnessBuilder::new(dir.path())
        .artwork_provider(Arc::new(CountingArtwork::default()))
        .build();
    let controller = harness
        .controller
        .with_remote_source(remote_source(Arc::new(FakeCatalog::new(10)), 1000));

    assert!(controller.start_remote().await.succeeded);
    std::fs::write(harness.artwork_dir.join("SQLite"), b"keep").unwrap();
    assert!(std::fs::read_dir(&harness.artwork_dir).unwrap().count() > 1);

    let mut events = controller.subscribe();
    let run = controller.clear().await;
    assert_eq!(run.phase, SyncPhase::Idle);
    assert_eq!(run.message, "Not started");

    assert!(harness.repositories.artists.get_all().await.unwrap().is_empty());
    assert!(harness.repositories.albums.get_all().await.unwrap().is_empty());
    assert!(harness.repositories.tracks.get_all().await.unwrap().is_empty());

    let remaining: Vec<_> = std::fs::read_dir(&harness.artwork_dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(remaining, vec!["SQLite".to_string()]);

    let events = drain(&mut events);
    assert_eq!(events[0], CoreEvent::Sync(SyncEvent::Clearing));
    assert_eq!(events[1], CoreEvent::Sync(SyncEvent::Cleared));
}

#[tokio::test]
async fn test_rerun_rebuilds_from_empty() {
    let dir = tempfile::tempdir().unwrap();
    let harness = HarnessBuilder::new(dir.path()).build();
    let controller = harness
        .controller
        .with_remote_source(remote_source(Arc::new(FakeCatalog::new(25)), 1000));

    assert!(controller.start_remote().await.succeeded);
    let second = controller.start_remote().await;
    assert!(second.succeeded);
    assert_eq!(second.processed, 25);
    assert_eq!(harness.repositories.tracks.get_all().await.unwrap().len(), 25);
    assert_eq!(harness.repositories.artists.get_all().await.unwrap().len(), 3);
}

/// Source whose count blocks until released
struct GatedSource {
    entered: Notify,
    release: Notify,
}

#[async_trait]
impl SourceProvider for GatedSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Local
    }

    fn page_size(&self) -> usize {
        10
    }

    async fn count(&self) -> core_sync::Result<u64> {
        self.entered.notify_one();
        self.release.notified().await;
        Ok(0)
    }

    async fn fetch_page(&self, _cursor: Option<String>) -> core_sync::Result<SourcePage> {
        Ok(SourcePage {
            is_last: true,
            ..SourcePage::default()
        })
    }
}

#[tokio::test]
async fn test_concurrent_start_is_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let harness = HarnessBuilder::new(dir.path()).build();
    let controller = Arc::new(harness.controller);
    let source = Arc::new(GatedSource {
        entered: Notify::new(),
        release: Notify::new(),
    });

    let running = {
        let controller = controller.clone();
        let source = source.clone();
        tokio::spawn(async move { controller.start(source).await })
    };

    source.entered.notified().await;
    assert!(controller.is_running());

    let ignored = controller.start(source.clone()).await;
    assert_eq!(ignored.phase, SyncPhase::Clearing);
    let ignored_clear = controller.clear().await;
    assert_eq!(ignored_clear.phase, SyncPhase::Clearing);

    source.release.notify_one();
    let finished = running.await.unwrap();
    assert_eq!(finished.phase, SyncPhase::Completed);
    assert!(!controller.is_running());
}
