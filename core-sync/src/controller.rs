//! # Sync Controller
//!
//! Drives one library rebuild from a source provider and publishes its
//! progress.
//!
//! ## Workflow
//!
//! 1. Precheck the source (remote health check); a failure ends the run in
//!    `Failed` before anything is touched
//! 2. Clear artwork files, tracks, albums, artists and the play queue
//! 3. Count the source once and fix the run total
//! 4. Pull pages sequentially, building the library item by item
//! 5. Write artists, albums and tracks in chunks
//! 6. Emit `LibraryEvent::Refreshed` whatever the outcome
//!
//! Any error after the precheck also ends the run in `Failed` with the error
//! as its message. Callers never receive an error from `start`; they read
//! the returned [`SyncRun`] or subscribe to the event bus.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use core_sync::SyncController;
//!
//! let controller = SyncController::new(repositories, artwork, extractor, events, clock, &config)
//!     .with_local_source(Arc::new(LocalSource::new(media_index, 1000)));
//!
//! let mut progress = controller.subscribe();
//! let run = controller.start_local().await;
//! assert!(run.succeeded);
//! ```

use crate::builder::LibraryBuilder;
use crate::run::SyncRun;
use crate::source::{SourceKind, SourceProvider};
use crate::writer::{BulkWriter, LibraryRepositories, WriteSummary};
use crate::{Result, SyncError};
use bridge_traits::time::Clock;
use core_metadata::artwork::ArtworkChain;
use core_metadata::extractor::MetadataExtractor;
use core_runtime::config::SyncConfig;
use core_runtime::events::{CoreEvent, EventBus, LibraryEvent, SyncEvent};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, error, info, instrument, warn};

/// Releases the single-run guard when dropped
struct RunGuard<'a>(&'a AtomicBool);

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Owner of the sync run state and the pipeline that advances it
pub struct SyncController {
    repositories: LibraryRepositories,
    writer: BulkWriter,
    artwork: Arc<ArtworkChain>,
    extractor: Arc<MetadataExtractor>,
    events: EventBus,
    clock: Arc<dyn Clock>,
    run: RwLock<SyncRun>,
    running: AtomicBool,
    local: Option<Arc<dyn SourceProvider>>,
    remote: Option<Arc<dyn SourceProvider>>,
}

impl SyncController {
    pub fn new(
        repositories: LibraryRepositories,
        artwork: Arc<ArtworkChain>,
        extractor: Arc<MetadataExtractor>,
        events: EventBus,
        clock: Arc<dyn Clock>,
        config: &SyncConfig,
    ) -> Self {
        let writer = BulkWriter::new(repositories.clone(), config);
        let run = SyncRun::new(clock.now());

        Self {
            repositories,
            writer,
            artwork,
            extractor,
            events,
            clock,
            run: RwLock::new(run),
            running: AtomicBool::new(false),
            local: None,
            remote: None,
        }
    }

    pub fn with_local_source(mut self, source: Arc<dyn SourceProvider>) -> Self {
        self.local = Some(source);
        self
    }

    pub fn with_remote_source(mut self, source: Arc<dyn SourceProvider>) -> Self {
        self.remote = Some(source);
        self
    }

    pub fn has_source(&self, kind: SourceKind) -> bool {
        match kind {
            SourceKind::Local => self.local.is_some(),
            SourceKind::Remote => self.remote.is_some(),
        }
    }

    /// Snapshot of the current (or last) run
    pub async fn state(&self) -> SyncRun {
        self.run.read().await.clone()
    }

    /// Subscribe to sync and library events
    pub fn subscribe(&self) -> broadcast::Receiver<CoreEvent> {
        self.events.subscribe()
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    // =========================================================================
    // Commands
    // =========================================================================

    /// Rebuild the library from the device media index
    pub async fn start_local(&self) -> SyncRun {
        self.start_kind(SourceKind::Local).await
    }

    /// Rebuild the library from the remote catalog
    pub async fn start_remote(&self) -> SyncRun {
        self.start_kind(SourceKind::Remote).await
    }

    async fn start_kind(&self, kind: SourceKind) -> SyncRun {
        let source = match kind {
            SourceKind::Local => self.local.clone(),
            SourceKind::Remote => self.remote.clone(),
        };

        match source {
            Some(source) => self.start(source).await,
            None => {
                let Some(_guard) = self.acquire().await else {
                    return self.state().await;
                };
                let err = SyncError::SourceUnavailable(kind.as_str());
                warn!(error = %err, "Cannot start sync");
                self.fail(&err).await
            }
        }
    }

    /// Run a full rebuild from `source` and return the final state.
    ///
    /// If a run or clear is already executing, nothing starts and the current
    /// snapshot is returned.
    #[instrument(skip(self, source), fields(source = %source.kind()))]
    pub async fn start(&self, source: Arc<dyn SourceProvider>) -> SyncRun {
        let Some(_guard) = self.acquire().await else {
            return self.state().await;
        };

        let started = Instant::now();
        let snapshot = match self.execute(source.as_ref()).await {
            Ok(summary) => self.finish(summary, started).await,
            Err(e) => {
                error!(error = %e, "Sync failed");
                self.fail(&e).await
            }
        };

        self.emit_refreshed();
        snapshot
    }

    /// Delete the library and its artwork, then return to `Idle`
    #[instrument(skip(self))]
    pub async fn clear(&self) -> SyncRun {
        let Some(_guard) = self.acquire().await else {
            return self.state().await;
        };

        let result = async {
            self.begin_clearing().await?;
            self.update(|run, now| run.reset(now)).await?;
            self.emit(SyncEvent::Cleared);
            Ok::<_, SyncError>(())
        }
        .await;

        let snapshot = match result {
            Ok(()) => {
                info!("Library cleared");
                self.state().await
            }
            Err(e) => {
                error!(error = %e, "Clear failed");
                self.fail(&e).await
            }
        };

        self.emit_refreshed();
        snapshot
    }

    // =========================================================================
    // Pipeline
    // =========================================================================

    async fn execute(&self, source: &dyn SourceProvider) -> Result<WriteSummary> {
        info!("Phase 1: Checking source availability");
        source.precheck().await?;

        info!("Phase 2: Clearing library");
        self.begin_clearing().await?;

        info!("Phase 3: Counting source items");
        let total = source.count().await?;
        self.update(|run, now| run.begin_scanning(total, now)).await?;
        self.emit(SyncEvent::Started { total });

        info!("Phase 4: Scanning {} items", total);
        let mut builder = LibraryBuilder::new(self.artwork.clone(), self.extractor.clone());
        let page_size = source.page_size().max(1) as u64;
        let max_pages = total.div_ceil(page_size);
        let mut cursor = None;

        for page_number in 1..=max_pages {
            let page = source.fetch_page(cursor.take()).await?;
            let fetched = page.items.len();

            for item in page.items {
                builder.add_item(item).await?;
                let run = self.update(|run, now| run.record_item(now)).await?;
                self.emit(SyncEvent::Progress {
                    processed: run.processed,
                    total: run.total,
                    percent: run.percent,
                    message: run.message,
                });
            }

            debug!(page = page_number, fetched, "Page processed");
            if page.is_last || page.next_cursor.is_none() {
                break;
            }
            cursor = page.next_cursor;
        }

        let graph = builder.into_graph();
        info!(
            "Phase 5: Saving {} artists, {} albums, {} tracks",
            graph.artists.len(),
            graph.albums.len(),
            graph.tracks.len()
        );
        self.update(|run, now| run.begin_saving(now)).await?;
        self.emit(SyncEvent::Saving {
            artists: graph.artists.len(),
            albums: graph.albums.len(),
            tracks: graph.tracks.len(),
        });

        self.writer.write(&graph).await
    }

    async fn begin_clearing(&self) -> Result<()> {
        self.update(|run, now| run.begin_clearing(now)).await?;
        self.emit(SyncEvent::Clearing);

        let removed_files = self.artwork.store().clear().await?;
        let removed = self.repositories.clear_entities().await?;
        self.repositories.clear_queue().await?;

        debug!(removed_files, ?removed, "Library cleared");
        Ok(())
    }

    async fn finish(&self, summary: WriteSummary, started: Instant) -> SyncRun {
        let duration_ms = started.elapsed().as_millis() as u64;

        match self.update(|run, now| run.complete(now)).await {
            Ok(run) => {
                info!(
                    artists = summary.artists,
                    albums = summary.albums,
                    tracks = summary.tracks,
                    duration_ms,
                    "Phase 6: Sync completed"
                );
                self.emit(SyncEvent::Completed {
                    artists: summary.artists as usize,
                    albums: summary.albums as usize,
                    tracks: summary.tracks as usize,
                    duration_ms,
                });
                run
            }
            Err(e) => self.fail(&e).await,
        }
    }

    // =========================================================================
    // State helpers
    // =========================================================================

    async fn acquire(&self) -> Option<RunGuard<'_>> {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            let phase = self.run.read().await.phase;
            let err = SyncError::SyncInProgress {
                phase: phase.to_string(),
            };
            warn!(error = %err, "Ignoring start request");
            return None;
        }
        Some(RunGuard(&self.running))
    }

    async fn update<F>(&self, apply: F) -> Result<SyncRun>
    where
        F: FnOnce(&mut SyncRun, chrono::DateTime<chrono::Utc>) -> Result<()>,
    {
        let mut run = self.run.write().await;
        apply(&mut run, self.clock.now())?;
        Ok(run.clone())
    }

    async fn fail(&self, err: &SyncError) -> SyncRun {
        let snapshot = {
            let mut run = self.run.write().await;
            run.fail(err.to_string(), self.clock.now());
            run.clone()
        };

        self.emit(SyncEvent::Failed {
            message: snapshot.message.clone(),
            processed: snapshot.processed,
            total: snapshot.total,
        });
        snapshot
    }

    fn emit(&self, event: SyncEvent) {
        self.events.emit(CoreEvent::Sync(event)).ok();
    }

    fn emit_refreshed(&self) {
        self.events
            .emit(CoreEvent::Library(LibraryEvent::Refreshed {
                at: self.clock.unix_timestamp_millis(),
            }))
            .ok();
    }
}
