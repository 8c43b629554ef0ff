//! Core service façade and bootstrap helpers.
//!
//! This crate wires host-provided bridge implementations (HTTP, filesystem,
//! media index) together with the SQLite library store into a ready-to-use
//! sync controller. Desktop apps typically enable the `desktop-shims` feature
//! (which depends on `bridge-desktop`) so that bridges missing from the
//! [`CoreConfig`] are filled in with desktop defaults. Other hosts pass their
//! own bridges through the config builder.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//! use core_service::CoreService;
//!
//! let config = CoreConfig::from_env()?;
//! let core = CoreService::bootstrap(config).await?;
//!
//! let mut progress = core.subscribe();
//! let run = core.start_local_sync().await;
//! println!("{}: {}", run.phase, run.message);
//! ```

pub mod error;

pub use error::{CoreError, Result};

use std::sync::Arc;

use bridge_traits::{
    http::HttpClient, media::MediaIndex, storage::FileSystemAccess, time::SystemClock,
};
use core_library::db::{create_pool, DatabaseConfig};
use core_library::models::{Album, Artist, QueuedTrack, Track};
use core_library::repositories::{
    SqliteAlbumRepository, SqliteArtistRepository, SqliteQueueRepository, SqliteTrackRepository,
};
use core_library::SqlitePool;
use core_metadata::artwork::{ArtworkChain, ArtworkStore};
use core_metadata::extractor::MetadataExtractor;
use core_metadata::providers::{
    CatalogArtworkProvider, EmbeddedArtworkProvider, SpotifyArtworkProvider,
};
use core_runtime::config::CoreConfig;
use core_runtime::events::{CoreEvent, EventBus};
use core_sync::{LibraryRepositories, LocalSource, RemoteSource, SyncController, SyncRun};
use tokio::sync::broadcast;
use tracing::info;

#[cfg(feature = "desktop-shims")]
use bridge_desktop::{default_music_dir, DirectoryMediaIndex, ReqwestHttpClient, TokioFileSystem};

/// Host bridges resolved for one service instance.
struct Bridges {
    http_client: Option<Arc<dyn HttpClient>>,
    file_system: Arc<dyn FileSystemAccess>,
    media_index: Option<Arc<dyn MediaIndex>>,
}

impl Bridges {
    fn resolve(config: &CoreConfig) -> Result<Self> {
        let needs_http = config.remote_catalog.is_some() || config.external_artwork.is_some();

        let http_client = match config.http_client.clone() {
            Some(client) => Some(client),
            None if needs_http => Some(Self::default_http_client()?),
            None => None,
        };

        let file_system = match config.file_system.clone() {
            Some(fs) => fs,
            None => Self::default_file_system()?,
        };

        let media_index = match config.media_index.clone() {
            Some(index) => Some(index),
            None => Self::default_media_index(config),
        };

        Ok(Self {
            http_client,
            file_system,
            media_index,
        })
    }

    #[cfg(feature = "desktop-shims")]
    fn default_http_client() -> Result<Arc<dyn HttpClient>> {
        Ok(Arc::new(ReqwestHttpClient::new()?))
    }

    #[cfg(not(feature = "desktop-shims"))]
    fn default_http_client() -> Result<Arc<dyn HttpClient>> {
        Err(CoreError::CapabilityMissing {
            capability: "HttpClient".to_string(),
            message: "a remote catalog or external artwork is configured without an HTTP client"
                .to_string(),
        })
    }

    #[cfg(feature = "desktop-shims")]
    fn default_file_system() -> Result<Arc<dyn FileSystemAccess>> {
        Ok(Arc::new(TokioFileSystem::new()))
    }

    #[cfg(not(feature = "desktop-shims"))]
    fn default_file_system() -> Result<Arc<dyn FileSystemAccess>> {
        Err(CoreError::CapabilityMissing {
            capability: "FileSystemAccess".to_string(),
            message: "no file system bridge was provided".to_string(),
        })
    }

    #[cfg(feature = "desktop-shims")]
    fn default_media_index(config: &CoreConfig) -> Option<Arc<dyn MediaIndex>> {
        let root = config.music_dir.clone().or_else(default_music_dir)?;
        Some(Arc::new(DirectoryMediaIndex::new(root)))
    }

    #[cfg(not(feature = "desktop-shims"))]
    fn default_media_index(_config: &CoreConfig) -> Option<Arc<dyn MediaIndex>> {
        None
    }
}

/// Primary façade exposed to host applications.
#[derive(Clone)]
pub struct CoreService {
    pool: SqlitePool,
    repositories: LibraryRepositories,
    controller: Arc<SyncController>,
}

impl CoreService {
    /// Open the library database and assemble the sync pipeline from `config`.
    ///
    /// The artwork chain always starts with embedded cover art; catalog
    /// artwork is added when a remote catalog is configured and the external
    /// provider when its credentials are present.
    pub async fn bootstrap(config: CoreConfig) -> Result<Self> {
        config.validate()?;
        let bridges = Bridges::resolve(&config)?;

        let pool = create_pool(DatabaseConfig::new(config.database_path.clone())).await?;
        let repositories = LibraryRepositories {
            artists: Arc::new(SqliteArtistRepository::new(pool.clone())),
            albums: Arc::new(SqliteAlbumRepository::new(pool.clone())),
            tracks: Arc::new(SqliteTrackRepository::new(pool.clone())),
            queue: Arc::new(SqliteQueueRepository::new(pool.clone())),
        };

        let extractor = Arc::new(MetadataExtractor::new(
            bridges.file_system.clone(),
            &config.sync,
        ));

        let mut chain = ArtworkChain::new(ArtworkStore::new(
            bridges.file_system.clone(),
            config.artwork_dir.clone(),
        ))
        .with_provider(Arc::new(EmbeddedArtworkProvider::new(extractor.clone())));

        if let (Some(http), Some(catalog)) = (&bridges.http_client, &config.remote_catalog) {
            chain = chain.with_provider(Arc::new(CatalogArtworkProvider::new(http.clone(), catalog)));
        }
        if let (Some(http), Some(external)) = (&bridges.http_client, &config.external_artwork) {
            chain = chain.with_provider(Arc::new(SpotifyArtworkProvider::new(
                http.clone(),
                external.clone(),
            )));
        }
        info!(providers = ?chain.provider_names(), "Artwork chain ready");

        let mut controller = SyncController::new(
            repositories.clone(),
            Arc::new(chain),
            extractor,
            EventBus::new(config.sync.event_capacity),
            Arc::new(SystemClock),
            &config.sync,
        );

        if let Some(index) = bridges.media_index {
            controller = controller.with_local_source(Arc::new(LocalSource::new(
                index,
                config.sync.local_page_size,
            )));
        }
        if let (Some(http), Some(catalog)) = (bridges.http_client, &config.remote_catalog) {
            controller = controller.with_remote_source(Arc::new(RemoteSource::new(
                http,
                catalog,
                config.sync.remote_page_size,
                config.sync.health_timeout,
            )));
        }

        info!(database = ?config.database_path, "Core service ready");
        Ok(Self {
            pool,
            repositories,
            controller: Arc::new(controller),
        })
    }

    // ========================================================================
    // Sync commands
    // ========================================================================

    pub async fn start_local_sync(&self) -> SyncRun {
        self.controller.start_local().await
    }

    pub async fn start_remote_sync(&self) -> SyncRun {
        self.controller.start_remote().await
    }

    pub async fn clear_library(&self) -> SyncRun {
        self.controller.clear().await
    }

    pub async fn sync_state(&self) -> SyncRun {
        self.controller.state().await
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CoreEvent> {
        self.controller.subscribe()
    }

    pub fn controller(&self) -> Arc<SyncController> {
        Arc::clone(&self.controller)
    }

    // ========================================================================
    // Library views
    // ========================================================================

    pub async fn artists(&self) -> Result<Vec<Artist>> {
        Ok(self.repositories.artists.get_all().await?)
    }

    pub async fn albums(&self) -> Result<Vec<Album>> {
        Ok(self.repositories.albums.get_all().await?)
    }

    pub async fn tracks(&self) -> Result<Vec<Track>> {
        Ok(self.repositories.tracks.get_all().await?)
    }

    pub async fn queue(&self) -> Result<Vec<QueuedTrack>> {
        Ok(self.repositories.queue.get_all().await?)
    }

    pub fn repositories(&self) -> &LibraryRepositories {
        &self.repositories
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
