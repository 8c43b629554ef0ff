//! # Core Configuration Module
//!
//! Configuration for the library sync core.
//!
//! ## Overview
//!
//! A builder constructs a [`CoreConfig`] holding paths, pipeline tuning
//! ([`SyncConfig`]), the optional remote catalog and external artwork
//! settings, and optional host bridges. Bridges left unset are filled in with
//! desktop defaults by the service bootstrap.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::{CoreConfig, RemoteCatalogConfig};
//!
//! let config = CoreConfig::builder()
//!     .database_path("/home/sam/.local/share/muziko/library.db")
//!     .artwork_dir("/home/sam/.local/share/muziko/artwork")
//!     .music_dir("/home/sam/Music")
//!     .remote_catalog(RemoteCatalogConfig::new("http://nas.local:8080"))
//!     .build()?;
//! ```
//!
//! Values can also be read from the environment with [`CoreConfig::from_env`].

use crate::error::{Error, Result};
use bridge_traits::{FileSystemAccess, HttpClient, MediaIndex};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Path prefix of the catalog service API, relative to the server URL.
pub const CATALOG_API_PREFIX: &str = "muziko/api/";

const MAX_CHUNK_SIZE: usize = 1000;

// ============================================================================
// Sync Pipeline Settings
// ============================================================================

/// Tuning for one sync run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Assets requested per media index page
    pub local_page_size: usize,
    /// Tracks requested per catalog page (`take`)
    pub remote_page_size: usize,
    /// Timeout of the catalog health precheck
    pub health_timeout: Duration,
    /// Rows per bulk insert for artists
    pub artist_chunk_size: usize,
    /// Rows per bulk insert for albums
    pub album_chunk_size: usize,
    /// Rows per bulk insert for tracks
    pub track_chunk_size: usize,
    /// Bytes read from the start of a file when parsing tags only
    pub tag_chunk_bytes: usize,
    /// Bytes read from the start of a file when embedded artwork is wanted
    pub artwork_chunk_bytes: usize,
    /// Buffered events per progress subscriber
    pub event_capacity: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            local_page_size: 1000,
            remote_page_size: 1000,
            health_timeout: Duration::from_millis(20),
            artist_chunk_size: 300,
            album_chunk_size: 300,
            track_chunk_size: 40,
            tag_chunk_bytes: 48 * 1024,
            artwork_chunk_bytes: 1024 * 1024,
            event_capacity: 100,
        }
    }
}

impl SyncConfig {
    pub fn with_page_sizes(mut self, local: usize, remote: usize) -> Self {
        self.local_page_size = local;
        self.remote_page_size = remote;
        self
    }

    pub fn with_chunk_sizes(mut self, artists: usize, albums: usize, tracks: usize) -> Self {
        self.artist_chunk_size = artists;
        self.album_chunk_size = albums;
        self.track_chunk_size = tracks;
        self
    }

    pub fn with_health_timeout(mut self, timeout: Duration) -> Self {
        self.health_timeout = timeout;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.local_page_size == 0 || self.remote_page_size == 0 {
            return Err(Error::Config("Page sizes must be greater than 0".to_string()));
        }

        for (name, size) in [
            ("artist", self.artist_chunk_size),
            ("album", self.album_chunk_size),
            ("track", self.track_chunk_size),
        ] {
            if size == 0 || size > MAX_CHUNK_SIZE {
                return Err(Error::Config(format!(
                    "{} chunk size must be between 1 and {}, got {}",
                    name, MAX_CHUNK_SIZE, size
                )));
            }
        }

        if self.tag_chunk_bytes == 0 || self.tag_chunk_bytes > self.artwork_chunk_bytes {
            return Err(Error::Config(
                "Tag chunk must be non-empty and no larger than the artwork chunk".to_string(),
            ));
        }

        if self.health_timeout.is_zero() {
            return Err(Error::Config(
                "Health check timeout must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

// ============================================================================
// Remote Services
// ============================================================================

/// Location of the remote catalog service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteCatalogConfig {
    /// Server URL, always ending in `/`
    pub server_url: String,
}

impl RemoteCatalogConfig {
    pub fn new(server_url: impl Into<String>) -> Self {
        let mut server_url = server_url.into();
        if !server_url.ends_with('/') {
            server_url.push('/');
        }
        Self { server_url }
    }

    /// Base URL of the API (`{server}muziko/api/`).
    pub fn api_base(&self) -> String {
        format!("{}{}", self.server_url, CATALOG_API_PREFIX)
    }
}

/// Credentials and endpoints of the external artwork provider (Spotify Web API).
#[derive(Clone, PartialEq, Eq)]
pub struct ExternalArtworkConfig {
    pub client_id: String,
    pub client_secret: String,
    /// Token endpoint for the client-credentials exchange
    pub accounts_url: String,
    /// Web API base, without trailing slash
    pub api_url: String,
}

impl ExternalArtworkConfig {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            accounts_url: "https://accounts.spotify.com/api/token".to_string(),
            api_url: "https://api.spotify.com/v1".to_string(),
        }
    }

    /// Point the provider at different endpoints (used by tests and proxies).
    pub fn with_endpoints(mut self, accounts_url: impl Into<String>, api_url: impl Into<String>) -> Self {
        self.accounts_url = accounts_url.into();
        self.api_url = api_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.client_id.is_empty() || self.client_secret.is_empty() {
            return Err(Error::Config(
                "External artwork client id and secret must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl std::fmt::Debug for ExternalArtworkConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExternalArtworkConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("accounts_url", &self.accounts_url)
            .field("api_url", &self.api_url)
            .finish()
    }
}

// ============================================================================
// Core Config
// ============================================================================

/// Core configuration for the library sync service.
#[derive(Clone)]
pub struct CoreConfig {
    /// Path to the SQLite database file
    pub database_path: PathBuf,
    /// Private directory holding resolved artwork files
    pub artwork_dir: PathBuf,
    /// Root of the local music collection (desktop media index)
    pub music_dir: Option<PathBuf>,
    pub sync: SyncConfig,
    pub remote_catalog: Option<RemoteCatalogConfig>,
    pub external_artwork: Option<ExternalArtworkConfig>,
    pub http_client: Option<Arc<dyn HttpClient>>,
    pub file_system: Option<Arc<dyn FileSystemAccess>>,
    pub media_index: Option<Arc<dyn MediaIndex>>,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("database_path", &self.database_path)
            .field("artwork_dir", &self.artwork_dir)
            .field("music_dir", &self.music_dir)
            .field("sync", &self.sync)
            .field("remote_catalog", &self.remote_catalog)
            .field("external_artwork", &self.external_artwork)
            .field(
                "http_client",
                &self.http_client.as_ref().map(|_| "HttpClient { ... }"),
            )
            .field(
                "file_system",
                &self.file_system.as_ref().map(|_| "FileSystemAccess { ... }"),
            )
            .field(
                "media_index",
                &self.media_index.as_ref().map(|_| "MediaIndex { ... }"),
            )
            .finish()
    }
}

impl CoreConfig {
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Build a configuration from `MUZIKO_*` and `SPOTIFY_*` environment variables.
    ///
    /// `MUZIKO_DATABASE_PATH` and `MUZIKO_ARTWORK_DIR` are required.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut builder = CoreConfig::builder();

        if let Some(path) = lookup("MUZIKO_DATABASE_PATH") {
            builder = builder.database_path(path);
        }
        if let Some(path) = lookup("MUZIKO_ARTWORK_DIR") {
            builder = builder.artwork_dir(path);
        }
        if let Some(path) = lookup("MUZIKO_MUSIC_DIR") {
            builder = builder.music_dir(path);
        }
        if let Some(url) = lookup("MUZIKO_SERVER_URL").filter(|u| !u.is_empty()) {
            builder = builder.remote_catalog(RemoteCatalogConfig::new(url));
        }
        if let (Some(id), Some(secret)) = (
            lookup("SPOTIFY_CLIENT_ID"),
            lookup("SPOTIFY_CLIENT_SECRET"),
        ) {
            builder = builder.external_artwork(ExternalArtworkConfig::new(id, secret));
        }

        builder.build()
    }

    /// Validates paths and nested settings.
    pub fn validate(&self) -> Result<()> {
        if self.database_path.as_os_str().is_empty() {
            return Err(Error::Config("Database path cannot be empty".to_string()));
        }

        if self.artwork_dir.as_os_str().is_empty() {
            return Err(Error::Config("Artwork directory cannot be empty".to_string()));
        }

        if self.database_path.starts_with(&self.artwork_dir) {
            return Err(Error::Config(format!(
                "Database path {} must not be inside the artwork directory {}",
                self.database_path.display(),
                self.artwork_dir.display()
            )));
        }

        if let Some(music_dir) = self.music_dir.as_ref().filter(|d| d.starts_with(&self.artwork_dir)) {
            return Err(Error::Config(format!(
                "Music directory {} must not be inside the artwork directory {}",
                music_dir.display(),
                self.artwork_dir.display()
            )));
        }

        self.sync.validate()?;

        if let Some(remote) = &self.remote_catalog {
            if !remote.server_url.starts_with("http://") && !remote.server_url.starts_with("https://") {
                return Err(Error::Config(format!(
                    "Server URL must start with http:// or https://, got {}",
                    remote.server_url
                )));
            }
        }

        if let Some(external) = &self.external_artwork {
            external.validate()?;
        }

        Ok(())
    }
}

/// Builder for [`CoreConfig`].
#[derive(Default)]
pub struct CoreConfigBuilder {
    database_path: Option<PathBuf>,
    artwork_dir: Option<PathBuf>,
    music_dir: Option<PathBuf>,
    sync: Option<SyncConfig>,
    remote_catalog: Option<RemoteCatalogConfig>,
    external_artwork: Option<ExternalArtworkConfig>,
    http_client: Option<Arc<dyn HttpClient>>,
    file_system: Option<Arc<dyn FileSystemAccess>>,
    media_index: Option<Arc<dyn MediaIndex>>,
}

impl CoreConfigBuilder {
    pub fn database_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.database_path = Some(path.into());
        self
    }

    pub fn artwork_dir<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.artwork_dir = Some(path.into());
        self
    }

    pub fn music_dir<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.music_dir = Some(path.into());
        self
    }

    pub fn sync(mut self, sync: SyncConfig) -> Self {
        self.sync = Some(sync);
        self
    }

    pub fn remote_catalog(mut self, remote: RemoteCatalogConfig) -> Self {
        self.remote_catalog = Some(remote);
        self
    }

    pub fn external_artwork(mut self, external: ExternalArtworkConfig) -> Self {
        self.external_artwork = Some(external);
        self
    }

    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    pub fn file_system(mut self, fs: Arc<dyn FileSystemAccess>) -> Self {
        self.file_system = Some(fs);
        self
    }

    pub fn media_index(mut self, index: Arc<dyn MediaIndex>) -> Self {
        self.media_index = Some(index);
        self
    }

    /// Builds and validates the configuration.
    pub fn build(self) -> Result<CoreConfig> {
        let database_path = self.database_path.ok_or_else(|| {
            Error::Config("Database path is required. Call .database_path() on the builder.".to_string())
        })?;

        let artwork_dir = self.artwork_dir.ok_or_else(|| {
            Error::Config("Artwork directory is required. Call .artwork_dir() on the builder.".to_string())
        })?;

        let config = CoreConfig {
            database_path,
            artwork_dir,
            music_dir: self.music_dir,
            sync: self.sync.unwrap_or_default(),
            remote_catalog: self.remote_catalog,
            external_artwork: self.external_artwork,
            http_client: self.http_client,
            file_system: self.file_system,
            media_index: self.media_index,
        };

        config.validate()?;
        Ok(config)
    }
}
