//! Spotify Web API Client
//!
//! Finds album covers and artist images by searching for the track that
//! introduced the entity.
//!
//! ## API Endpoints
//!
//! - **Token**: `POST https://accounts.spotify.com/api/token` (client credentials)
//! - **Search**: `GET /v1/search?type=track&q=artist:{artist} track:{title}`
//! - **Artist**: `GET /v1/artists/{id}`
//!
//! ## Caching
//!
//! The access token is reused until it expires. Search results are kept in a
//! small LRU keyed by artist and title, so the album and artist lookups for the
//! same track share one search request.

use super::ArtworkProvider;
use crate::artwork::{ArtworkRequest, ArtworkTarget};
use crate::error::{MetadataError, Result};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use bytes::Bytes;
use core_runtime::config::ExternalArtworkConfig;
use lru::LruCache;
use serde::Deserialize;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info};

const PROVIDER: &str = "spotify";

/// Timeout for API requests
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Tokens are refreshed this long before Spotify says they expire
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(30);

const SEARCH_CACHE_SIZE: usize = 64;

// =============================================================================
// Response types
// =============================================================================

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

#[derive(Debug, Clone, Deserialize)]
struct Image {
    url: String,
}

#[derive(Debug, Clone, Deserialize)]
struct AlbumRef {
    #[serde(default)]
    images: Vec<Image>,
}

#[derive(Debug, Clone, Deserialize)]
struct ArtistRef {
    id: String,
}

#[derive(Debug, Clone, Deserialize)]
struct TrackItem {
    album: Option<AlbumRef>,
    #[serde(default)]
    artists: Vec<ArtistRef>,
}

#[derive(Debug, Deserialize)]
struct TrackPage {
    #[serde(default)]
    items: Vec<TrackItem>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    tracks: Option<TrackPage>,
}

#[derive(Debug, Deserialize)]
struct ArtistResponse {
    #[serde(default)]
    images: Vec<Image>,
}

struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

// =============================================================================
// Client
// =============================================================================

/// Spotify Web API client authenticated with client credentials
pub struct SpotifyClient {
    http_client: Arc<dyn HttpClient>,
    config: ExternalArtworkConfig,
    token: Mutex<Option<CachedToken>>,
    searches: Mutex<LruCache<(String, String), Option<TrackItem>>>,
}

impl SpotifyClient {
    pub fn new(http_client: Arc<dyn HttpClient>, config: ExternalArtworkConfig) -> Self {
        let capacity = NonZeroUsize::new(SEARCH_CACHE_SIZE).unwrap_or(NonZeroUsize::MIN);
        Self {
            http_client,
            config,
            token: Mutex::new(None),
            searches: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// `base64(client_id:client_secret)` for the token request
    fn basic_credentials(&self) -> String {
        STANDARD.encode(format!("{}:{}", self.config.client_id, self.config.client_secret))
    }

    /// Current access token, exchanging credentials when none is cached or it expired.
    pub async fn access_token(&self) -> Result<String> {
        let mut token = self.token.lock().await;
        if let Some(cached) = token.as_ref() {
            if cached.expires_at > Instant::now() {
                return Ok(cached.access_token.clone());
            }
        }

        let request = HttpRequest::new(HttpMethod::Post, &self.config.accounts_url)
            .basic_auth(self.basic_credentials())
            .form(&[("grant_type", "client_credentials")])
            .timeout(REQUEST_TIMEOUT);

        let response = self.send(request).await?;
        let parsed: TokenResponse = serde_json::from_slice(&response.body)?;

        let lifetime = Duration::from_secs(parsed.expires_in).saturating_sub(TOKEN_EXPIRY_MARGIN);
        *token = Some(CachedToken {
            access_token: parsed.access_token.clone(),
            expires_at: Instant::now() + lifetime,
        });

        info!("Obtained Spotify access token");
        Ok(parsed.access_token)
    }

    /// Album cover URL of the first search hit
    pub async fn album_image_url(&self, artist: &str, title: &str) -> Result<Option<String>> {
        let hit = self.search_first_track(artist, title).await?;
        Ok(hit
            .and_then(|track| track.album)
            .and_then(|album| album.images.into_iter().next())
            .map(|image| image.url))
    }

    /// Image URL of the first artist credited on the first search hit
    pub async fn artist_image_url(&self, artist: &str, title: &str) -> Result<Option<String>> {
        let artist_id = match self
            .search_first_track(artist, title)
            .await?
            .and_then(|track| track.artists.into_iter().next())
        {
            Some(artist_ref) => artist_ref.id,
            None => return Ok(None),
        };

        let url = format!("{}/artists/{}", self.config.api_url, urlencoding::encode(&artist_id));
        let response = self.authorized_get(&url).await?;
        let parsed: ArtistResponse = serde_json::from_slice(&response.body)?;

        Ok(parsed.images.into_iter().next().map(|image| image.url))
    }

    /// Download an image URL returned by the API
    pub async fn download(&self, url: &str) -> Result<Bytes> {
        let response = self
            .send(HttpRequest::get(url).timeout(REQUEST_TIMEOUT))
            .await?;
        Ok(response.body)
    }

    async fn search_first_track(&self, artist: &str, title: &str) -> Result<Option<TrackItem>> {
        let key = (artist.to_string(), title.to_string());
        if let Some(cached) = self.searches.lock().await.get(&key) {
            return Ok(cached.clone());
        }

        let query = format!("artist:{} track:{}", artist, title);
        let url = format!(
            "{}/search?type=track&q={}",
            self.config.api_url,
            urlencoding::encode(&query)
        );

        let response = self.authorized_get(&url).await?;
        let parsed: SearchResponse = serde_json::from_slice(&response.body)?;
        let first = parsed.tracks.and_then(|page| page.items.into_iter().next());

        debug!(artist, title, found = first.is_some(), "Spotify track search");
        self.searches.lock().await.put(key, first.clone());
        Ok(first)
    }

    async fn authorized_get(&self, url: &str) -> Result<HttpResponse> {
        let token = self.access_token().await?;
        let request = HttpRequest::get(url)
            .bearer_token(token)
            .timeout(REQUEST_TIMEOUT);

        let response = self.http_client.execute(request).await?;
        if response.status == 401 {
            self.token.lock().await.take();
        }
        Self::check(response)
    }

    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let response = self.http_client.execute(request).await?;
        Self::check(response)
    }

    fn check(response: HttpResponse) -> Result<HttpResponse> {
        if !response.is_success() {
            return Err(MetadataError::Provider {
                provider: PROVIDER,
                message: format!("HTTP {}", response.status),
            });
        }
        Ok(response)
    }
}

// =============================================================================
// Provider
// =============================================================================

/// Album and artist artwork from Spotify search results
pub struct SpotifyArtworkProvider {
    client: Arc<SpotifyClient>,
}

impl SpotifyArtworkProvider {
    pub fn new(http_client: Arc<dyn HttpClient>, config: ExternalArtworkConfig) -> Self {
        Self::with_client(Arc::new(SpotifyClient::new(http_client, config)))
    }

    pub fn with_client(client: Arc<SpotifyClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ArtworkProvider for SpotifyArtworkProvider {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    fn supports(&self, request: &ArtworkRequest) -> bool {
        request.artist.is_some()
    }

    async fn fetch(&self, request: &ArtworkRequest) -> Result<Option<Bytes>> {
        let Some(artist) = request.artist.as_deref() else {
            return Ok(None);
        };

        let url = match request.target {
            ArtworkTarget::Album => self.client.album_image_url(artist, &request.title).await?,
            ArtworkTarget::Artist => self.client.artist_image_url(artist, &request.title).await?,
        };

        match url {
            Some(url) => Ok(Some(self.client.download(&url).await?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_response_parsing() {
        let body = br#"{
            "tracks": {
                "items": [
                    {
                        "album": { "images": [ { "url": "https://i.scdn.co/a", "height": 640 } ] },
                        "artists": [ { "id": "artist-1", "name": "Bob" } ]
                    }
                ]
            }
        }"#;

        let parsed: SearchResponse = serde_json::from_slice(body).unwrap();
        let first = parsed.tracks.unwrap().items.into_iter().next().unwrap();
        assert_eq!(first.album.unwrap().images[0].url, "https://i.scdn.co/a");
        assert_eq!(first.artists[0].id, "artist-1");
    }

    #[test]
    fn test_empty_search_response() {
        let parsed: SearchResponse = serde_json::from_slice(br#"{"tracks":{"items":[]}}"#).unwrap();
        assert!(parsed.tracks.unwrap().items.is_empty());

        let parsed: SearchResponse = serde_json::from_slice(b"{}").unwrap();
        assert!(parsed.tracks.is_none());
    }

    #[test]
    fn test_token_default_lifetime() {
        let parsed: TokenResponse = serde_json::from_slice(br#"{"access_token":"abc"}"#).unwrap();
        assert_eq!(parsed.expires_in, 3600);
    }
}
