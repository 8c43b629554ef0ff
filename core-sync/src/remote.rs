//! Remote catalog source
//!
//! Talks to the catalog service API under `{server}muziko/api/`:
//!
//! - `GET health`: reachability precheck with a short timeout
//! - `GET tracks?offset=0&take=-1`: total count in `_meta.stats.count`
//! - `GET tracks?offset={n}&take={page}`: one page of tracks in `data`
//! - `GET tracks/{id}/stream`: playable locator written into each track

use crate::source::{SourceItem, SourceKind, SourcePage, SourceProvider};
use crate::{Result, SyncError};
use async_trait::async_trait;
use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
use core_library::models::{Track, TrackId};
use core_runtime::config::RemoteCatalogConfig;
use core_runtime::logging::redact_url;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

const PAGE_TIMEOUT: Duration = Duration::from_secs(60);

// =============================================================================
// Wire types
// =============================================================================

/// Response envelope of the catalog API
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    #[serde(rename = "_status")]
    pub status: Option<String>,
    #[serde(rename = "_meta")]
    pub meta: Option<ApiMeta>,
    pub data: Option<T>,
}

#[derive(Debug, Deserialize)]
pub struct ApiMeta {
    pub stats: Option<ApiStats>,
}

#[derive(Debug, Deserialize)]
pub struct ApiStats {
    pub count: Option<u64>,
    pub limit: Option<i64>,
    pub offset: Option<u64>,
}

/// Catalog ids arrive as strings or integers
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RemoteId {
    Text(String),
    Number(i64),
}

impl RemoteId {
    fn into_string(self) -> String {
        match self {
            RemoteId::Text(id) => id,
            RemoteId::Number(id) => id.to_string(),
        }
    }
}

/// Track as served by the catalog
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteTrack {
    pub id: RemoteId,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album_artist: Option<String>,
    pub album: Option<String>,
    pub genre: Option<String>,
    pub date: Option<String>,
    pub track_no: Option<i64>,
    pub disk_no: Option<i64>,
    pub year: Option<i64>,
    pub duration: Option<f64>,
    pub filename: Option<String>,
    pub creation_time: Option<i64>,
    pub modification_time: Option<i64>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// =============================================================================
// Source
// =============================================================================

/// Tracks from the remote catalog, paged by offset
pub struct RemoteSource {
    http_client: Arc<dyn HttpClient>,
    api_base: String,
    page_size: usize,
    health_timeout: Duration,
}

impl RemoteSource {
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        catalog: &RemoteCatalogConfig,
        page_size: usize,
        health_timeout: Duration,
    ) -> Self {
        Self {
            http_client,
            api_base: catalog.api_base(),
            page_size: page_size.max(1),
            health_timeout,
        }
    }

    pub fn stream_url(&self, track_id: &str) -> String {
        format!("{}tracks/{}/stream", self.api_base, track_id)
    }

    fn tracks_url(&self, offset: u64, take: i64) -> String {
        format!("{}tracks?offset={}&take={}", self.api_base, offset, take)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<ApiResponse<T>> {
        let response = self
            .http_client
            .execute(HttpRequest::get(url).timeout(PAGE_TIMEOUT))
            .await?;
        Self::parse(url, response)
    }

    fn parse<T: DeserializeOwned>(url: &str, response: HttpResponse) -> Result<ApiResponse<T>> {
        if !response.is_success() {
            return Err(SyncError::Source(format!(
                "GET {} returned HTTP {}",
                redact_url(url),
                response.status
            )));
        }

        serde_json::from_slice(&response.body)
            .map_err(|e| SyncError::InvalidResponse(format!("{}: {}", redact_url(url), e)))
    }

    /// Convert a catalog track, or explain why it is unusable
    pub fn to_track(&self, remote: RemoteTrack) -> SourceItem {
        let id = remote.id.into_string();
        let Some(title) = non_empty(remote.title) else {
            return SourceItem::Skipped {
                reason: format!("remote track {} has no title", id),
            };
        };

        let url = self.stream_url(&id);
        let mut track = Track::new(title.clone(), url, remote.filename.unwrap_or(title));
        track.id = TrackId::from(id);
        track.artist = non_empty(remote.artist);
        track.album_artist = non_empty(remote.album_artist);
        track.album = non_empty(remote.album);
        track.genre = non_empty(remote.genre);
        track.year = remote.year;
        track.date = non_empty(remote.date).or_else(|| remote.year.map(|y| y.to_string()));
        track.track_no = remote.track_no;
        track.disk_no = remote.disk_no;
        track.duration = remote
            .duration
            .filter(|d| d.is_finite() && *d > 0.0)
            .unwrap_or(0.0);
        track.creation_time = remote.creation_time;
        track.modification_time = remote.modification_time;
        track.is_remote = true;

        SourceItem::Remote(track)
    }

    /// Decode one raw page element. A malformed element skips only itself.
    pub fn decode_item(&self, value: serde_json::Value) -> SourceItem {
        match serde_json::from_value::<RemoteTrack>(value) {
            Ok(remote) => self.to_track(remote),
            Err(e) => {
                debug!(error = %e, "Skipping malformed remote track");
                SourceItem::Skipped {
                    reason: format!("malformed remote track: {}", e),
                }
            }
        }
    }
}

#[async_trait]
impl SourceProvider for RemoteSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Remote
    }

    fn page_size(&self) -> usize {
        self.page_size
    }

    async fn precheck(&self) -> Result<()> {
        let url = format!("{}health", self.api_base);
        let request = HttpRequest::get(&url).timeout(self.health_timeout);

        match self.http_client.execute(request).await {
            Ok(response) if response.is_success() => Ok(()),
            Ok(response) => {
                warn!(status = response.status, url = %redact_url(&url), "Catalog health check failed");
                Err(SyncError::NetworkFailure {
                    reason: format!("HTTP {}", response.status),
                })
            }
            Err(e) => {
                warn!(error = %e, url = %redact_url(&url), "Catalog unreachable");
                Err(SyncError::NetworkFailure {
                    reason: e.to_string(),
                })
            }
        }
    }

    async fn count(&self) -> Result<u64> {
        let envelope: ApiResponse<serde::de::IgnoredAny> =
            self.get_json(&self.tracks_url(0, -1)).await?;

        let count = envelope
            .meta
            .and_then(|meta| meta.stats)
            .and_then(|stats| stats.count)
            .unwrap_or(0);

        debug!(count, "Counted remote tracks");
        Ok(count)
    }

    async fn fetch_page(&self, cursor: Option<String>) -> Result<SourcePage> {
        let offset = match cursor {
            Some(cursor) => cursor
                .parse::<u64>()
                .map_err(|_| SyncError::Source(format!("Invalid page cursor: {}", cursor)))?,
            None => 0,
        };

        let envelope: ApiResponse<Vec<serde_json::Value>> = self
            .get_json(&self.tracks_url(offset, self.page_size as i64))
            .await?;
        let raw = envelope.data.unwrap_or_default();
        let fetched = raw.len();

        debug!(offset, fetched, "Fetched remote page");
        Ok(SourcePage {
            items: raw.into_iter().map(|value| self.decode_item(value)).collect(),
            next_cursor: Some((offset + fetched as u64).to_string()),
            is_last: fetched < self.page_size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Answers every request with the same body, or fails when there is none
    struct StaticHttp(Option<&'static [u8]>);

    #[async_trait]
    impl HttpClient for StaticHttp {
        async fn execute(&self, _request: HttpRequest) -> bridge_traits::error::Result<HttpResponse> {
            match self.0 {
                Some(body) => Ok(HttpResponse::new(200, body.to_vec())),
                None => Err(bridge_traits::BridgeError::NotAvailable("http".to_string())),
            }
        }
    }

    fn source_with(body: Option<&'static [u8]>, page_size: usize) -> RemoteSource {
        RemoteSource::new(
            Arc::new(StaticHttp(body)),
            &RemoteCatalogConfig::new("https://catalog.test"),
            page_size,
            Duration::from_millis(20),
        )
    }

    fn source() -> RemoteSource {
        source_with(None, 1000)
    }

    #[test]
    fn test_envelope_parsing() {
        let body = br#"{
            "_status": "ok",
            "_meta": { "stats": { "count": 2500, "limit": -1, "offset": 0 } },
            "data": [ { "id": 7, "title": "Song", "artist": "Bob", "trackNo": 3, "duration": 201.5 } ]
        }"#;

        let parsed: ApiResponse<Vec<RemoteTrack>> = serde_json::from_slice(body).unwrap();
        assert_eq!(parsed.meta.unwrap().stats.unwrap().count, Some(2500));
        let track = &parsed.data.unwrap()[0];
        assert_eq!(track.track_no, Some(3));
        assert!(matches!(track.id, RemoteId::Number(7)));
    }

    #[test]
    fn test_to_track_rewrites_locator() {
        let remote: RemoteTrack = serde_json::from_str(
            r#"{ "id": "abc", "title": "Song", "artist": "Bob", "album": "X", "year": 2001 }"#,
        )
        .unwrap();

        match source().to_track(remote) {
            SourceItem::Remote(track) => {
                assert_eq!(track.id.as_str(), "abc");
                assert_eq!(track.url, "https://catalog.test/muziko/api/tracks/abc/stream");
                assert!(track.is_remote);
                assert_eq!(track.date.as_deref(), Some("2001"));
                assert_eq!(track.filename, "Song");
            }
            other => panic!("unexpected item: {:?}", other),
        }
    }

    #[test]
    fn test_untitled_track_is_skipped() {
        let remote: RemoteTrack = serde_json::from_str(r#"{ "id": 1, "title": "  " }"#).unwrap();
        assert!(matches!(source().to_track(remote), SourceItem::Skipped { .. }));
    }

    #[tokio::test]
    async fn test_malformed_item_skips_only_itself() {
        let body: &'static [u8] = br#"{
            "data": [
                { "id": 1, "title": "Good", "artist": "Bob", "duration": 10.0 },
                { "id": 2, "title": "No length", "duration": null },
                { "id": 3, "title": "Bad number", "trackNo": "three" },
                { "title": "No id" }
            ]
        }"#;
        let page = source_with(Some(body), 4).fetch_page(None).await.unwrap();

        assert_eq!(page.items.len(), 4);
        assert_eq!(page.next_cursor.as_deref(), Some("4"));
        assert!(matches!(&page.items[0], SourceItem::Remote(t) if t.duration == 10.0));
        assert!(matches!(&page.items[1], SourceItem::Remote(t) if t.duration == 0.0));
        assert!(matches!(&page.items[2], SourceItem::Skipped { .. }));
        assert!(matches!(&page.items[3], SourceItem::Skipped { .. }));
    }
}
