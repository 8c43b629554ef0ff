//! Per-track artwork served by the remote catalog

use super::ArtworkProvider;
use crate::artwork::{ArtworkRequest, ArtworkTarget};
use crate::error::Result;
use async_trait::async_trait;
use bridge_traits::http::{HttpClient, HttpRequest};
use bytes::Bytes;
use core_runtime::config::RemoteCatalogConfig;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Downloads `GET {api}tracks/{id}/artwork` for remote albums.
pub struct CatalogArtworkProvider {
    http_client: Arc<dyn HttpClient>,
    api_base: String,
}

impl CatalogArtworkProvider {
    pub fn new(http_client: Arc<dyn HttpClient>, catalog: &RemoteCatalogConfig) -> Self {
        Self {
            http_client,
            api_base: catalog.api_base(),
        }
    }

    pub fn artwork_url(&self, track_id: &str) -> String {
        format!("{}tracks/{}/artwork", self.api_base, track_id)
    }
}

#[async_trait]
impl ArtworkProvider for CatalogArtworkProvider {
    fn name(&self) -> &'static str {
        "catalog"
    }

    fn supports(&self, request: &ArtworkRequest) -> bool {
        request.target == ArtworkTarget::Album && request.is_remote
    }

    async fn fetch(&self, request: &ArtworkRequest) -> Result<Option<Bytes>> {
        let url = self.artwork_url(&request.track_id);
        let response = self
            .http_client
            .execute(HttpRequest::get(&url).timeout(REQUEST_TIMEOUT))
            .await?;

        if response.status >= 300 || response.body.is_empty() {
            debug!(status = response.status, track_id = %request.track_id, "Catalog has no artwork");
            return Ok(None);
        }

        Ok(Some(response.body))
    }
}
