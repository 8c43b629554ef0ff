//! Cover art embedded in the local file that introduced an album

use super::ArtworkProvider;
use crate::artwork::{ArtworkRequest, ArtworkTarget};
use crate::error::Result;
use crate::extractor::MetadataExtractor;
use async_trait::async_trait;
use bytes::Bytes;
use std::path::Path;
use std::sync::Arc;

/// Re-reads the track with the larger artwork chunk and returns its picture.
pub struct EmbeddedArtworkProvider {
    extractor: Arc<MetadataExtractor>,
}

impl EmbeddedArtworkProvider {
    pub fn new(extractor: Arc<MetadataExtractor>) -> Self {
        Self { extractor }
    }
}

#[async_trait]
impl ArtworkProvider for EmbeddedArtworkProvider {
    fn name(&self) -> &'static str {
        "embedded"
    }

    fn supports(&self, request: &ArtworkRequest) -> bool {
        request.target == ArtworkTarget::Album && !request.is_remote
    }

    async fn fetch(&self, request: &ArtworkRequest) -> Result<Option<Bytes>> {
        let metadata = self
            .extractor
            .try_extract(Path::new(&request.locator), true)
            .await?;

        Ok(metadata.artwork.map(|art| art.data))
    }
}
