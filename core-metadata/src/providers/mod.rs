//! Artwork providers
//!
//! Each provider knows one place artwork can come from. The chain in
//! [`crate::artwork`] decides the order; a provider only says whether it
//! applies to a request and, if so, returns image bytes.

pub mod catalog;
pub mod embedded;
pub mod spotify;

pub use catalog::CatalogArtworkProvider;
pub use embedded::EmbeddedArtworkProvider;
pub use spotify::{SpotifyArtworkProvider, SpotifyClient};

use crate::artwork::ArtworkRequest;
use crate::error::Result;
use async_trait::async_trait;
use bytes::Bytes;

#[async_trait]
pub trait ArtworkProvider: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Whether this provider can answer `request` at all
    fn supports(&self, request: &ArtworkRequest) -> bool;

    /// Fetch image bytes; `Ok(None)` means the provider had nothing.
    async fn fetch(&self, request: &ArtworkRequest) -> Result<Option<Bytes>>;
}
