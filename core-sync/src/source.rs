//! # Source Providers
//!
//! Paginated enumeration of raw media items. A sync run asks a provider for
//! its total once, then pulls pages until the provider reports the last one.

use crate::Result;
use async_trait::async_trait;
use bridge_traits::media::MediaAsset;
use core_library::models::Track;
use std::fmt;

/// Where the items of a run come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    Local,
    Remote,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Local => "local",
            SourceKind::Remote => "remote",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One raw item from a source
#[derive(Debug, Clone, PartialEq)]
pub enum SourceItem {
    /// Device asset; tags still have to be read from the file
    Local(MediaAsset),
    /// Catalog track with its locator already pointing at the stream endpoint
    Remote(Track),
    /// An item the source could not use; it still counts as processed
    Skipped { reason: String },
}

/// One page of items
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourcePage {
    pub items: Vec<SourceItem>,
    /// Cursor for the next `fetch_page` call
    pub next_cursor: Option<String>,
    pub is_last: bool,
}

#[async_trait]
pub trait SourceProvider: Send + Sync {
    fn kind(&self) -> SourceKind;

    /// Items requested per page
    fn page_size(&self) -> usize;

    /// Check that the source is reachable before anything is cleared.
    ///
    /// # Errors
    ///
    /// `SyncError::NetworkFailure` when the source cannot be reached.
    async fn precheck(&self) -> Result<()> {
        Ok(())
    }

    /// Total number of items the source currently holds
    async fn count(&self) -> Result<u64>;

    /// Fetch the page following `cursor` (`None` for the first page)
    async fn fetch_page(&self, cursor: Option<String>) -> Result<SourcePage>;
}
