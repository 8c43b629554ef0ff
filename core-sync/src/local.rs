//! Local device source backed by the host media index

use crate::source::{SourceItem, SourceKind, SourcePage, SourceProvider};
use crate::Result;
use async_trait::async_trait;
use bridge_traits::media::MediaIndex;
use std::sync::Arc;
use tracing::{debug, warn};

/// Audio assets from the device media index, in fixed-size pages.
///
/// Without a permission grant the source is empty.
pub struct LocalSource {
    media_index: Arc<dyn MediaIndex>,
    page_size: usize,
}

impl LocalSource {
    pub fn new(media_index: Arc<dyn MediaIndex>, page_size: usize) -> Self {
        Self {
            media_index,
            page_size: page_size.max(1),
        }
    }

    async fn permitted(&self) -> Result<bool> {
        let status = self.media_index.request_permission().await?;
        if !status.is_granted() {
            warn!(status = ?status, "Media library permission not granted");
        }
        Ok(status.is_granted())
    }
}

#[async_trait]
impl SourceProvider for LocalSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Local
    }

    fn page_size(&self) -> usize {
        self.page_size
    }

    async fn count(&self) -> Result<u64> {
        if !self.permitted().await? {
            return Ok(0);
        }

        let probe = self.media_index.audio_assets(0, None).await?;
        debug!(total = probe.total_count, "Counted local audio assets");
        Ok(probe.total_count)
    }

    async fn fetch_page(&self, cursor: Option<String>) -> Result<SourcePage> {
        if !self.permitted().await? {
            return Ok(SourcePage {
                is_last: true,
                ..SourcePage::default()
            });
        }

        let page = self.media_index.audio_assets(self.page_size, cursor).await?;
        let is_last = !page.has_next_page || page.end_cursor.is_none() || page.assets.is_empty();

        Ok(SourcePage {
            items: page.assets.into_iter().map(SourceItem::Local).collect(),
            next_cursor: page.end_cursor,
            is_last,
        })
    }
}
