// Seams between the collection pass and the outside world.
//
// NoticeSource wraps the bid notice API, NoticeSink the destination store.
// Tests swap both for the in-memory mocks in `testing`.

use std::collections::HashSet;

use anyhow::Result;
use async_trait::async_trait;

use bidwatch_common::{PrimaryKey, SheetRow};
use nara_client::{NaraClient, Page, SearchParams};

#[async_trait]
pub trait NoticeSource: Send + Sync {
    /// Fetch one page of notices, retries included.
    async fn fetch_page(&self, params: &SearchParams) -> nara_client::Result<Page>;
}

#[async_trait]
impl NoticeSource for NaraClient {
    async fn fetch_page(&self, params: &SearchParams) -> nara_client::Result<Page> {
        NaraClient::fetch_page(self, params).await
    }
}

#[async_trait]
pub trait NoticeSink: Send + Sync {
    /// Write the header row if the store does not start with one.
    async fn ensure_header(&self) -> Result<()>;

    /// Primary keys of the most recent `lookback` stored rows.
    async fn existing_keys(&self, lookback: usize) -> Result<HashSet<PrimaryKey>>;

    /// Append rows in order, as one batch.
    async fn append_rows(&self, rows: &[SheetRow]) -> Result<()>;

    fn name(&self) -> &str;
}
