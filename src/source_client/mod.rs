//! Abstract upstream provider capability, with one `reqwest`-backed adapter
//! per provider. The download engine and reader service depend only on the
//! `SourceClient` trait.

pub mod biquge;
pub mod fanqie;
pub mod qimao;

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::SourceError;

#[derive(Debug, Clone, Deserialize)]
pub struct SearchResultItem {
    pub provider_book_id: String,
    pub title: String,
    pub author: Option<String>,
    pub cover_url: Option<String>,
    pub abstract_text: Option<String>,
    pub word_count: Option<i64>,
    pub status_text: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct SearchResult {
    pub books: Vec<SearchResultItem>,
    pub total: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct BookDetail {
    pub title: String,
    pub author: Option<String>,
    pub cover_url: Option<String>,
    pub abstract_text: Option<String>,
    pub status_text: Option<String>,
    pub last_chapter_title: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ChapterListItem {
    pub item_id: String,
    pub title: String,
    pub volume_name: Option<String>,
    pub chapter_index: i32,
    pub word_count: i32,
}

#[derive(Debug, Clone)]
pub struct ChapterList {
    pub total_chapters: i32,
    pub chapters: Vec<ChapterListItem>,
}

#[derive(Debug, Clone)]
pub enum ChapterContent {
    Text { content: String, word_count: i32 },
    /// Audio-only chapters are not supported downstream.
    Audio,
}

#[async_trait]
pub trait SourceClient: Send + Sync {
    fn provider_name(&self) -> &'static str;

    async fn search(&self, keyword: &str, page: u32) -> Result<SearchResult, SourceError>;

    async fn get_book_detail(&self, provider_book_id: &str) -> Result<BookDetail, SourceError>;

    async fn get_chapter_list(&self, provider_book_id: &str) -> Result<ChapterList, SourceError>;

    async fn get_chapter_content(&self, item_id: &str) -> Result<ChapterContent, SourceError>;

    /// Quirk hook: some providers (qimao) require a book context to be set
    /// on the client before the first `get_chapter_content` call. Adapters
    /// that don't need it use the default no-op.
    async fn begin_book(&self, _provider_book_id: &str) -> Result<(), SourceError> {
        Ok(())
    }
}

/// Shared retry policy applied uniformly by each adapter: up to `attempts`
/// tries, exponential backoff starting at 500ms, honoring an explicit
/// rate-limit `retry_after` hint when present.
pub(crate) async fn with_retry<T, F, Fut>(attempts: u32, mut op: F) -> Result<T, SourceError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, SourceError>>,
{
    let mut delay = Duration::from_millis(500);
    let mut last_err = None;
    for attempt in 0..attempts.max(1) {
        match op().await {
            Ok(v) => return Ok(v),
            Err(e) if e.is_retryable() && attempt + 1 < attempts => {
                if let SourceError::RateLimit { retry_after: Some(secs) } = &e {
                    tokio::time::sleep(Duration::from_secs(*secs)).await;
                } else {
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                }
                last_err = Some(e);
            }
            Err(e) => return Err(e),
        }
    }
    Err(last_err.expect("at least one attempt was made"))
}

pub(crate) fn http_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .expect("reqwest client builds with a valid default TLS backend")
}
