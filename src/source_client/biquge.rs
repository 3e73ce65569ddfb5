use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::SourceError;

use super::{
    http_client, with_retry, BookDetail, ChapterContent, ChapterList, ChapterListItem,
    SearchResult, SearchResultItem, SourceClient,
};

/// biquge is the unmetered provider (see the quota ledger); its client is
/// otherwise a plain reqwest adapter like the other two.
pub struct BiqugeClient {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
    retry_times: u32,
}

impl BiqugeClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration, retry_times: u32) -> Self {
        BiqugeClient {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: None,
            client: http_client(timeout),
            retry_times,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    fn url(&self, path: &str) -> String {
        let base = format!("{}{}", self.base_url, path);
        match &self.api_key {
            Some(key) => {
                let sep = if path.contains('?') { '&' } else { '?' };
                format!("{base}{sep}key={key}")
            }
            None => base,
        }
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, path: &str) -> Result<T, SourceError> {
        let resp = self
            .client
            .get(self.url(path))
            .send()
            .await
            .map_err(|e| SourceError::Network(e.to_string()))?;

        if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = resp
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok());
            return Err(SourceError::RateLimit { retry_after });
        }
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(SourceError::BookNotFound);
        }
        if !resp.status().is_success() {
            return Err(SourceError::Network(format!(
                "unexpected status {}",
                resp.status()
            )));
        }
        let body = resp.text().await.map_err(|e| SourceError::Network(e.to_string()))?;
        serde_json::from_str(&body).map_err(|e| SourceError::InvalidResponse(e.to_string()))
    }
}

#[derive(Deserialize)]
struct SearchResponse {
    results: Vec<SearchItem>,
}

#[derive(Deserialize)]
struct SearchItem {
    id: String,
    name: String,
    author: Option<String>,
    cover: Option<String>,
    summary: Option<String>,
}

#[derive(Deserialize)]
struct DetailResponse {
    name: String,
    author: Option<String>,
    cover: Option<String>,
    summary: Option<String>,
    status: Option<String>,
}

#[derive(Deserialize)]
struct CatalogResponse {
    chapters: Vec<CatalogItem>,
}

#[derive(Deserialize)]
struct CatalogItem {
    url: String,
    title: String,
}

#[derive(Deserialize)]
struct ContentResponse {
    text: Option<String>,
}

#[async_trait]
impl SourceClient for BiqugeClient {
    fn provider_name(&self) -> &'static str {
        "biquge"
    }

    async fn search(&self, keyword: &str, page: u32) -> Result<SearchResult, SourceError> {
        with_retry(self.retry_times, || async {
            let path = format!("/s?q={}&p={}", keyword, page);
            let resp: SearchResponse = self.get_json(&path).await?;
            Ok(SearchResult {
                books: resp
                    .results
                    .into_iter()
                    .map(|i| SearchResultItem {
                        provider_book_id: i.id,
                        title: i.name,
                        author: i.author,
                        cover_url: i.cover,
                        abstract_text: i.summary,
                        word_count: None,
                        status_text: None,
                    })
                    .collect(),
                total: None,
            })
        })
        .await
    }

    async fn get_book_detail(&self, provider_book_id: &str) -> Result<BookDetail, SourceError> {
        with_retry(self.retry_times, || async {
            let path = format!("/book/{}", provider_book_id);
            let resp: DetailResponse = self.get_json(&path).await?;
            Ok(BookDetail {
                title: resp.name,
                author: resp.author,
                cover_url: resp.cover,
                abstract_text: resp.summary,
                status_text: resp.status,
                last_chapter_title: None,
            })
        })
        .await
    }

    async fn get_chapter_list(&self, provider_book_id: &str) -> Result<ChapterList, SourceError> {
        with_retry(self.retry_times, || async {
            let path = format!("/book/{}/list", provider_book_id);
            let resp: CatalogResponse = self.get_json(&path).await?;
            let chapters: Vec<ChapterListItem> = resp
                .chapters
                .into_iter()
                .enumerate()
                .map(|(idx, c)| ChapterListItem {
                    item_id: c.url,
                    title: c.title,
                    volume_name: None,
                    chapter_index: idx as i32,
                    word_count: 0,
                })
                .collect();
            Ok(ChapterList {
                total_chapters: chapters.len() as i32,
                chapters,
            })
        })
        .await
    }

    async fn get_chapter_content(&self, item_id: &str) -> Result<ChapterContent, SourceError> {
        with_retry(self.retry_times, || async {
            let resp: ContentResponse = self.get_json(item_id).await?;
            let content = resp.text.ok_or(SourceError::ChapterNotFound)?;
            let word_count = content.chars().count() as i32;
            Ok(ChapterContent::Text { content, word_count })
        })
        .await
    }
}
