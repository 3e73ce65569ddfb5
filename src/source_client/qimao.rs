use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::SourceError;

use super::{
    http_client, with_retry, BookDetail, ChapterContent, ChapterList, ChapterListItem,
    SearchResult, SearchResultItem, SourceClient,
};

/// qimao's chapter-content endpoint needs the owning book id alongside the
/// chapter id; `begin_book` seeds it once per client instance before the
/// first chapter fetch.
pub struct QimaoClient {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
    retry_times: u32,
    current_book_id: RwLock<Option<String>>,
}

impl QimaoClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration, retry_times: u32) -> Self {
        QimaoClient {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: None,
            client: http_client(timeout),
            retry_times,
            current_book_id: RwLock::new(None),
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
    data: Vec<SearchItem>,
}

#[derive(Deserialize)]
struct SearchItem {
    book_id: String,
    title: String,
    author: Option<String>,
    cover: Option<String>,
    intro: Option<String>,
    status: Option<String>,
}

#[derive(Deserialize)]
struct DetailResponse {
    title: String,
    author: Option<String>,
    cover: Option<String>,
    intro: Option<String>,
    status: Option<String>,
    last_chapter_name: Option<String>,
}

#[derive(Deserialize)]
struct CatalogResponse {
    chapter_list: Vec<CatalogItem>,
}

#[derive(Deserialize)]
struct CatalogItem {
    chapter_id: String,
    title: String,
    #[serde(default)]
    word_count: i32,
}

#[derive(Deserialize)]
struct ContentResponse {
    content: Option<String>,
    word_count: Option<i32>,
}

#[async_trait]
impl SourceClient for QimaoClient {
    fn provider_name(&self) -> &'static str {
        "qimao"
    }

    async fn begin_book(&self, provider_book_id: &str) -> Result<(), SourceError> {
        let mut guard = self
            .current_book_id
            .write()
            .expect("qimao client book-id lock is never poisoned");
        *guard = Some(provider_book_id.to_string());
        Ok(())
    }

    async fn search(&self, keyword: &str, page: u32) -> Result<SearchResult, SourceError> {
        with_retry(self.retry_times, || async {
            let path = format!("/search?keyword={}&page={}", keyword, page);
            let resp: SearchResponse = self.get_json(&path).await?;
            Ok(SearchResult {
                books: resp
                    .data
                    .into_iter()
                    .map(|i| SearchResultItem {
                        provider_book_id: i.book_id,
                        title: i.title,
                        author: i.author,
                        cover_url: i.cover,
                        abstract_text: i.intro,
                        word_count: None,
                        status_text: i.status,
                    })
                    .collect(),
                total: None,
            })
        })
        .await
    }

    async fn get_book_detail(&self, provider_book_id: &str) -> Result<BookDetail, SourceError> {
        with_retry(self.retry_times, || async {
            let path = format!("/book/{}/detail", provider_book_id);
            let resp: DetailResponse = self.get_json(&path).await?;
            Ok(BookDetail {
                title: resp.title,
                author: resp.author,
                cover_url: resp.cover,
                abstract_text: resp.intro,
                status_text: resp.status,
                last_chapter_title: resp.last_chapter_name,
            })
        })
        .await
    }

    async fn get_chapter_list(&self, provider_book_id: &str) -> Result<ChapterList, SourceError> {
        with_retry(self.retry_times, || async {
            let path = format!("/book/{}/catalog", provider_book_id);
            let resp: CatalogResponse = self.get_json(&path).await?;
            let chapters: Vec<ChapterListItem> = resp
                .chapter_list
                .into_iter()
                .enumerate()
                .map(|(idx, c)| ChapterListItem {
                    item_id: c.chapter_id,
                    title: c.title,
                    volume_name: None,
                    chapter_index: idx as i32,
                    word_count: c.word_count,
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
        let book_id = self
            .current_book_id
            .read()
            .expect("qimao client book-id lock is never poisoned")
            .clone()
            .ok_or_else(|| {
                SourceError::InvalidResponse(
                    "begin_book must be called before fetching chapter content".into(),
                )
            })?;

        with_retry(self.retry_times, || async {
            let path = format!("/book/{}/chapter/{}/content", book_id, item_id);
            let resp: ContentResponse = self.get_json(&path).await?;
            let content = resp.content.ok_or(SourceError::ChapterNotFound)?;
            let word_count = resp.word_count.unwrap_or(content.chars().count() as i32);
            Ok(ChapterContent::Text { content, word_count })
        })
        .await
    }
}
