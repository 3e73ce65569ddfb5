use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::SourceError;

use super::{
    http_client, with_retry, BookDetail, ChapterContent, ChapterList, ChapterListItem,
    SearchResult, SearchResultItem, SourceClient,
};

#[derive(Clone)]
pub struct FanqieClient {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
    retry_times: u32,
}

impl FanqieClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration, retry_times: u32) -> Self {
        FanqieClient {
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
    items: Vec<SearchItem>,
    total: Option<u64>,
}

#[derive(Deserialize)]
struct SearchItem {
    book_id: String,
    book_name: String,
    author: Option<String>,
    thumb_url: Option<String>,
    abstract_: Option<String>,
    word_count: Option<i64>,
    creation_status: Option<String>,
}

#[derive(Deserialize)]
struct DetailResponse {
    book_name: String,
    author: Option<String>,
    thumb_url: Option<String>,
    abstract_: Option<String>,
    creation_status: Option<String>,
    last_chapter_title: Option<String>,
}

#[derive(Deserialize)]
struct CatalogResponse {
    chapters: Vec<CatalogItem>,
}

#[derive(Deserialize)]
struct CatalogItem {
    item_id: String,
    title: String,
    volume_name: Option<String>,
    #[serde(default)]
    word_count: i32,
}

#[derive(Deserialize)]
struct ContentResponse {
    content: Option<String>,
    word_count: Option<i32>,
    is_audio: Option<bool>,
}

#[async_trait]
impl SourceClient for FanqieClient {
    fn provider_name(&self) -> &'static str {
        "fanqie"
    }

    async fn search(&self, keyword: &str, page: u32) -> Result<SearchResult, SourceError> {
        with_retry(self.retry_times, || async {
            let path = format!("/api/search?q={}&page={}", urlencode(keyword), page);
            let resp: SearchResponse = self.get_json(&path).await?;
            Ok(SearchResult {
                books: resp
                    .items
                    .into_iter()
                    .map(|i| SearchResultItem {
                        provider_book_id: i.book_id,
                        title: i.book_name,
                        author: i.author,
                        cover_url: i.thumb_url,
                        abstract_text: i.abstract_,
                        word_count: i.word_count,
                        status_text: i.creation_status,
                    })
                    .collect(),
                total: resp.total,
            })
        })
        .await
    }

    async fn get_book_detail(&self, provider_book_id: &str) -> Result<BookDetail, SourceError> {
        with_retry(self.retry_times, || async {
            let path = format!("/api/book/detail?book_id={}", provider_book_id);
            let resp: DetailResponse = self.get_json(&path).await?;
            Ok(BookDetail {
                title: resp.book_name,
                author: resp.author,
                cover_url: resp.thumb_url,
                abstract_text: resp.abstract_,
                status_text: resp.creation_status,
                last_chapter_title: resp.last_chapter_title,
            })
        })
        .await
    }

    async fn get_chapter_list(&self, provider_book_id: &str) -> Result<ChapterList, SourceError> {
        with_retry(self.retry_times, || async {
            let path = format!("/api/book/catalog?book_id={}", provider_book_id);
            let resp: CatalogResponse = self.get_json(&path).await?;
            let chapters: Vec<ChapterListItem> = resp
                .chapters
                .into_iter()
                .enumerate()
                .map(|(idx, c)| ChapterListItem {
                    item_id: c.item_id,
                    title: c.title,
                    volume_name: c.volume_name,
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
        with_retry(self.retry_times, || async {
            let path = format!("/api/chapter/content?item_id={}", item_id);
            let resp: ContentResponse = self.get_json(&path).await?;
            if resp.is_audio.unwrap_or(false) {
                return Ok(ChapterContent::Audio);
            }
            let content = resp.content.ok_or(SourceError::ChapterNotFound)?;
            let word_count = resp.word_count.unwrap_or(content.chars().count() as i32);
            Ok(ChapterContent::Text { content, word_count })
        })
        .await
    }
}

fn urlencode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urlencode_escapes_reserved_bytes() {
        assert_eq!(urlencode("a b"), "a%20b");
        assert_eq!(urlencode("你好"), "%E4%BD%A0%E5%A5%BD");
    }

    #[test]
    fn catalog_response_assigns_dense_zero_based_indices() {
        let json = r#"{"chapters":[{"item_id":"1","title":"a"},{"item_id":"2","title":"b"}]}"#;
        let resp: CatalogResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.chapters.len(), 2);
    }
}
