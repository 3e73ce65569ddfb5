//! Book catalog endpoints: search upstream, add/list/inspect/delete locally
//! tracked books, and the heatmap-style chapter summary used by the UI.

use std::sync::Arc;

use poem_openapi::param::{Path, Query};
use poem_openapi::OpenApi;
use uuid::Uuid;

use crate::api::models::{
    AddBookResponse, AddBookResponseBody, BookDetailResponse, BookDto, BookListResponse,
    ChapterBucketDto, ChapterSummaryDto, ChapterSummaryResponse, EmptyResponse, ErrorDto,
    PagedBooksDto, SearchResponse, SearchResponseBody, SearchResultDto,
};
use crate::api::AppState;
use crate::catalog::{self, book::BookFilter, book::NewBook};

pub struct BooksApi {
    pub state: Arc<AppState>,
}

impl BooksApi {
    fn client_for(&self, platform: &str) -> Option<Arc<dyn crate::source_client::SourceClient>> {
        self.state.clients.get(platform).cloned()
    }
}

#[OpenApi]
impl BooksApi {
    #[oai(path = "/api/books/search", method = "get")]
    async fn search(
        &self,
        Query(q): Query<String>,
        Query(platform): Query<String>,
        Query(page): Query<Option<u32>>,
    ) -> SearchResponse {
        let Some(client) = self.client_for(&platform) else {
            return SearchResponse::BadGateway(poem_openapi::payload::Json(ErrorDto::from(format!(
                "unknown platform {platform}"
            ))));
        };
        match client.search(&q, page.unwrap_or(1)).await {
            Ok(result) => SearchResponse::Ok(poem_openapi::payload::Json(SearchResponseBody {
                books: result
                    .books
                    .into_iter()
                    .map(|b| SearchResultDto {
                        provider_book_id: b.provider_book_id,
                        title: b.title,
                        author: b.author,
                        cover_url: b.cover_url,
                        abstract_text: b.abstract_text,
                        word_count: b.word_count,
                        status_text: b.status_text,
                    })
                    .collect(),
                total: result.total,
                page: page.unwrap_or(1),
                audio_mode: None,
            })),
            Err(e) => SearchResponse::BadGateway(poem_openapi::payload::Json(ErrorDto::from(e.to_string()))),
        }
    }

    #[oai(path = "/api/books/add/:platform/:provider_book_id", method = "post")]
    async fn add(&self, platform: Path<String>, provider_book_id: Path<String>) -> AddBookResponse {
        let Some(client) = self.client_for(&platform.0) else {
            return AddBookResponse::BadGateway(poem_openapi::payload::Json(ErrorDto::from(format!(
                "unknown platform {}",
                platform.0
            ))));
        };

        let detail = match client.get_book_detail(&provider_book_id.0).await {
            Ok(d) => d,
            Err(e) => return AddBookResponse::BadGateway(poem_openapi::payload::Json(ErrorDto::from(e.to_string()))),
        };
        let chapter_list = match client.get_chapter_list(&provider_book_id.0).await {
            Ok(c) => c,
            Err(e) => return AddBookResponse::BadGateway(poem_openapi::payload::Json(ErrorDto::from(e.to_string()))),
        };

        let book = match catalog::book::create(
            &self.state.db,
            NewBook {
                provider: platform.0.clone(),
                provider_book_id: provider_book_id.0.clone(),
                title: detail.title,
                author: detail.author,
                abstract_text: detail.abstract_text,
                status_text: detail.status_text,
                total_chapters: chapter_list.total_chapters,
            },
        )
        .await
        {
            Ok(b) => b,
            Err(crate::error::CatalogError::DuplicateBook { provider, provider_book_id }) => {
                return AddBookResponse::Conflict(poem_openapi::payload::Json(AddBookResponseBody {
                    success: false,
                    message: format!("book already tracked: {provider}/{provider_book_id}"),
                    book: None,
                }));
            }
            Err(e) => return AddBookResponse::BadGateway(poem_openapi::payload::Json(ErrorDto::from(e.to_string()))),
        };

        let new_chapters = chapter_list
            .chapters
            .into_iter()
            .map(|c| catalog::chapter::NewChapter {
                item_id: c.item_id,
                chapter_index: c.chapter_index,
                title: c.title,
                volume_name: c.volume_name,
                word_count: c.word_count,
            })
            .collect();
        if let Err(e) = catalog::chapter::bulk_create(&self.state.db, book.book_uuid, new_chapters).await {
            return AddBookResponse::BadGateway(poem_openapi::payload::Json(ErrorDto::from(e.to_string())));
        }

        if let Some(cover_url) = &detail.cover_url {
            self.fetch_and_store_cover(book.book_uuid, cover_url).await;
        }

        AddBookResponse::Ok(poem_openapi::payload::Json(AddBookResponseBody {
            success: true,
            message: "book added".to_string(),
            book: Some(BookDto::from(book)),
        }))
    }

    #[oai(path = "/api/books", method = "get")]
    async fn list(
        &self,
        Query(platform): Query<Option<String>>,
        Query(status): Query<Option<String>>,
        Query(search): Query<Option<String>>,
        Query(page): Query<Option<u64>>,
        Query(limit): Query<Option<u64>>,
    ) -> BookListResponse {
        let (books, total) = catalog::book::list(
            &self.state.db,
            BookFilter { provider: platform, status, search },
            page.unwrap_or(1),
            limit.unwrap_or(20),
        )
        .await
        .unwrap_or_default();
        BookListResponse::Ok(poem_openapi::payload::Json(PagedBooksDto {
            books: books.into_iter().map(BookDto::from).collect(),
            total,
            page: page.unwrap_or(1),
            limit: limit.unwrap_or(20),
        }))
    }

    #[oai(path = "/api/books/:book_uuid", method = "get")]
    async fn detail(&self, book_uuid: Path<Uuid>) -> BookDetailResponse {
        match catalog::book::get(&self.state.db, book_uuid.0).await {
            Ok(book) => BookDetailResponse::Ok(poem_openapi::payload::Json(BookDto::from(book))),
            Err(_) => BookDetailResponse::NotFound(poem_openapi::payload::Json(ErrorDto::from("book not found"))),
        }
    }

    #[oai(path = "/api/books/:book_uuid/status", method = "get")]
    async fn status(&self, book_uuid: Path<Uuid>) -> BookDetailResponse {
        self.detail(book_uuid).await
    }

    #[oai(path = "/api/books/:book_uuid/chapters/summary", method = "get")]
    async fn chapters_summary(&self, book_uuid: Path<Uuid>, Query(segment_size): Query<Option<u64>>) -> ChapterSummaryResponse {
        if catalog::book::get(&self.state.db, book_uuid.0).await.is_err() {
            return ChapterSummaryResponse::NotFound(poem_openapi::payload::Json(ErrorDto::from("book not found")));
        }
        let buckets = catalog::chapter::status_buckets(&self.state.db, book_uuid.0, segment_size.unwrap_or(50))
            .await
            .unwrap_or_default();
        let total = buckets.iter().map(|(_, _, c)| *c as u64).sum();
        ChapterSummaryResponse::Ok(poem_openapi::payload::Json(ChapterSummaryDto {
            total,
            buckets: buckets
                .into_iter()
                .map(|(start, end, completed)| ChapterBucketDto {
                    start_index: start,
                    end_index: end,
                    completed,
                })
                .collect(),
        }))
    }

    #[oai(path = "/api/books/:book_uuid", method = "delete")]
    async fn delete(&self, book_uuid: Path<Uuid>, Query(delete_files): Query<Option<bool>>) -> EmptyResponse {
        if catalog::book::delete(&self.state.db, book_uuid.0).await.is_err() {
            return EmptyResponse::NotFound(poem_openapi::payload::Json(ErrorDto::from("book not found")));
        }
        if delete_files.unwrap_or(false) {
            let _ = self.state.store.delete_book(book_uuid.0).await;
        }
        EmptyResponse::Ok
    }

    #[oai(path = "/api/books/:book_uuid/refresh", method = "post")]
    async fn refresh(&self, book_uuid: Path<Uuid>) -> EmptyResponse {
        let Ok(book) = catalog::book::get(&self.state.db, book_uuid.0).await else {
            return EmptyResponse::NotFound(poem_openapi::payload::Json(ErrorDto::from("book not found")));
        };
        let Some(client) = self.client_for(&book.provider) else {
            return EmptyResponse::NotFound(poem_openapi::payload::Json(ErrorDto::from("unknown platform")));
        };
        if let Ok(fresh) = self
            .state
            .reader
            .check_new_chapters(&client, book.book_uuid, &book.provider_book_id)
            .await
        {
            let _ = self.state.reader.add_new_chapters(book.book_uuid, fresh).await;
        }
        EmptyResponse::Ok
    }

    #[oai(path = "/api/books/:book_uuid/new-chapters", method = "get")]
    async fn new_chapters(&self, book_uuid: Path<Uuid>) -> ChapterSummaryResponse {
        let Ok(book) = catalog::book::get(&self.state.db, book_uuid.0).await else {
            return ChapterSummaryResponse::NotFound(poem_openapi::payload::Json(ErrorDto::from("book not found")));
        };
        let Some(client) = self.client_for(&book.provider) else {
            return ChapterSummaryResponse::NotFound(poem_openapi::payload::Json(ErrorDto::from("unknown platform")));
        };
        let fresh = self
            .state
            .reader
            .check_new_chapters(&client, book.book_uuid, &book.provider_book_id)
            .await
            .unwrap_or_default();
        ChapterSummaryResponse::Ok(poem_openapi::payload::Json(ChapterSummaryDto {
            total: fresh.len() as u64,
            buckets: Vec::new(),
        }))
    }
}

impl BooksApi {
    async fn fetch_and_store_cover(&self, book_uuid: Uuid, cover_url: &str) {
        let Ok(resp) = reqwest::get(cover_url).await else { return };
        let Ok(bytes) = resp.bytes().await else { return };
        if let Ok(relative) = self.state.store.write_cover(book_uuid, &bytes).await {
            let _ = catalog::book::set_cover_path(&self.state.db, book_uuid, &relative).await;
        }
    }
}
