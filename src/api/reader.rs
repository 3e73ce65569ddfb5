//! Table of contents, on-demand chapter content, and cross-device reader
//! sync (progress/bookmarks/history). All reader-sync endpoints are scoped
//! by an explicit `user_uuid` query parameter rather than a derived session
//! identity, matching the schema's per-user rows.

use std::sync::Arc;

use poem_openapi::param::{Path, Query};
use poem_openapi::OpenApi;
use uuid::Uuid;

use crate::api::models::{
    BookmarkDto, BookmarkListResponse, BookmarkResponse, CacheStatusDto, CacheStatusResponse,
    ChapterContentDto, ChapterContentResponse, EmptyResponse, ErrorDto, HistoryEntryDto,
    HistoryListResponse, ProgressDto, ProgressResponse, TocChapterDto, TocPageDto, TocResponse,
};
use crate::api::AppState;
use crate::reader::{ChapterFormat, ChapterReadStatus, RangeDir};

pub struct ReaderApi {
    pub state: Arc<AppState>,
}

#[OpenApi]
impl ReaderApi {
    #[oai(path = "/api/books/:book_uuid/toc", method = "get")]
    async fn toc(
        &self,
        book_uuid: Path<Uuid>,
        Query(page): Query<Option<u64>>,
        Query(limit): Query<Option<u64>>,
        Query(anchor_chapter_uuid): Query<Option<Uuid>>,
    ) -> TocResponse {
        match self
            .state
            .reader
            .get_toc(book_uuid.0, page.unwrap_or(1), limit.unwrap_or(50), anchor_chapter_uuid)
            .await
        {
            Ok(page) => TocResponse::Ok(poem_openapi::payload::Json(TocPageDto {
                chapters: page
                    .chapters
                    .into_iter()
                    .map(|c| TocChapterDto {
                        chapter_uuid: c.chapter_uuid,
                        chapter_index: c.chapter_index,
                        title: c.title,
                        volume_name: c.volume_name,
                        word_count: c.word_count,
                        download_status: c.download_status,
                    })
                    .collect(),
                page: page.page,
                limit: page.limit,
                total: page.total,
            })),
            Err(_) => TocResponse::NotFound(poem_openapi::payload::Json(ErrorDto::from("book not found"))),
        }
    }

    #[oai(path = "/api/books/:book_uuid/chapters/:chapter_uuid/content", method = "get")]
    async fn chapter_content(
        &self,
        book_uuid: Path<Uuid>,
        chapter_uuid: Path<Uuid>,
        Query(format): Query<Option<String>>,
        Query(range_dir): Query<Option<String>>,
        Query(prefetch): Query<Option<u32>>,
    ) -> ChapterContentResponse {
        let format = match format.as_deref() {
            Some("text") => ChapterFormat::Text,
            _ => ChapterFormat::Html,
        };
        let range_dir = match range_dir.as_deref() {
            Some("prev") => Some(RangeDir::Prev),
            Some("next") => Some(RangeDir::Next),
            _ => None,
        };
        match self
            .state
            .reader
            .get_chapter_content(book_uuid.0, chapter_uuid.0, format, range_dir, prefetch.unwrap_or(0))
            .await
        {
            Ok(view) => {
                let ready = matches!(view.status, ChapterReadStatus::Ready);
                let dto = ChapterContentDto {
                    chapter_uuid: view.chapter_uuid,
                    chapter_index: view.chapter_index,
                    title: view.title,
                    word_count: view.word_count,
                    updated_at: view.updated_at,
                    prev_id: view.prev_id,
                    next_id: view.next_id,
                    status: if ready { "ready".to_string() } else { "fetching".to_string() },
                    body: view.body,
                    message: view.message,
                };
                if ready {
                    ChapterContentResponse::Ready(poem_openapi::payload::Json(dto))
                } else {
                    ChapterContentResponse::Fetching(poem_openapi::payload::Json(dto))
                }
            }
            Err(_) => ChapterContentResponse::NotFound(poem_openapi::payload::Json(ErrorDto::from("chapter not found"))),
        }
    }

    #[oai(path = "/api/books/:book_uuid/reader/progress", method = "get")]
    async fn get_progress(&self, book_uuid: Path<Uuid>, Query(user_uuid): Query<Uuid>) -> ProgressResponse {
        match self.state.reader.get_progress(user_uuid, book_uuid.0).await {
            Ok(Some(p)) => ProgressResponse::Ok(poem_openapi::payload::Json(ProgressDto::from(p))),
            _ => ProgressResponse::NoContent,
        }
    }

    #[oai(path = "/api/books/:book_uuid/reader/progress", method = "post")]
    async fn upsert_progress(
        &self,
        book_uuid: Path<Uuid>,
        Query(user_uuid): Query<Uuid>,
        Query(chapter_uuid): Query<Uuid>,
        Query(device_id): Query<String>,
        Query(offset_px): Query<Option<i32>>,
        Query(percent): Query<Option<f64>>,
    ) -> ProgressResponse {
        match self
            .state
            .reader
            .upsert_progress(user_uuid, book_uuid.0, chapter_uuid, &device_id, offset_px.unwrap_or(0), percent.unwrap_or(0.0))
            .await
        {
            Ok(p) => ProgressResponse::Ok(poem_openapi::payload::Json(ProgressDto::from(p))),
            Err(_) => ProgressResponse::NoContent,
        }
    }

    #[oai(path = "/api/books/:book_uuid/reader/progress", method = "delete")]
    async fn clear_progress(&self, book_uuid: Path<Uuid>, Query(user_uuid): Query<Uuid>) -> EmptyResponse {
        let _ = self.state.reader.clear_progress(user_uuid, book_uuid.0).await;
        EmptyResponse::Ok
    }

    /// Cross-device progress only tracks a single current pointer per user,
    /// so "devices" surfaces that one row rather than one entry per device.
    #[oai(path = "/api/books/:book_uuid/reader/progress/devices", method = "get")]
    async fn progress_devices(&self, book_uuid: Path<Uuid>, Query(user_uuid): Query<Uuid>) -> BookmarkListResponse {
        let devices = match self.state.reader.get_progress(user_uuid, book_uuid.0).await {
            Ok(Some(p)) => vec![BookmarkDto {
                bookmark_uuid: p.id,
                chapter_uuid: p.chapter_uuid,
                percent: p.percent,
                note: Some(p.device_id),
                created_at: p.updated_at,
            }],
            _ => Vec::new(),
        };
        BookmarkListResponse::Ok(poem_openapi::payload::Json(devices))
    }

    #[oai(path = "/api/books/:book_uuid/reader/bookmarks", method = "get")]
    async fn list_bookmarks(&self, book_uuid: Path<Uuid>, Query(user_uuid): Query<Uuid>) -> BookmarkListResponse {
        let bookmarks = self
            .state
            .reader
            .list_bookmarks(user_uuid, book_uuid.0)
            .await
            .unwrap_or_default();
        BookmarkListResponse::Ok(poem_openapi::payload::Json(bookmarks.into_iter().map(BookmarkDto::from).collect()))
    }

    #[oai(path = "/api/books/:book_uuid/reader/bookmarks", method = "post")]
    async fn add_bookmark(
        &self,
        book_uuid: Path<Uuid>,
        Query(user_uuid): Query<Uuid>,
        Query(chapter_uuid): Query<Uuid>,
        Query(percent): Query<Option<f64>>,
        Query(note): Query<Option<String>>,
    ) -> BookmarkResponse {
        match self
            .state
            .reader
            .add_bookmark(user_uuid, book_uuid.0, chapter_uuid, percent.unwrap_or(0.0), note)
            .await
        {
            Ok(bookmark) => BookmarkResponse::Ok(poem_openapi::payload::Json(BookmarkDto::from(bookmark))),
            Err(e) => BookmarkResponse::InternalError(poem_openapi::payload::Json(ErrorDto::from(e.to_string()))),
        }
    }

    #[oai(path = "/api/books/:book_uuid/reader/bookmarks/:bookmark_uuid", method = "delete")]
    async fn delete_bookmark(&self, book_uuid: Path<Uuid>, bookmark_uuid: Path<Uuid>) -> EmptyResponse {
        let _ = book_uuid;
        let _ = self.state.reader.delete_bookmark(bookmark_uuid.0).await;
        EmptyResponse::Ok
    }

    #[oai(path = "/api/books/:book_uuid/reader/history", method = "get")]
    async fn list_history(&self, book_uuid: Path<Uuid>, Query(user_uuid): Query<Uuid>) -> HistoryListResponse {
        let history = self
            .state
            .reader
            .list_history(user_uuid, book_uuid.0)
            .await
            .unwrap_or_default();
        HistoryListResponse::Ok(poem_openapi::payload::Json(history.into_iter().map(HistoryEntryDto::from).collect()))
    }

    #[oai(path = "/api/books/:book_uuid/reader/history", method = "delete")]
    async fn clear_history(&self, book_uuid: Path<Uuid>, Query(user_uuid): Query<Uuid>) -> EmptyResponse {
        let _ = self.state.reader.clear_history(user_uuid, book_uuid.0).await;
        EmptyResponse::Ok
    }

    #[oai(path = "/api/books/:book_uuid/cache/status", method = "get")]
    async fn cache_status(&self, book_uuid: Path<Uuid>) -> CacheStatusResponse {
        let status = self.state.reader.cache_status(book_uuid.0).await.unwrap_or_else(|_| crate::reader::CacheStatus {
            completed_chapter_uuids: Vec::new(),
            as_of: chrono::Utc::now(),
        });
        CacheStatusResponse::Ok(poem_openapi::payload::Json(CacheStatusDto {
            completed_chapter_uuids: status.completed_chapter_uuids,
            as_of: status.as_of,
        }))
    }
}
