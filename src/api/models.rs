//! DTOs and `ApiResponse` enums for the HTTP surface. Domain types never
//! cross the wire directly; everything here is a sibling `models` module to
//! the route handlers, matching the host stack's own DTO placement.

use chrono::{DateTime, Utc};
use poem_openapi::{ApiResponse, Object};
use uuid::Uuid;

use crate::domain::{Book, Bookmark, HistoryEntry, Progress, Task, User};

#[derive(Debug, Clone, Object)]
pub struct ErrorDto {
    pub message: String,
}

impl From<String> for ErrorDto {
    fn from(message: String) -> Self {
        ErrorDto { message }
    }
}

impl From<&str> for ErrorDto {
    fn from(message: &str) -> Self {
        ErrorDto { message: message.to_string() }
    }
}

#[derive(Debug, Clone, Object)]
pub struct BookDto {
    pub book_uuid: Uuid,
    pub provider: String,
    pub provider_book_id: String,
    pub title: String,
    pub author: Option<String>,
    pub cover_path: Option<String>,
    pub abstract_text: Option<String>,
    pub status_text: Option<String>,
    pub total_chapters: i32,
    pub downloaded_chapters: i32,
    pub download_status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Book> for BookDto {
    fn from(b: Book) -> Self {
        BookDto {
            book_uuid: b.book_uuid,
            provider: b.provider,
            provider_book_id: b.provider_book_id,
            title: b.title,
            author: b.author,
            cover_path: b.cover_path,
            abstract_text: b.abstract_text,
            status_text: b.status_text,
            total_chapters: b.total_chapters,
            downloaded_chapters: b.downloaded_chapters,
            download_status: b.download_status,
            created_at: b.created_at,
            updated_at: b.updated_at,
        }
    }
}

#[derive(Debug, Clone, Object)]
pub struct SearchResultDto {
    pub provider_book_id: String,
    pub title: String,
    pub author: Option<String>,
    pub cover_url: Option<String>,
    pub abstract_text: Option<String>,
    pub word_count: Option<i64>,
    pub status_text: Option<String>,
}

#[derive(Debug, Clone, Object)]
pub struct SearchResponseBody {
    pub books: Vec<SearchResultDto>,
    pub total: Option<u64>,
    pub page: u32,
    pub audio_mode: Option<bool>,
}

#[derive(ApiResponse)]
pub enum SearchResponse {
    #[oai(status = 200)]
    Ok(poem_openapi::payload::Json<SearchResponseBody>),
    #[oai(status = 502)]
    BadGateway(poem_openapi::payload::Json<ErrorDto>),
}

#[derive(Debug, Clone, Object)]
pub struct AddBookResponseBody {
    pub success: bool,
    pub message: String,
    pub book: Option<BookDto>,
}

#[derive(ApiResponse)]
pub enum AddBookResponse {
    #[oai(status = 200)]
    Ok(poem_openapi::payload::Json<AddBookResponseBody>),
    #[oai(status = 409)]
    Conflict(poem_openapi::payload::Json<AddBookResponseBody>),
    #[oai(status = 502)]
    BadGateway(poem_openapi::payload::Json<ErrorDto>),
}

#[derive(Debug, Clone, Object)]
pub struct PagedBooksDto {
    pub books: Vec<BookDto>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
}

#[derive(ApiResponse)]
pub enum BookListResponse {
    #[oai(status = 200)]
    Ok(poem_openapi::payload::Json<PagedBooksDto>),
}

#[derive(ApiResponse)]
pub enum BookDetailResponse {
    #[oai(status = 200)]
    Ok(poem_openapi::payload::Json<BookDto>),
    #[oai(status = 404)]
    NotFound(poem_openapi::payload::Json<ErrorDto>),
}

#[derive(ApiResponse)]
pub enum EmptyResponse {
    #[oai(status = 200)]
    Ok,
    #[oai(status = 404)]
    NotFound(poem_openapi::payload::Json<ErrorDto>),
}

#[derive(Debug, Clone, Object)]
pub struct ChapterBucketDto {
    pub start_index: i32,
    pub end_index: i32,
    pub completed: i64,
}

#[derive(Debug, Clone, Object)]
pub struct ChapterSummaryDto {
    pub total: u64,
    pub buckets: Vec<ChapterBucketDto>,
}

#[derive(ApiResponse)]
pub enum ChapterSummaryResponse {
    #[oai(status = 200)]
    Ok(poem_openapi::payload::Json<ChapterSummaryDto>),
    #[oai(status = 404)]
    NotFound(poem_openapi::payload::Json<ErrorDto>),
}

#[derive(Debug, Clone, Object)]
pub struct TaskDto {
    pub task_uuid: Uuid,
    pub book_uuid: Uuid,
    pub task_type: String,
    pub status: String,
    pub total: i32,
    pub downloaded: i32,
    pub failed: i32,
    pub progress: f64,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<Task> for TaskDto {
    fn from(t: Task) -> Self {
        TaskDto {
            task_uuid: t.task_uuid,
            book_uuid: t.book_uuid,
            task_type: t.task_type.clone(),
            status: t.status.clone(),
            total: t.total,
            downloaded: t.downloaded,
            failed: t.failed,
            progress: t.progress_percent(),
            error_message: t.error_message.clone(),
            created_at: t.created_at,
            started_at: t.started_at,
            completed_at: t.completed_at,
        }
    }
}

#[derive(ApiResponse)]
pub enum TaskResponse {
    #[oai(status = 200)]
    Ok(poem_openapi::payload::Json<TaskDto>),
    #[oai(status = 404)]
    NotFound(poem_openapi::payload::Json<ErrorDto>),
    #[oai(status = 409)]
    Conflict(poem_openapi::payload::Json<ErrorDto>),
    #[oai(status = 429)]
    QuotaExhausted(poem_openapi::payload::Json<ErrorDto>),
}

#[derive(ApiResponse)]
pub enum TaskListResponse {
    #[oai(status = 200)]
    Ok(poem_openapi::payload::Json<Vec<TaskDto>>),
}

#[derive(Debug, Clone, Object)]
pub struct QuotaDto {
    pub provider: String,
    pub downloaded: i64,
    pub limit: i64,
    pub remaining: i64,
    pub percentage: f64,
}

#[derive(ApiResponse)]
pub enum QuotaResponse {
    #[oai(status = 200)]
    Ok(poem_openapi::payload::Json<Vec<QuotaDto>>),
}

#[derive(Debug, Clone, Object)]
pub struct TocChapterDto {
    pub chapter_uuid: Uuid,
    pub chapter_index: i32,
    pub title: String,
    pub volume_name: Option<String>,
    pub word_count: i32,
    pub download_status: String,
}

#[derive(Debug, Clone, Object)]
pub struct TocPageDto {
    pub chapters: Vec<TocChapterDto>,
    pub page: u64,
    pub limit: u64,
    pub total: u64,
}

#[derive(ApiResponse)]
pub enum TocResponse {
    #[oai(status = 200)]
    Ok(poem_openapi::payload::Json<TocPageDto>),
    #[oai(status = 404)]
    NotFound(poem_openapi::payload::Json<ErrorDto>),
}

#[derive(Debug, Clone, Object)]
pub struct ChapterContentDto {
    pub chapter_uuid: Uuid,
    pub chapter_index: i32,
    pub title: String,
    pub word_count: i32,
    pub updated_at: DateTime<Utc>,
    pub prev_id: Option<Uuid>,
    pub next_id: Option<Uuid>,
    pub status: String,
    pub body: Option<String>,
    pub message: Option<String>,
}

#[derive(ApiResponse)]
pub enum ChapterContentResponse {
    #[oai(status = 200)]
    Ready(poem_openapi::payload::Json<ChapterContentDto>),
    #[oai(status = 202)]
    Fetching(poem_openapi::payload::Json<ChapterContentDto>),
    #[oai(status = 404)]
    NotFound(poem_openapi::payload::Json<ErrorDto>),
}

#[derive(Debug, Clone, Object)]
pub struct ProgressDto {
    pub chapter_uuid: Uuid,
    pub device_id: String,
    pub offset_px: i32,
    pub percent: f64,
    pub updated_at: DateTime<Utc>,
}

impl From<Progress> for ProgressDto {
    fn from(p: Progress) -> Self {
        ProgressDto {
            chapter_uuid: p.chapter_uuid,
            device_id: p.device_id,
            offset_px: p.offset_px,
            percent: p.percent,
            updated_at: p.updated_at,
        }
    }
}

#[derive(ApiResponse)]
pub enum ProgressResponse {
    #[oai(status = 200)]
    Ok(poem_openapi::payload::Json<ProgressDto>),
    #[oai(status = 204)]
    NoContent,
}

#[derive(Debug, Clone, Object)]
pub struct BookmarkDto {
    pub bookmark_uuid: Uuid,
    pub chapter_uuid: Uuid,
    pub percent: f64,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Bookmark> for BookmarkDto {
    fn from(b: Bookmark) -> Self {
        BookmarkDto {
            bookmark_uuid: b.bookmark_uuid,
            chapter_uuid: b.chapter_uuid,
            percent: b.percent,
            note: b.note,
            created_at: b.created_at,
        }
    }
}

#[derive(ApiResponse)]
pub enum BookmarkListResponse {
    #[oai(status = 200)]
    Ok(poem_openapi::payload::Json<Vec<BookmarkDto>>),
}

#[derive(ApiResponse)]
pub enum BookmarkResponse {
    #[oai(status = 200)]
    Ok(poem_openapi::payload::Json<BookmarkDto>),
    #[oai(status = 500)]
    InternalError(poem_openapi::payload::Json<ErrorDto>),
}

#[derive(Debug, Clone, Object)]
pub struct HistoryEntryDto {
    pub chapter_uuid: Uuid,
    pub percent: f64,
    pub device_id: String,
    pub created_at: DateTime<Utc>,
}

impl From<HistoryEntry> for HistoryEntryDto {
    fn from(h: HistoryEntry) -> Self {
        HistoryEntryDto {
            chapter_uuid: h.chapter_uuid,
            percent: h.percent,
            device_id: h.device_id,
            created_at: h.created_at,
        }
    }
}

#[derive(ApiResponse)]
pub enum HistoryListResponse {
    #[oai(status = 200)]
    Ok(poem_openapi::payload::Json<Vec<HistoryEntryDto>>),
}

#[derive(Debug, Clone, Object)]
pub struct CacheStatusDto {
    pub completed_chapter_uuids: Vec<Uuid>,
    pub as_of: DateTime<Utc>,
}

#[derive(ApiResponse)]
pub enum CacheStatusResponse {
    #[oai(status = 200)]
    Ok(poem_openapi::payload::Json<CacheStatusDto>),
}

#[derive(Debug, Clone, Object)]
pub struct ArtifactStatusDto {
    pub status: String,
    pub message: Option<String>,
}

#[derive(ApiResponse)]
pub enum ArtifactStatusResponse {
    #[oai(status = 200)]
    Ready(poem_openapi::payload::Json<ArtifactStatusDto>),
    #[oai(status = 202)]
    Pending(poem_openapi::payload::Json<ArtifactStatusDto>),
}

#[derive(ApiResponse)]
pub enum ArtifactDownloadResponse {
    #[oai(status = 200)]
    Ok(poem_openapi::payload::Binary<Vec<u8>>),
    #[oai(status = 202)]
    Pending(poem_openapi::payload::Json<ArtifactStatusDto>),
    #[oai(status = 404)]
    NotFound(poem_openapi::payload::Json<ErrorDto>),
}

#[derive(Debug, Clone, Object)]
pub struct UserDto {
    pub user_uuid: Uuid,
    pub username: String,
    pub display_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserDto {
    fn from(u: User) -> Self {
        UserDto {
            user_uuid: u.user_uuid,
            username: u.username,
            display_name: u.display_name,
            created_at: u.created_at,
        }
    }
}

#[derive(Debug, Clone, Object)]
pub struct CreateUserRequest {
    pub username: String,
    pub display_name: Option<String>,
}

#[derive(ApiResponse)]
pub enum UserListResponse {
    #[oai(status = 200)]
    Ok(poem_openapi::payload::Json<Vec<UserDto>>),
}

#[derive(ApiResponse)]
pub enum UserCreateResponse {
    #[oai(status = 201)]
    Created(poem_openapi::payload::Json<UserDto>),
}

#[derive(Debug, Clone, Object)]
pub struct LoginRequest {
    pub password: String,
}

#[derive(Debug, Clone, Object)]
pub struct AuthStatusDto {
    pub authenticated: bool,
    pub auth_required: bool,
}

#[derive(ApiResponse)]
pub enum LoginResponse {
    #[oai(status = 200)]
    Ok(poem_openapi::payload::Json<AuthStatusDto>),
    #[oai(status = 401)]
    Unauthorized(poem_openapi::payload::Json<ErrorDto>),
}

#[derive(ApiResponse)]
pub enum AuthStatusResponse {
    #[oai(status = 200)]
    Ok(poem_openapi::payload::Json<AuthStatusDto>),
}

#[derive(Debug, Clone, Object)]
pub struct HealthDto {
    pub status: String,
    pub version: String,
}

#[derive(ApiResponse)]
pub enum HealthResponse {
    #[oai(status = 200)]
    Ok(poem_openapi::payload::Json<HealthDto>),
}
