//! Reader Service: table of contents, on-demand chapter fetch with prefetch,
//! cross-device progress sync, bookmarks, history, and artifact cache status.

pub mod bookmark;
pub mod cache_status;
pub mod chapter;
pub mod history;
pub mod progress;
pub mod sync;
pub mod toc;

use std::sync::Arc;

use sea_orm::DatabaseConnection;
use uuid::Uuid;

use crate::artifacts::{ArtifactKind, ArtifactManager, ArtifactRequest};
use crate::domain::{Bookmark, HistoryEntry, Progress};
use crate::engine::DownloadEngine;
use crate::error::{CatalogError, EngineError};
use crate::source_client::{ChapterListItem, SourceClient};
use crate::storage::BlobStore;

pub use chapter::{ChapterFormat, ChapterReadStatus, ChapterView, PrefetchInflight, RangeDir};
pub use cache_status::CacheStatus;
pub use toc::TocPage;

/// Bundles the shared dependencies of every reader operation and owns the
/// process-wide prefetch in-flight set (§4.7/§5).
pub struct ReaderService {
    db: DatabaseConnection,
    store: BlobStore,
    engine: Arc<DownloadEngine>,
    artifacts: Arc<ArtifactManager>,
    prefetch_inflight: Arc<PrefetchInflight>,
}

impl ReaderService {
    pub fn new(db: DatabaseConnection, store: BlobStore, engine: Arc<DownloadEngine>, artifacts: Arc<ArtifactManager>) -> Self {
        ReaderService {
            db,
            store,
            engine,
            artifacts,
            prefetch_inflight: Arc::new(Default::default()),
        }
    }

    pub async fn get_toc(&self, book_uuid: Uuid, page: u64, limit: u64, anchor_chapter_uuid: Option<Uuid>) -> Result<TocPage, CatalogError> {
        toc::get_toc(&self.db, book_uuid, page, limit, anchor_chapter_uuid).await
    }

    pub async fn get_chapter_content(
        &self,
        book_uuid: Uuid,
        chapter_uuid: Uuid,
        format: ChapterFormat,
        range_dir: Option<RangeDir>,
        prefetch: u32,
    ) -> Result<ChapterView, CatalogError> {
        chapter::get_chapter_content(
            &self.db,
            &self.store,
            &self.engine,
            &self.prefetch_inflight,
            book_uuid,
            chapter_uuid,
            format,
            range_dir,
            prefetch,
        )
        .await
    }

    pub async fn check_new_chapters(
        &self,
        client: &Arc<dyn SourceClient>,
        book_uuid: Uuid,
        provider_book_id: &str,
    ) -> Result<Vec<ChapterListItem>, EngineError> {
        sync::check_new_chapters(&self.db, client, book_uuid, provider_book_id).await
    }

    pub async fn add_new_chapters(&self, book_uuid: Uuid, items: Vec<ChapterListItem>) -> Result<usize, CatalogError> {
        sync::add_new_chapters(&self.db, book_uuid, items).await
    }

    pub async fn get_progress(&self, user_uuid: Uuid, book_uuid: Uuid) -> Result<Option<Progress>, CatalogError> {
        progress::get_progress(&self.db, user_uuid, book_uuid).await
    }

    pub async fn upsert_progress(
        &self,
        user_uuid: Uuid,
        book_uuid: Uuid,
        chapter_uuid: Uuid,
        device_id: &str,
        offset_px: i32,
        percent: f64,
    ) -> Result<Progress, CatalogError> {
        progress::upsert_progress(&self.db, user_uuid, book_uuid, chapter_uuid, device_id, offset_px, percent).await
    }

    pub async fn clear_progress(&self, user_uuid: Uuid, book_uuid: Uuid) -> Result<(), CatalogError> {
        progress::clear_progress(&self.db, user_uuid, book_uuid).await
    }

    pub async fn list_bookmarks(&self, user_uuid: Uuid, book_uuid: Uuid) -> Result<Vec<Bookmark>, CatalogError> {
        bookmark::list_bookmarks(&self.db, user_uuid, book_uuid).await
    }

    pub async fn add_bookmark(
        &self,
        user_uuid: Uuid,
        book_uuid: Uuid,
        chapter_uuid: Uuid,
        percent: f64,
        note: Option<String>,
    ) -> Result<Bookmark, CatalogError> {
        bookmark::add_bookmark(&self.db, user_uuid, book_uuid, chapter_uuid, percent, note).await
    }

    pub async fn delete_bookmark(&self, bookmark_uuid: Uuid) -> Result<(), CatalogError> {
        bookmark::delete_bookmark(&self.db, bookmark_uuid).await
    }

    pub async fn list_history(&self, user_uuid: Uuid, book_uuid: Uuid) -> Result<Vec<HistoryEntry>, CatalogError> {
        history::list_history(&self.db, user_uuid, book_uuid).await
    }

    pub async fn clear_history(&self, user_uuid: Uuid, book_uuid: Uuid) -> Result<(), CatalogError> {
        history::clear_history(&self.db, user_uuid, book_uuid).await
    }

    pub async fn cache_status(&self, book_uuid: Uuid) -> Result<CacheStatus, CatalogError> {
        cache_status::cache_status(&self.db, book_uuid).await
    }

    /// Returns the artifact path if already current, else kicks off a
    /// background rebuild; the facade translates `Pending`/`Failed` to HTTP 202.
    pub async fn ensure_artifact_cached(&self, book_uuid: Uuid, kind: ArtifactKind) -> Result<ArtifactRequest, crate::error::ArtifactError> {
        self.artifacts.ensure_cached(book_uuid, kind).await
    }
}
