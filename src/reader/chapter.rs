//! On-demand chapter fetch: read from the blob store, fall back to the
//! engine's single-chapter retry path on a cache miss, and opportunistically
//! prefetch a bounded run of subsequent chapters.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashSet;
use sea_orm::DatabaseConnection;
use uuid::Uuid;

use crate::catalog;
use crate::domain::Chapter;
use crate::engine::DownloadEngine;
use crate::error::{CatalogError, EngineError};
use crate::html::to_paragraphs;
use crate::storage::BlobStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChapterFormat {
    Html,
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeDir {
    Prev,
    Next,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChapterReadStatus {
    Ready,
    Fetching,
}

pub struct ChapterView {
    pub chapter_uuid: Uuid,
    pub chapter_index: i32,
    pub title: String,
    pub word_count: i32,
    pub updated_at: DateTime<Utc>,
    pub prev_id: Option<Uuid>,
    pub next_id: Option<Uuid>,
    pub status: ChapterReadStatus,
    pub body: Option<String>,
    pub message: Option<String>,
}

const RETRY_ATTEMPTS: u32 = 3;
const MAX_PREFETCH: u32 = 5;

/// Prefetch in-flight dedup key: one entry per `(book_uuid, chapter_uuid)`
/// currently being fetched. Cleared on every exit path from the prefetch loop.
pub type PrefetchInflight = DashSet<(Uuid, Uuid)>;

pub async fn get_chapter_content(
    db: &DatabaseConnection,
    store: &BlobStore,
    engine: &Arc<DownloadEngine>,
    inflight: &Arc<PrefetchInflight>,
    book_uuid: Uuid,
    chapter_uuid: Uuid,
    format: ChapterFormat,
    range_dir: Option<RangeDir>,
    prefetch: u32,
) -> Result<ChapterView, CatalogError> {
    let anchor = catalog::chapter::get(db, chapter_uuid).await?;
    let target = match range_dir {
        None => anchor,
        Some(RangeDir::Prev) => catalog::chapter::get_by_index(db, book_uuid, anchor.chapter_index - 1)
            .await?
            .ok_or(CatalogError::ChapterNotFound(chapter_uuid))?,
        Some(RangeDir::Next) => catalog::chapter::get_by_index(db, book_uuid, anchor.chapter_index + 1)
            .await?
            .ok_or(CatalogError::ChapterNotFound(chapter_uuid))?,
    };

    let mut body = read_body(store, &target).await;
    let mut message = None;
    if body.is_none() {
        match engine.download_chapter_with_retry(book_uuid, target.chapter_uuid, RETRY_ATTEMPTS).await {
            Ok(()) => {
                let refreshed = catalog::chapter::get(db, target.chapter_uuid).await?;
                body = read_body(store, &refreshed).await;
            }
            Err(EngineError::QuotaExhausted(provider, remaining)) => {
                message = Some(format!("每日字数配额已用尽 ({provider}, 剩余 {remaining} 字)"));
            }
            Err(e) => {
                message = Some(e.to_string());
            }
        }
    }

    let prev = if target.chapter_index > 0 {
        catalog::chapter::get_by_index(db, book_uuid, target.chapter_index - 1).await?
    } else {
        None
    };
    let next = catalog::chapter::get_by_index(db, book_uuid, target.chapter_index + 1).await?;

    let status = if body.is_some() {
        ChapterReadStatus::Ready
    } else {
        ChapterReadStatus::Fetching
    };
    let rendered = body.as_deref().map(|b| match format {
        ChapterFormat::Text => b.to_string(),
        ChapterFormat::Html => to_paragraphs(b),
    });

    if matches!(status, ChapterReadStatus::Ready) && prefetch > 0 {
        spawn_prefetch(
            db.clone(),
            Arc::clone(engine),
            Arc::clone(inflight),
            book_uuid,
            target.chapter_index,
            prefetch,
        );
    }

    Ok(ChapterView {
        chapter_uuid: target.chapter_uuid,
        chapter_index: target.chapter_index,
        title: target.title,
        word_count: target.word_count,
        updated_at: target.updated_at,
        prev_id: prev.map(|c| c.chapter_uuid),
        next_id: next.map(|c| c.chapter_uuid),
        status,
        body: rendered,
        message,
    })
}

async fn read_body(store: &BlobStore, chapter: &Chapter) -> Option<String> {
    if chapter.download_status != "completed" {
        return None;
    }
    let content_ref = chapter.content_ref.as_deref()?;
    store.read_chapter(content_ref).await.ok().flatten()
}

/// Walks forward from `from_index`, skipping chapters already completed or
/// already in flight, downloading up to `count` (capped at 5). Stops at the
/// first failure or quota exhaustion; each chapter's in-flight entry is
/// cleared on every exit path.
fn spawn_prefetch(
    db: DatabaseConnection,
    engine: Arc<DownloadEngine>,
    inflight: Arc<PrefetchInflight>,
    book_uuid: Uuid,
    from_index: i32,
    count: u32,
) {
    let count = count.min(MAX_PREFETCH) as i32;
    tokio::spawn(async move {
        for offset in 1..=count {
            let Ok(Some(chapter)) = catalog::chapter::get_by_index(&db, book_uuid, from_index + offset).await else {
                break;
            };
            if chapter.download_status == "completed" {
                continue;
            }
            let key = (book_uuid, chapter.chapter_uuid);
            if !inflight.insert(key) {
                continue;
            }
            let result = engine.download_chapter_with_retry(book_uuid, chapter.chapter_uuid, RETRY_ATTEMPTS).await;
            inflight.remove(&key);
            if result.is_err() {
                break;
            }
        }
    });
}
