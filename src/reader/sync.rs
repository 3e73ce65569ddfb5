//! Catalog-vs-upstream chapter diffing, shared by the download engine's
//! `update` task type and the reader's manual "check for new chapters" call.

use std::sync::Arc;

use sea_orm::DatabaseConnection;
use uuid::Uuid;

use crate::catalog;
use crate::error::{CatalogError, EngineError};
use crate::source_client::{ChapterListItem, SourceClient};

/// Upstream chapters whose index is past the book's current max. Read-only.
pub async fn check_new_chapters(
    db: &DatabaseConnection,
    client: &Arc<dyn SourceClient>,
    book_uuid: Uuid,
    provider_book_id: &str,
) -> Result<Vec<ChapterListItem>, EngineError> {
    let toc = client.get_chapter_list(provider_book_id).await?;
    let max = catalog::chapter::max_index(db, book_uuid).await?;
    let fresh = toc
        .chapters
        .into_iter()
        .filter(|c| max.map(|m| c.chapter_index > m).unwrap_or(true))
        .collect();
    Ok(fresh)
}

/// Materializes `items` as `pending` chapter rows and bumps `book.total_chapters`.
pub async fn add_new_chapters(
    db: &DatabaseConnection,
    book_uuid: Uuid,
    items: Vec<ChapterListItem>,
) -> Result<usize, CatalogError> {
    if items.is_empty() {
        return Ok(0);
    }
    let count = items.len();
    let news = items
        .into_iter()
        .map(|c| catalog::chapter::NewChapter {
            item_id: c.item_id,
            chapter_index: c.chapter_index,
            title: c.title,
            volume_name: c.volume_name,
            word_count: c.word_count,
        })
        .collect();
    catalog::chapter::bulk_create(db, book_uuid, news).await?;
    if let Some(max) = catalog::chapter::max_index(db, book_uuid).await? {
        catalog::book::set_total_chapters(db, book_uuid, max + 1).await?;
    }
    Ok(count)
}
