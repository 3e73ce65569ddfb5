//! Paged, ordered table-of-contents view over a book's chapters.

use sea_orm::DatabaseConnection;
use uuid::Uuid;

use crate::catalog;
use crate::domain::Chapter;
use crate::error::CatalogError;

pub struct TocPage {
    pub chapters: Vec<Chapter>,
    pub page: u64,
    pub limit: u64,
    pub total: u64,
}

/// If `anchor_chapter_uuid` is given, returns the page containing it instead
/// of `page`. `limit` is clamped to `[1, 500]`.
pub async fn get_toc(
    db: &DatabaseConnection,
    book_uuid: Uuid,
    page: u64,
    limit: u64,
    anchor_chapter_uuid: Option<Uuid>,
) -> Result<TocPage, CatalogError> {
    let limit = limit.clamp(1, 500);
    let page = match anchor_chapter_uuid {
        Some(anchor) => {
            let chapter = catalog::chapter::get(db, anchor).await?;
            catalog::chapter::page_for_index(db, book_uuid, chapter.chapter_index, limit).await?
        }
        None => page.max(1),
    };
    let (chapters, total) = catalog::chapter::toc_page(db, book_uuid, page, limit).await?;
    Ok(TocPage { chapters, page, limit, total })
}
