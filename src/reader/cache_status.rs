//! Which chapters of a book currently have a downloaded body on disk.

use chrono::{DateTime, Utc};
use sea_orm::DatabaseConnection;
use uuid::Uuid;

use crate::catalog;
use crate::error::CatalogError;

pub struct CacheStatus {
    pub completed_chapter_uuids: Vec<Uuid>,
    pub as_of: DateTime<Utc>,
}

pub async fn cache_status(db: &DatabaseConnection, book_uuid: Uuid) -> Result<CacheStatus, CatalogError> {
    let chapters = catalog::chapter::completed_ordered(db, book_uuid).await?;
    Ok(CacheStatus {
        completed_chapter_uuids: chapters.into_iter().map(|c| c.chapter_uuid).collect(),
        as_of: Utc::now(),
    })
}
