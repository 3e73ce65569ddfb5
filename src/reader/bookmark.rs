//! Thin wrapper over the bookmark repository.

use sea_orm::DatabaseConnection;
use uuid::Uuid;

use crate::catalog::reader_data;
use crate::domain::Bookmark;
use crate::error::CatalogError;

pub async fn list_bookmarks(db: &DatabaseConnection, user_uuid: Uuid, book_uuid: Uuid) -> Result<Vec<Bookmark>, CatalogError> {
    reader_data::list_bookmarks(db, user_uuid, book_uuid).await
}

pub async fn add_bookmark(
    db: &DatabaseConnection,
    user_uuid: Uuid,
    book_uuid: Uuid,
    chapter_uuid: Uuid,
    percent: f64,
    note: Option<String>,
) -> Result<Bookmark, CatalogError> {
    reader_data::add_bookmark(db, user_uuid, book_uuid, chapter_uuid, percent, note).await
}

pub async fn delete_bookmark(db: &DatabaseConnection, bookmark_uuid: Uuid) -> Result<(), CatalogError> {
    reader_data::delete_bookmark(db, bookmark_uuid).await
}
