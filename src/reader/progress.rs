//! Thin wrapper over the cross-device reading-progress repository.

use sea_orm::DatabaseConnection;
use uuid::Uuid;

use crate::catalog::reader_data;
use crate::domain::Progress;
use crate::error::CatalogError;

pub async fn get_progress(db: &DatabaseConnection, user_uuid: Uuid, book_uuid: Uuid) -> Result<Option<Progress>, CatalogError> {
    reader_data::get_progress(db, user_uuid, book_uuid).await
}

pub async fn upsert_progress(
    db: &DatabaseConnection,
    user_uuid: Uuid,
    book_uuid: Uuid,
    chapter_uuid: Uuid,
    device_id: &str,
    offset_px: i32,
    percent: f64,
) -> Result<Progress, CatalogError> {
    reader_data::upsert_progress(db, user_uuid, book_uuid, chapter_uuid, device_id, offset_px, percent).await
}

pub async fn clear_progress(db: &DatabaseConnection, user_uuid: Uuid, book_uuid: Uuid) -> Result<(), CatalogError> {
    reader_data::clear_progress(db, user_uuid, book_uuid).await
}
