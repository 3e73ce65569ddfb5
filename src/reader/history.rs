//! Thin wrapper over the reading-history repository.

use sea_orm::DatabaseConnection;
use uuid::Uuid;

use crate::catalog::reader_data;
use crate::domain::HistoryEntry;
use crate::error::CatalogError;

pub async fn list_history(db: &DatabaseConnection, user_uuid: Uuid, book_uuid: Uuid) -> Result<Vec<HistoryEntry>, CatalogError> {
    reader_data::list_history(db, user_uuid, book_uuid).await
}

pub async fn clear_history(db: &DatabaseConnection, user_uuid: Uuid, book_uuid: Uuid) -> Result<(), CatalogError> {
    reader_data::clear_history(db, user_uuid, book_uuid).await
}
