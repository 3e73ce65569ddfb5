use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder,
};
use uuid::Uuid;

use crate::domain::Book;
use crate::error::CatalogError;

pub(crate) fn to_domain(m: entities::book::Model) -> Book {
    Book {
        book_uuid: m.book_uuid,
        provider: m.provider,
        provider_book_id: m.provider_book_id,
        title: m.title,
        author: m.author,
        cover_path: m.cover_path,
        abstract_text: m.abstract_text,
        status_text: m.status_text,
        total_chapters: m.total_chapters,
        downloaded_chapters: m.downloaded_chapters,
        download_status: m.download_status,
        created_at: m.created_at,
        updated_at: m.updated_at,
    }
}

pub struct NewBook {
    pub provider: String,
    pub provider_book_id: String,
    pub title: String,
    pub author: Option<String>,
    pub abstract_text: Option<String>,
    pub status_text: Option<String>,
    pub total_chapters: i32,
}

pub async fn create(db: &DatabaseConnection, new: NewBook) -> Result<Book, CatalogError> {
    let existing = entities::book::Entity::find()
        .filter(entities::book::Column::Provider.eq(&new.provider))
        .filter(entities::book::Column::ProviderBookId.eq(&new.provider_book_id))
        .one(db)
        .await?;
    if existing.is_some() {
        return Err(CatalogError::DuplicateBook {
            provider: new.provider,
            provider_book_id: new.provider_book_id,
        });
    }

    let now = Utc::now();
    let active = entities::book::ActiveModel {
        book_uuid: Set(Uuid::new_v4()),
        provider: Set(new.provider),
        provider_book_id: Set(new.provider_book_id),
        title: Set(new.title),
        author: Set(new.author),
        cover_path: Set(None),
        abstract_text: Set(new.abstract_text),
        status_text: Set(new.status_text),
        total_chapters: Set(new.total_chapters),
        downloaded_chapters: Set(0),
        download_status: Set("pending".to_string()),
        created_at: Set(now),
        updated_at: Set(now),
    };
    let model = active.insert(db).await?;
    Ok(to_domain(model))
}

pub async fn get(db: &DatabaseConnection, book_uuid: Uuid) -> Result<Book, CatalogError> {
    entities::book::Entity::find_by_id(book_uuid)
        .one(db)
        .await?
        .map(to_domain)
        .ok_or(CatalogError::BookNotFound(book_uuid))
}

pub struct BookFilter {
    pub provider: Option<String>,
    pub status: Option<String>,
    pub search: Option<String>,
}

pub async fn list(
    db: &DatabaseConnection,
    filter: BookFilter,
    page: u64,
    limit: u64,
) -> Result<(Vec<Book>, u64), DbErr> {
    let mut query = entities::book::Entity::find().order_by_desc(entities::book::Column::CreatedAt);
    if let Some(provider) = filter.provider {
        query = query.filter(entities::book::Column::Provider.eq(provider));
    }
    if let Some(status) = filter.status {
        query = query.filter(entities::book::Column::DownloadStatus.eq(status));
    }
    if let Some(search) = filter.search {
        query = query.filter(entities::book::Column::Title.contains(&search));
    }

    let paginator = query.paginate(db, limit.max(1));
    let total = paginator.num_items().await?;
    let page_index = page.saturating_sub(1);
    let rows = paginator.fetch_page(page_index).await?;
    Ok((rows.into_iter().map(to_domain).collect(), total))
}

pub async fn delete(db: &DatabaseConnection, book_uuid: Uuid) -> Result<(), CatalogError> {
    let res = entities::book::Entity::delete_by_id(book_uuid).exec(db).await?;
    if res.rows_affected == 0 {
        return Err(CatalogError::BookNotFound(book_uuid));
    }
    Ok(())
}

pub async fn set_download_status(
    db: &DatabaseConnection,
    book_uuid: Uuid,
    status: &str,
) -> Result<(), CatalogError> {
    let model = entities::book::Entity::find_by_id(book_uuid)
        .one(db)
        .await?
        .ok_or(CatalogError::BookNotFound(book_uuid))?;
    let mut active: entities::book::ActiveModel = model.into();
    active.download_status = Set(status.to_string());
    active.updated_at = Set(Utc::now());
    active.update(db).await?;
    Ok(())
}

pub async fn set_total_chapters(
    db: &DatabaseConnection,
    book_uuid: Uuid,
    total: i32,
) -> Result<(), CatalogError> {
    let model = entities::book::Entity::find_by_id(book_uuid)
        .one(db)
        .await?
        .ok_or(CatalogError::BookNotFound(book_uuid))?;
    let mut active: entities::book::ActiveModel = model.into();
    active.total_chapters = Set(total);
    active.updated_at = Set(Utc::now());
    active.update(db).await?;
    Ok(())
}

/// Recomputes `downloaded_chapters` from the chapter table. Called after any
/// committed chapter-status transition so the counter never drifts.
pub async fn recompute_downloaded_chapters(
    db: &DatabaseConnection,
    book_uuid: Uuid,
) -> Result<i32, CatalogError> {
    let completed = entities::chapter::Entity::find()
        .filter(entities::chapter::Column::BookUuid.eq(book_uuid))
        .filter(entities::chapter::Column::DownloadStatus.eq("completed"))
        .count(db)
        .await? as i32;

    let model = entities::book::Entity::find_by_id(book_uuid)
        .one(db)
        .await?
        .ok_or(CatalogError::BookNotFound(book_uuid))?;
    let mut active: entities::book::ActiveModel = model.into();
    active.downloaded_chapters = Set(completed);
    active.updated_at = Set(Utc::now());
    active.update(db).await?;
    Ok(completed)
}

pub async fn set_cover_path(
    db: &DatabaseConnection,
    book_uuid: Uuid,
    cover_path: &str,
) -> Result<(), CatalogError> {
    let model = entities::book::Entity::find_by_id(book_uuid)
        .one(db)
        .await?
        .ok_or(CatalogError::BookNotFound(book_uuid))?;
    let mut active: entities::book::ActiveModel = model.into();
    active.cover_path = Set(Some(cover_path.to_string()));
    active.update(db).await?;
    Ok(())
}
