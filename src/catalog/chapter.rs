use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
};
use uuid::Uuid;

use crate::domain::Chapter;
use crate::error::CatalogError;

fn to_domain(m: entities::chapter::Model) -> Chapter {
    Chapter {
        chapter_uuid: m.chapter_uuid,
        book_uuid: m.book_uuid,
        item_id: m.item_id,
        chapter_index: m.chapter_index,
        title: m.title,
        volume_name: m.volume_name,
        word_count: m.word_count,
        download_status: m.download_status,
        content_ref: m.content_ref,
        created_at: m.created_at,
        updated_at: m.updated_at,
    }
}

pub struct NewChapter {
    pub item_id: String,
    pub chapter_index: i32,
    pub title: String,
    pub volume_name: Option<String>,
    pub word_count: i32,
}

pub async fn bulk_create(
    db: &DatabaseConnection,
    book_uuid: Uuid,
    chapters: Vec<NewChapter>,
) -> Result<usize, CatalogError> {
    if chapters.is_empty() {
        return Ok(0);
    }
    let now = Utc::now();
    let count = chapters.len();
    let models: Vec<entities::chapter::ActiveModel> = chapters
        .into_iter()
        .map(|c| entities::chapter::ActiveModel {
            chapter_uuid: Set(Uuid::new_v4()),
            book_uuid: Set(book_uuid),
            item_id: Set(c.item_id),
            chapter_index: Set(c.chapter_index),
            title: Set(c.title),
            volume_name: Set(c.volume_name),
            word_count: Set(c.word_count),
            download_status: Set("pending".to_string()),
            content_ref: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        })
        .collect();
    entities::chapter::Entity::insert_many(models).exec(db).await?;
    Ok(count)
}

pub async fn get(db: &DatabaseConnection, chapter_uuid: Uuid) -> Result<Chapter, CatalogError> {
    entities::chapter::Entity::find_by_id(chapter_uuid)
        .one(db)
        .await?
        .map(to_domain)
        .ok_or(CatalogError::ChapterNotFound(chapter_uuid))
}

pub async fn get_by_index(
    db: &DatabaseConnection,
    book_uuid: Uuid,
    index: i32,
) -> Result<Option<Chapter>, CatalogError> {
    let row = entities::chapter::Entity::find()
        .filter(entities::chapter::Column::BookUuid.eq(book_uuid))
        .filter(entities::chapter::Column::ChapterIndex.eq(index))
        .one(db)
        .await?;
    Ok(row.map(to_domain))
}

pub async fn max_index(db: &DatabaseConnection, book_uuid: Uuid) -> Result<Option<i32>, CatalogError> {
    let row = entities::chapter::Entity::find()
        .filter(entities::chapter::Column::BookUuid.eq(book_uuid))
        .order_by_desc(entities::chapter::Column::ChapterIndex)
        .one(db)
        .await?;
    Ok(row.map(|r| r.chapter_index))
}

/// Paged, ordered view of a book's chapters for the table-of-contents endpoint.
pub async fn toc_page(
    db: &DatabaseConnection,
    book_uuid: Uuid,
    page: u64,
    limit: u64,
) -> Result<(Vec<Chapter>, u64), CatalogError> {
    let limit = limit.clamp(1, 500);
    let paginator = entities::chapter::Entity::find()
        .filter(entities::chapter::Column::BookUuid.eq(book_uuid))
        .order_by_asc(entities::chapter::Column::ChapterIndex)
        .paginate(db, limit);
    let total = paginator.num_items().await?;
    let page_index = page.max(1) - 1;
    let rows = paginator.fetch_page(page_index).await?;
    Ok((rows.into_iter().map(to_domain).collect(), total))
}

/// Returns the 1-based page number containing `chapter_index` for a given page size.
pub async fn page_for_index(
    db: &DatabaseConnection,
    book_uuid: Uuid,
    chapter_index: i32,
    limit: u64,
) -> Result<u64, CatalogError> {
    let ordinal = entities::chapter::Entity::find()
        .filter(entities::chapter::Column::BookUuid.eq(book_uuid))
        .filter(entities::chapter::Column::ChapterIndex.lt(chapter_index))
        .count(db)
        .await?;
    Ok((ordinal / limit.max(1)) + 1)
}

pub enum RangePolicy {
    /// full_download: chapters with status != completed (skip_completed) or all (else)
    FullDownload { skip_completed: bool },
    /// update: chapters with status == pending
    Update,
}

pub async fn chapters_in_range(
    db: &DatabaseConnection,
    book_uuid: Uuid,
    start: Option<i32>,
    end: Option<i32>,
    policy: &RangePolicy,
) -> Result<Vec<Chapter>, CatalogError> {
    if let (Some(s), Some(e)) = (start, end) {
        if e < s {
            return Ok(Vec::new());
        }
    }
    let mut query = entities::chapter::Entity::find().filter(entities::chapter::Column::BookUuid.eq(book_uuid));
    if let Some(s) = start {
        query = query.filter(entities::chapter::Column::ChapterIndex.gte(s));
    }
    if let Some(e) = end {
        query = query.filter(entities::chapter::Column::ChapterIndex.lte(e));
    }
    query = match policy {
        RangePolicy::FullDownload { skip_completed: true } => {
            query.filter(entities::chapter::Column::DownloadStatus.ne("completed"))
        }
        RangePolicy::FullDownload { skip_completed: false } => query,
        RangePolicy::Update => query.filter(entities::chapter::Column::DownloadStatus.eq("pending")),
    };
    let rows = query
        .order_by_asc(entities::chapter::Column::ChapterIndex)
        .all(db)
        .await?;
    Ok(rows.into_iter().map(to_domain).collect())
}

pub async fn completed_ordered(
    db: &DatabaseConnection,
    book_uuid: Uuid,
) -> Result<Vec<Chapter>, CatalogError> {
    let rows = entities::chapter::Entity::find()
        .filter(entities::chapter::Column::BookUuid.eq(book_uuid))
        .filter(entities::chapter::Column::DownloadStatus.eq("completed"))
        .order_by_asc(entities::chapter::Column::ChapterIndex)
        .all(db)
        .await?;
    Ok(rows.into_iter().map(to_domain).collect())
}

/// Atomically marks a chapter completed and recomputes the owning book's
/// `downloaded_chapters` counter in the same transaction.
pub async fn set_completed(
    db: &DatabaseConnection,
    chapter_uuid: Uuid,
    content_ref: &str,
    word_count: i32,
) -> Result<(), CatalogError> {
    let txn = db.begin().await?;
    let model = entities::chapter::Entity::find_by_id(chapter_uuid)
        .one(&txn)
        .await?
        .ok_or(CatalogError::ChapterNotFound(chapter_uuid))?;
    let book_uuid = model.book_uuid;
    let mut active: entities::chapter::ActiveModel = model.into();
    active.download_status = Set("completed".to_string());
    active.content_ref = Set(Some(content_ref.to_string()));
    active.word_count = Set(word_count);
    active.updated_at = Set(Utc::now());
    active.update(&txn).await?;

    let completed = entities::chapter::Entity::find()
        .filter(entities::chapter::Column::BookUuid.eq(book_uuid))
        .filter(entities::chapter::Column::DownloadStatus.eq("completed"))
        .count(&txn)
        .await? as i32;
    let book = entities::book::Entity::find_by_id(book_uuid)
        .one(&txn)
        .await?
        .ok_or(CatalogError::BookNotFound(book_uuid))?;
    let mut book_active: entities::book::ActiveModel = book.into();
    book_active.downloaded_chapters = Set(completed);
    book_active.updated_at = Set(Utc::now());
    book_active.update(&txn).await?;

    txn.commit().await?;
    Ok(())
}

pub async fn set_failed(db: &DatabaseConnection, chapter_uuid: Uuid) -> Result<(), CatalogError> {
    let model = entities::chapter::Entity::find_by_id(chapter_uuid)
        .one(db)
        .await?
        .ok_or(CatalogError::ChapterNotFound(chapter_uuid))?;
    let mut active: entities::chapter::ActiveModel = model.into();
    active.download_status = Set("failed".to_string());
    active.updated_at = Set(Utc::now());
    active.update(db).await?;
    Ok(())
}

pub async fn reset_to_pending(
    db: &DatabaseConnection,
    chapter_uuid: Uuid,
    clear_content_ref: bool,
) -> Result<(), CatalogError> {
    let model = entities::chapter::Entity::find_by_id(chapter_uuid)
        .one(db)
        .await?
        .ok_or(CatalogError::ChapterNotFound(chapter_uuid))?;
    let mut active: entities::chapter::ActiveModel = model.into();
    active.download_status = Set("pending".to_string());
    if clear_content_ref {
        active.content_ref = Set(None);
    }
    active.updated_at = Set(Utc::now());
    active.update(db).await?;
    Ok(())
}

/// Resets all `completed` chapters of a book in `[start, end]` back to `pending`
/// and clears their `content_ref`, leaving any existing `pending`/`failed` rows
/// untouched. Used by `full_download` with `skip_completed = false`.
pub async fn reset_completed_in_range(
    db: &impl ConnectionTrait,
    book_uuid: Uuid,
    start: Option<i32>,
    end: Option<i32>,
) -> Result<u64, CatalogError> {
    let mut query = entities::chapter::Entity::find()
        .filter(entities::chapter::Column::BookUuid.eq(book_uuid))
        .filter(entities::chapter::Column::DownloadStatus.eq("completed"));
    if let Some(s) = start {
        query = query.filter(entities::chapter::Column::ChapterIndex.gte(s));
    }
    if let Some(e) = end {
        query = query.filter(entities::chapter::Column::ChapterIndex.lte(e));
    }
    let rows = query.all(db).await?;
    let n = rows.len() as u64;
    for row in rows {
        let mut active: entities::chapter::ActiveModel = row.into();
        active.download_status = Set("pending".to_string());
        active.content_ref = Set(None);
        active.updated_at = Set(Utc::now());
        active.update(db).await?;
    }
    Ok(n)
}

pub async fn failed_chapters(db: &DatabaseConnection, book_uuid: Uuid) -> Result<Vec<Chapter>, CatalogError> {
    let rows = entities::chapter::Entity::find()
        .filter(entities::chapter::Column::BookUuid.eq(book_uuid))
        .filter(entities::chapter::Column::DownloadStatus.eq("failed"))
        .all(db)
        .await?;
    Ok(rows.into_iter().map(to_domain).collect())
}

/// Heatmap-style bucketed status summary for `GET .../chapters/summary`.
pub async fn status_buckets(
    db: &DatabaseConnection,
    book_uuid: Uuid,
    segment_size: u64,
) -> Result<Vec<(i32, i32, i64)>, CatalogError> {
    let total = entities::chapter::Entity::find()
        .filter(entities::chapter::Column::BookUuid.eq(book_uuid))
        .count(db)
        .await?;
    let segment_size = segment_size.max(1);
    let mut buckets = Vec::new();
    let mut offset = 0u64;
    while offset < total {
        let end = (offset + segment_size).min(total);
        let completed = entities::chapter::Entity::find()
            .filter(entities::chapter::Column::BookUuid.eq(book_uuid))
            .filter(entities::chapter::Column::ChapterIndex.gte(offset as i32))
            .filter(entities::chapter::Column::ChapterIndex.lt(end as i32))
            .filter(entities::chapter::Column::DownloadStatus.eq("completed"))
            .count(db)
            .await? as i64;
        buckets.push((offset as i32, end as i32, completed));
        offset = end;
    }
    Ok(buckets)
}
