use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, TransactionTrait,
};
use uuid::Uuid;

use crate::domain::Task;
use crate::error::CatalogError;

fn to_domain(m: entities::task::Model) -> Task {
    Task {
        task_uuid: m.task_uuid,
        book_uuid: m.book_uuid,
        task_type: m.task_type,
        status: m.status,
        total: m.total,
        downloaded: m.downloaded,
        failed: m.failed,
        start_chapter: m.start_chapter,
        end_chapter: m.end_chapter,
        skip_completed: m.skip_completed,
        error_message: m.error_message,
        created_at: m.created_at,
        started_at: m.started_at,
        completed_at: m.completed_at,
    }
}

pub struct NewTask {
    pub book_uuid: Uuid,
    pub task_type: String,
    pub total: i32,
    pub start_chapter: Option<i32>,
    pub end_chapter: Option<i32>,
    pub skip_completed: bool,
}

pub async fn create(db: &DatabaseConnection, new: NewTask) -> Result<Task, CatalogError> {
    let now = Utc::now();
    let active = entities::task::ActiveModel {
        task_uuid: Set(Uuid::new_v4()),
        book_uuid: Set(new.book_uuid),
        task_type: Set(new.task_type),
        status: Set("pending".to_string()),
        total: Set(new.total),
        downloaded: Set(0),
        failed: Set(0),
        start_chapter: Set(new.start_chapter),
        end_chapter: Set(new.end_chapter),
        skip_completed: Set(new.skip_completed),
        error_message: Set(None),
        created_at: Set(now),
        started_at: Set(None),
        completed_at: Set(None),
    };
    let model = active.insert(db).await?;
    Ok(to_domain(model))
}

pub async fn get(db: &DatabaseConnection, task_uuid: Uuid) -> Result<Task, CatalogError> {
    entities::task::Entity::find_by_id(task_uuid)
        .one(db)
        .await?
        .map(to_domain)
        .ok_or_else(|| CatalogError::TaskNotFound(task_uuid))
}

pub async fn list_for_book(db: &DatabaseConnection, book_uuid: Uuid) -> Result<Vec<Task>, CatalogError> {
    let rows = entities::task::Entity::find()
        .filter(entities::task::Column::BookUuid.eq(book_uuid))
        .order_by_desc(entities::task::Column::CreatedAt)
        .all(db)
        .await?;
    Ok(rows.into_iter().map(to_domain).collect())
}

pub async fn latest_active_for_book(
    db: &DatabaseConnection,
    book_uuid: Uuid,
) -> Result<Option<Task>, CatalogError> {
    let row = entities::task::Entity::find()
        .filter(entities::task::Column::BookUuid.eq(book_uuid))
        .filter(
            entities::task::Column::Status
                .eq("pending")
                .or(entities::task::Column::Status.eq("running")),
        )
        .order_by_desc(entities::task::Column::CreatedAt)
        .one(db)
        .await?;
    Ok(row.map(to_domain))
}

pub async fn start(db: &DatabaseConnection, task_uuid: Uuid, total: i32) -> Result<Task, CatalogError> {
    let model = entities::task::Entity::find_by_id(task_uuid)
        .one(db)
        .await?
        .ok_or(CatalogError::TaskNotFound(task_uuid))?;
    let mut active: entities::task::ActiveModel = model.into();
    active.status = Set("running".to_string());
    active.total = Set(total);
    active.started_at = Set(Some(Utc::now()));
    let model = active.update(db).await?;
    Ok(to_domain(model))
}

fn is_terminal_status(status: &str) -> bool {
    matches!(status, "completed" | "failed" | "cancelled")
}

/// Increments `downloaded`/`failed` atomically: the read and the write happen
/// inside the same transaction, so two workers racing on the same task can't
/// both read the same starting count and lose an increment.
pub async fn record_progress(
    db: &DatabaseConnection,
    task_uuid: Uuid,
    downloaded_delta: i32,
    failed_delta: i32,
) -> Result<Task, CatalogError> {
    let txn = db.begin().await?;
    let model = entities::task::Entity::find_by_id(task_uuid)
        .one(&txn)
        .await?
        .ok_or(CatalogError::TaskNotFound(task_uuid))?;
    let downloaded = model.downloaded + downloaded_delta;
    let failed = model.failed + failed_delta;
    let mut active: entities::task::ActiveModel = model.into();
    active.downloaded = Set(downloaded);
    active.failed = Set(failed);
    let model = active.update(&txn).await?;
    txn.commit().await?;
    Ok(to_domain(model))
}

/// Moves the task to a terminal status. A no-op once the task is already in
/// a terminal status: terminal statuses are monotone, so a late cancel/finish
/// racing a completed worker must not resurrect or overwrite the outcome.
pub async fn finish(
    db: &DatabaseConnection,
    task_uuid: Uuid,
    status: &str,
    error_message: Option<String>,
) -> Result<Task, CatalogError> {
    let txn = db.begin().await?;
    let model = entities::task::Entity::find_by_id(task_uuid)
        .one(&txn)
        .await?
        .ok_or(CatalogError::TaskNotFound(task_uuid))?;
    if is_terminal_status(&model.status) {
        txn.commit().await?;
        return Ok(to_domain(model));
    }
    let mut active: entities::task::ActiveModel = model.into();
    active.status = Set(status.to_string());
    active.error_message = Set(error_message);
    active.completed_at = Set(Some(Utc::now()));
    let model = active.update(&txn).await?;
    txn.commit().await?;
    Ok(to_domain(model))
}

pub async fn cancel(db: &DatabaseConnection, task_uuid: Uuid) -> Result<Task, CatalogError> {
    finish(db, task_uuid, "cancelled", None).await
}
