use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect,
};
use uuid::Uuid;

use crate::domain::{Bookmark, HistoryEntry, Progress, User};
use crate::error::CatalogError;

// ---- Users ----

fn user_to_domain(m: entities::user::Model) -> User {
    User {
        user_uuid: m.user_uuid,
        username: m.username,
        display_name: m.display_name,
        created_at: m.created_at,
    }
}

pub async fn create_user(
    db: &DatabaseConnection,
    username: &str,
    display_name: Option<String>,
) -> Result<User, CatalogError> {
    let active = entities::user::ActiveModel {
        user_uuid: Set(Uuid::new_v4()),
        username: Set(username.to_string()),
        display_name: Set(display_name),
        created_at: Set(Utc::now()),
    };
    Ok(user_to_domain(active.insert(db).await?))
}

pub async fn list_users(db: &DatabaseConnection) -> Result<Vec<User>, CatalogError> {
    let rows = entities::user::Entity::find().all(db).await?;
    Ok(rows.into_iter().map(user_to_domain).collect())
}

pub async fn delete_user(db: &DatabaseConnection, user_uuid: Uuid) -> Result<(), CatalogError> {
    entities::user::Entity::delete_by_id(user_uuid).exec(db).await?;
    Ok(())
}

pub async fn update_user(
    db: &DatabaseConnection,
    user_uuid: Uuid,
    display_name: Option<String>,
) -> Result<User, CatalogError> {
    let model = entities::user::Entity::find_by_id(user_uuid)
        .one(db)
        .await?
        .ok_or(CatalogError::Db(sea_orm::DbErr::RecordNotFound(user_uuid.to_string())))?;
    let mut active: entities::user::ActiveModel = model.into();
    active.display_name = Set(display_name);
    Ok(user_to_domain(active.update(db).await?))
}

/// Books linked to `user_uuid` via `user_book`, most recently linked first.
pub async fn list_user_books(db: &DatabaseConnection, user_uuid: Uuid) -> Result<Vec<crate::domain::Book>, CatalogError> {
    let links = entities::user_book::Entity::find()
        .filter(entities::user_book::Column::UserUuid.eq(user_uuid))
        .order_by_desc(entities::user_book::Column::CreatedAt)
        .all(db)
        .await?;
    let mut books = Vec::with_capacity(links.len());
    for link in links {
        if let Some(book) = entities::book::Entity::find_by_id(link.book_uuid).one(db).await? {
            books.push(crate::catalog::book::to_domain(book));
        }
    }
    Ok(books)
}

pub async fn link_user_book(
    db: &DatabaseConnection,
    user_uuid: Uuid,
    book_uuid: Uuid,
) -> Result<(), CatalogError> {
    let active = entities::user_book::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_uuid: Set(user_uuid),
        book_uuid: Set(book_uuid),
        created_at: Set(Utc::now()),
    };
    active.insert(db).await?;
    Ok(())
}

pub async fn unlink_user_book(
    db: &DatabaseConnection,
    user_uuid: Uuid,
    book_uuid: Uuid,
) -> Result<(), CatalogError> {
    entities::user_book::Entity::delete_many()
        .filter(entities::user_book::Column::UserUuid.eq(user_uuid))
        .filter(entities::user_book::Column::BookUuid.eq(book_uuid))
        .exec(db)
        .await?;
    Ok(())
}

// ---- Progress ----

fn progress_to_domain(m: entities::progress::Model) -> Progress {
    Progress {
        id: m.id,
        user_uuid: m.user_uuid,
        book_uuid: m.book_uuid,
        chapter_uuid: m.chapter_uuid,
        device_id: m.device_id,
        offset_px: m.offset_px,
        percent: m.percent,
        updated_at: m.updated_at,
    }
}

pub async fn get_progress(
    db: &DatabaseConnection,
    user_uuid: Uuid,
    book_uuid: Uuid,
) -> Result<Option<Progress>, CatalogError> {
    let row = entities::progress::Entity::find()
        .filter(entities::progress::Column::UserUuid.eq(user_uuid))
        .filter(entities::progress::Column::BookUuid.eq(book_uuid))
        .one(db)
        .await?;
    Ok(row.map(progress_to_domain))
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
    let percent = percent.clamp(0.0, 100.0);
    let offset_px = offset_px.max(0);
    let existing = entities::progress::Entity::find()
        .filter(entities::progress::Column::UserUuid.eq(user_uuid))
        .filter(entities::progress::Column::BookUuid.eq(book_uuid))
        .one(db)
        .await?;

    let model = match existing {
        Some(row) => {
            let mut active: entities::progress::ActiveModel = row.into();
            active.chapter_uuid = Set(chapter_uuid);
            active.device_id = Set(device_id.to_string());
            active.offset_px = Set(offset_px);
            active.percent = Set(percent);
            active.updated_at = Set(Utc::now());
            active.update(db).await?
        }
        None => {
            let active = entities::progress::ActiveModel {
                id: Set(Uuid::new_v4()),
                user_uuid: Set(user_uuid),
                book_uuid: Set(book_uuid),
                chapter_uuid: Set(chapter_uuid),
                device_id: Set(device_id.to_string()),
                offset_px: Set(offset_px),
                percent: Set(percent),
                updated_at: Set(Utc::now()),
            };
            active.insert(db).await?
        }
    };

    let history = entities::history::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_uuid: Set(user_uuid),
        book_uuid: Set(book_uuid),
        chapter_uuid: Set(chapter_uuid),
        percent: Set(percent),
        device_id: Set(device_id.to_string()),
        created_at: Set(Utc::now()),
    };
    history.insert(db).await?;

    Ok(progress_to_domain(model))
}

pub async fn clear_progress(
    db: &DatabaseConnection,
    user_uuid: Uuid,
    book_uuid: Uuid,
) -> Result<(), CatalogError> {
    entities::progress::Entity::delete_many()
        .filter(entities::progress::Column::UserUuid.eq(user_uuid))
        .filter(entities::progress::Column::BookUuid.eq(book_uuid))
        .exec(db)
        .await?;
    Ok(())
}

// ---- Bookmarks ----

fn bookmark_to_domain(m: entities::bookmark::Model) -> Bookmark {
    Bookmark {
        bookmark_uuid: m.bookmark_uuid,
        user_uuid: m.user_uuid,
        book_uuid: m.book_uuid,
        chapter_uuid: m.chapter_uuid,
        percent: m.percent,
        note: m.note,
        created_at: m.created_at,
    }
}

pub async fn list_bookmarks(
    db: &DatabaseConnection,
    user_uuid: Uuid,
    book_uuid: Uuid,
) -> Result<Vec<Bookmark>, CatalogError> {
    let rows = entities::bookmark::Entity::find()
        .filter(entities::bookmark::Column::UserUuid.eq(user_uuid))
        .filter(entities::bookmark::Column::BookUuid.eq(book_uuid))
        .order_by_desc(entities::bookmark::Column::CreatedAt)
        .all(db)
        .await?;
    Ok(rows.into_iter().map(bookmark_to_domain).collect())
}

pub async fn add_bookmark(
    db: &DatabaseConnection,
    user_uuid: Uuid,
    book_uuid: Uuid,
    chapter_uuid: Uuid,
    percent: f64,
    note: Option<String>,
) -> Result<Bookmark, CatalogError> {
    let active = entities::bookmark::ActiveModel {
        bookmark_uuid: Set(Uuid::new_v4()),
        user_uuid: Set(user_uuid),
        book_uuid: Set(book_uuid),
        chapter_uuid: Set(chapter_uuid),
        percent: Set(percent.clamp(0.0, 100.0)),
        note: Set(note),
        created_at: Set(Utc::now()),
    };
    Ok(bookmark_to_domain(active.insert(db).await?))
}

pub async fn delete_bookmark(db: &DatabaseConnection, bookmark_uuid: Uuid) -> Result<(), CatalogError> {
    entities::bookmark::Entity::delete_by_id(bookmark_uuid).exec(db).await?;
    Ok(())
}

// ---- History ----

fn history_to_domain(m: entities::history::Model) -> HistoryEntry {
    HistoryEntry {
        id: m.id,
        user_uuid: m.user_uuid,
        book_uuid: m.book_uuid,
        chapter_uuid: m.chapter_uuid,
        percent: m.percent,
        device_id: m.device_id,
        created_at: m.created_at,
    }
}

pub async fn list_history(
    db: &DatabaseConnection,
    user_uuid: Uuid,
    book_uuid: Uuid,
) -> Result<Vec<HistoryEntry>, CatalogError> {
    let rows = entities::history::Entity::find()
        .filter(entities::history::Column::UserUuid.eq(user_uuid))
        .filter(entities::history::Column::BookUuid.eq(book_uuid))
        .order_by_desc(entities::history::Column::CreatedAt)
        .limit(1000)
        .all(db)
        .await?;
    Ok(rows.into_iter().map(history_to_domain).collect())
}

pub async fn clear_history(
    db: &DatabaseConnection,
    user_uuid: Uuid,
    book_uuid: Uuid,
) -> Result<(), CatalogError> {
    entities::history::Entity::delete_many()
        .filter(entities::history::Column::UserUuid.eq(user_uuid))
        .filter(entities::history::Column::BookUuid.eq(book_uuid))
        .exec(db)
        .await?;
    Ok(())
}
