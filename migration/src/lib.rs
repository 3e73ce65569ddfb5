pub use sea_orm_migration::prelude::*;

mod m20260101_000001_create_books_table;
mod m20260101_000002_create_chapters_table;
mod m20260101_000003_create_tasks_table;
mod m20260101_000004_create_quotas_table;
mod m20260101_000005_create_users_table;
mod m20260101_000006_create_user_books_table;
mod m20260101_000007_create_progress_table;
mod m20260101_000008_create_bookmarks_table;
mod m20260101_000009_create_reading_history_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260101_000001_create_books_table::Migration),
            Box::new(m20260101_000002_create_chapters_table::Migration),
            Box::new(m20260101_000003_create_tasks_table::Migration),
            Box::new(m20260101_000004_create_quotas_table::Migration),
            Box::new(m20260101_000005_create_users_table::Migration),
            Box::new(m20260101_000006_create_user_books_table::Migration),
            Box::new(m20260101_000007_create_progress_table::Migration),
            Box::new(m20260101_000008_create_bookmarks_table::Migration),
            Box::new(m20260101_000009_create_reading_history_table::Migration),
        ]
    }
}
