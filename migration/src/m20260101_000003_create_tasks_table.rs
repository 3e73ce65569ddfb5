use crate::m20260101_000001_create_books_table::Books;
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Tasks::Table)
                    .if_not_exists()
                    .col(uuid(Tasks::TaskUuid).primary_key())
                    .col(uuid(Tasks::BookUuid))
                    .col(string(Tasks::TaskType))
                    .col(string(Tasks::Status).default("pending"))
                    .col(integer(Tasks::Total).default(0))
                    .col(integer(Tasks::Downloaded).default(0))
                    .col(integer(Tasks::Failed).default(0))
                    .col(integer_null(Tasks::StartChapter))
                    .col(integer_null(Tasks::EndChapter))
                    .col(boolean(Tasks::SkipCompleted).default(true))
                    .col(string_null(Tasks::ErrorMessage))
                    .col(timestamp(Tasks::CreatedAt))
                    .col(timestamp_null(Tasks::StartedAt))
                    .col(timestamp_null(Tasks::CompletedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tasks_book_uuid")
                            .from(Tasks::Table, Tasks::BookUuid)
                            .to(Books::Table, Books::BookUuid)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_tasks_book_uuid")
                    .table(Tasks::Table)
                    .col(Tasks::BookUuid)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Tasks::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Tasks {
    Table,
    TaskUuid,
    BookUuid,
    TaskType,
    Status,
    Total,
    Downloaded,
    Failed,
    StartChapter,
    EndChapter,
    SkipCompleted,
    ErrorMessage,
    CreatedAt,
    StartedAt,
    CompletedAt,
}
