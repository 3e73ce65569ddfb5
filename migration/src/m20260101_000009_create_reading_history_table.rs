use crate::m20260101_000001_create_books_table::Books;
use crate::m20260101_000002_create_chapters_table::Chapters;
use crate::m20260101_000005_create_users_table::Users;
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ReadingHistory::Table)
                    .if_not_exists()
                    .col(uuid(ReadingHistory::Id).primary_key())
                    .col(uuid(ReadingHistory::UserUuid))
                    .col(uuid(ReadingHistory::BookUuid))
                    .col(uuid(ReadingHistory::ChapterUuid))
                    .col(double(ReadingHistory::Percent).default(0.0))
                    .col(string(ReadingHistory::DeviceId))
                    .col(timestamp(ReadingHistory::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_reading_history_user_uuid")
                            .from(ReadingHistory::Table, ReadingHistory::UserUuid)
                            .to(Users::Table, Users::UserUuid)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_reading_history_book_uuid")
                            .from(ReadingHistory::Table, ReadingHistory::BookUuid)
                            .to(Books::Table, Books::BookUuid)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_reading_history_chapter_uuid")
                            .from(ReadingHistory::Table, ReadingHistory::ChapterUuid)
                            .to(Chapters::Table, Chapters::ChapterUuid)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_reading_history_book")
                    .table(ReadingHistory::Table)
                    .col(ReadingHistory::BookUuid)
                    .col(ReadingHistory::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ReadingHistory::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum ReadingHistory {
    Table,
    Id,
    UserUuid,
    BookUuid,
    ChapterUuid,
    Percent,
    DeviceId,
    CreatedAt,
}
