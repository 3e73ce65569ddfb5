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
                    .table(Progress::Table)
                    .if_not_exists()
                    .col(uuid(Progress::Id).primary_key())
                    .col(uuid(Progress::UserUuid))
                    .col(uuid(Progress::BookUuid))
                    .col(uuid(Progress::ChapterUuid))
                    .col(string(Progress::DeviceId))
                    .col(integer(Progress::OffsetPx).default(0))
                    .col(double(Progress::Percent).default(0.0))
                    .col(timestamp(Progress::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_progress_user_uuid")
                            .from(Progress::Table, Progress::UserUuid)
                            .to(Users::Table, Users::UserUuid)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_progress_book_uuid")
                            .from(Progress::Table, Progress::BookUuid)
                            .to(Books::Table, Books::BookUuid)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_progress_chapter_uuid")
                            .from(Progress::Table, Progress::ChapterUuid)
                            .to(Chapters::Table, Chapters::ChapterUuid)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_progress_unique")
                    .table(Progress::Table)
                    .col(Progress::UserUuid)
                    .col(Progress::BookUuid)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Progress::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Progress {
    Table,
    Id,
    UserUuid,
    BookUuid,
    ChapterUuid,
    DeviceId,
    OffsetPx,
    Percent,
    UpdatedAt,
}
