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
                    .table(Chapters::Table)
                    .if_not_exists()
                    .col(uuid(Chapters::ChapterUuid).primary_key())
                    .col(uuid(Chapters::BookUuid))
                    .col(string(Chapters::ItemId))
                    .col(integer(Chapters::ChapterIndex))
                    .col(string(Chapters::Title))
                    .col(string_null(Chapters::VolumeName))
                    .col(integer(Chapters::WordCount).default(0))
                    .col(string(Chapters::DownloadStatus).default("pending"))
                    .col(string_null(Chapters::ContentRef))
                    .col(timestamp(Chapters::CreatedAt))
                    .col(timestamp(Chapters::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_chapters_book_uuid")
                            .from(Chapters::Table, Chapters::BookUuid)
                            .to(Books::Table, Books::BookUuid)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_chapters_book_index")
                    .table(Chapters::Table)
                    .col(Chapters::BookUuid)
                    .col(Chapters::ChapterIndex)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Chapters::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Chapters {
    Table,
    ChapterUuid,
    BookUuid,
    ItemId,
    ChapterIndex,
    Title,
    VolumeName,
    WordCount,
    DownloadStatus,
    ContentRef,
    CreatedAt,
    UpdatedAt,
}
