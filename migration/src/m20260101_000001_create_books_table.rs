use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Books::Table)
                    .if_not_exists()
                    .col(uuid(Books::BookUuid).primary_key())
                    .col(string(Books::Provider))
                    .col(string(Books::ProviderBookId))
                    .col(string(Books::Title))
                    .col(string_null(Books::Author))
                    .col(string_null(Books::CoverPath))
                    .col(text_null(Books::AbstractText))
                    .col(string_null(Books::StatusText))
                    .col(integer(Books::TotalChapters).default(0))
                    .col(integer(Books::DownloadedChapters).default(0))
                    .col(string(Books::DownloadStatus).default("pending"))
                    .col(timestamp(Books::CreatedAt))
                    .col(timestamp(Books::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_books_provider_book_id")
                    .table(Books::Table)
                    .col(Books::Provider)
                    .col(Books::ProviderBookId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Books::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Books {
    Table,
    BookUuid,
    Provider,
    ProviderBookId,
    Title,
    Author,
    CoverPath,
    AbstractText,
    StatusText,
    TotalChapters,
    DownloadedChapters,
    DownloadStatus,
    CreatedAt,
    UpdatedAt,
}
