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
                    .table(Bookmarks::Table)
                    .if_not_exists()
                    .col(uuid(Bookmarks::BookmarkUuid).primary_key())
                    .col(uuid(Bookmarks::UserUuid))
                    .col(uuid(Bookmarks::BookUuid))
                    .col(uuid(Bookmarks::ChapterUuid))
                    .col(double(Bookmarks::Percent).default(0.0))
                    .col(text_null(Bookmarks::Note))
                    .col(timestamp(Bookmarks::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_bookmarks_user_uuid")
                            .from(Bookmarks::Table, Bookmarks::UserUuid)
                            .to(Users::Table, Users::UserUuid)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_bookmarks_book_uuid")
                            .from(Bookmarks::Table, Bookmarks::BookUuid)
                            .to(Books::Table, Books::BookUuid)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_bookmarks_chapter_uuid")
                            .from(Bookmarks::Table, Bookmarks::ChapterUuid)
                            .to(Chapters::Table, Chapters::ChapterUuid)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Bookmarks::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Bookmarks {
    Table,
    BookmarkUuid,
    UserUuid,
    BookUuid,
    ChapterUuid,
    Percent,
    Note,
    CreatedAt,
}
