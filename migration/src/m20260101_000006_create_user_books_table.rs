use crate::m20260101_000001_create_books_table::Books;
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
                    .table(UserBooks::Table)
                    .if_not_exists()
                    .col(uuid(UserBooks::Id).primary_key())
                    .col(uuid(UserBooks::UserUuid))
                    .col(uuid(UserBooks::BookUuid))
                    .col(timestamp(UserBooks::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_books_user_uuid")
                            .from(UserBooks::Table, UserBooks::UserUuid)
                            .to(Users::Table, Users::UserUuid)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_books_book_uuid")
                            .from(UserBooks::Table, UserBooks::BookUuid)
                            .to(Books::Table, Books::BookUuid)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_user_books_unique")
                    .table(UserBooks::Table)
                    .col(UserBooks::UserUuid)
                    .col(UserBooks::BookUuid)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UserBooks::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum UserBooks {
    Table,
    Id,
    UserUuid,
    BookUuid,
    CreatedAt,
}
