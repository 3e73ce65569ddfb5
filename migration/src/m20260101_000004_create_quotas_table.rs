use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Quotas::Table)
                    .if_not_exists()
                    .col(date(Quotas::QuotaDate))
                    .col(string(Quotas::Provider))
                    .col(big_integer(Quotas::WordsDownloaded).default(0))
                    .col(big_integer(Quotas::WordLimit))
                    .primary_key(
                        Index::create()
                            .col(Quotas::QuotaDate)
                            .col(Quotas::Provider),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Quotas::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Quotas {
    Table,
    QuotaDate,
    Provider,
    WordsDownloaded,
    WordLimit,
}
