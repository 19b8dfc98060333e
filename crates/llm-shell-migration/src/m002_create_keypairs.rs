//! Миграция: создание таблицы keypairs.

use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m002_create_keypairs"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Keypairs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Keypairs::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Keypairs::Label).string().not_null())
                    .col(ColumnDef::new(Keypairs::PrivateKeyPath).string().not_null())
                    .col(ColumnDef::new(Keypairs::PublicKeyPath).string().null())
                    .col(ColumnDef::new(Keypairs::CreatedAt).string().not_null())
                    .col(ColumnDef::new(Keypairs::UpdatedAt).string().not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Keypairs::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Keypairs {
    Table,
    Id,
    Label,
    PrivateKeyPath,
    PublicKeyPath,
    CreatedAt,
    UpdatedAt,
}
