//! Миграция: создание таблицы server_groups.

use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m001_create_server_groups"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ServerGroups::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ServerGroups::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ServerGroups::Name).string().not_null())
                    .col(ColumnDef::new(ServerGroups::Color).string().null())
                    .col(
                        ColumnDef::new(ServerGroups::SortOrder)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(ServerGroups::CreatedAt).string().not_null())
                    .col(ColumnDef::new(ServerGroups::UpdatedAt).string().not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ServerGroups::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum ServerGroups {
    Table,
    Id,
    Name,
    Color,
    SortOrder,
    CreatedAt,
    UpdatedAt,
}
