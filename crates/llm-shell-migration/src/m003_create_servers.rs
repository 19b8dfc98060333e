//! Миграция: создание таблицы servers.

use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m003_create_servers"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Servers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Servers::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Servers::GroupId).string().null())
                    .col(ColumnDef::new(Servers::Label).string().not_null())
                    .col(ColumnDef::new(Servers::Host).string().not_null())
                    .col(
                        ColumnDef::new(Servers::Port)
                            .integer()
                            .not_null()
                            .default(22),
                    )
                    .col(ColumnDef::new(Servers::Username).string().not_null())
                    .col(ColumnDef::new(Servers::AuthType).string().not_null())
                    .col(ColumnDef::new(Servers::KeyId).string().null())
                    .col(ColumnDef::new(Servers::ProxyJump).string().null())
                    .col(ColumnDef::new(Servers::StartupCmd).string().null())
                    .col(ColumnDef::new(Servers::Notes).text().null())
                    .col(ColumnDef::new(Servers::Color).string().null())
                    .col(
                        ColumnDef::new(Servers::SortOrder)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Servers::LastConnectedAt).string().null())
                    .col(ColumnDef::new(Servers::CreatedAt).string().not_null())
                    .col(ColumnDef::new(Servers::UpdatedAt).string().not_null())
                    // Удаление группы или ключа обнуляет ссылку, сервер остаётся
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_servers_group_id")
                            .from(Servers::Table, Servers::GroupId)
                            .to(ServerGroups::Table, ServerGroups::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_servers_key_id")
                            .from(Servers::Table, Servers::KeyId)
                            .to(Keypairs::Table, Keypairs::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .table(Servers::Table)
                    .col(Servers::GroupId)
                    .name("idx_servers_group_id")
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .table(Servers::Table)
                    .col(Servers::KeyId)
                    .name("idx_servers_key_id")
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Servers::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Servers {
    Table,
    Id,
    GroupId,
    Label,
    Host,
    Port,
    Username,
    AuthType,
    KeyId,
    ProxyJump,
    StartupCmd,
    Notes,
    Color,
    SortOrder,
    LastConnectedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum ServerGroups {
    Table,
    Id,
}

#[derive(Iden)]
enum Keypairs {
    Table,
    Id,
}
