//! Миграция: создание таблицы command_logs.

use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m004_create_command_logs"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CommandLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CommandLogs::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(CommandLogs::ServerId).string().not_null())
                    .col(ColumnDef::new(CommandLogs::SessionId).string().not_null())
                    .col(ColumnDef::new(CommandLogs::Command).text().not_null())
                    .col(ColumnDef::new(CommandLogs::OutputSummary).text().null())
                    .col(ColumnDef::new(CommandLogs::RiskLevel).string().null())
                    .col(ColumnDef::new(CommandLogs::Source).string().not_null())
                    .col(ColumnDef::new(CommandLogs::ExecutedAt).string().not_null())
                    // История живёт не дольше своего сервера
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_command_logs_server_id")
                            .from(CommandLogs::Table, CommandLogs::ServerId)
                            .to(Servers::Table, Servers::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Выборка истории сервера идёт по server_id с сортировкой по времени
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .table(CommandLogs::Table)
                    .col(CommandLogs::ServerId)
                    .col(CommandLogs::ExecutedAt)
                    .name("idx_command_logs_server_id_executed_at")
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CommandLogs::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum CommandLogs {
    Table,
    Id,
    ServerId,
    SessionId,
    Command,
    OutputSummary,
    RiskLevel,
    Source,
    ExecutedAt,
}

#[derive(Iden)]
enum Servers {
    Table,
    Id,
}
