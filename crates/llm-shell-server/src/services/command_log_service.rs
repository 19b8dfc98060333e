//! Сервис истории команд: только добавление и постраничное чтение.

use super::now_timestamp;
use crate::error::AppError;
use llm_shell_entities::command_logs::{ActiveModel, Column, Entity as CommandLogEntity, Model};
use llm_shell_entities::{servers, CommandSource, RiskLevel};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select,
};
use uuid::Uuid;

/// Данные новой записи истории.
pub struct CommandLogData {
    pub server_id: String,
    pub session_id: String,
    pub command: String,
    pub source: CommandSource,
    pub output_summary: Option<String>,
    pub risk_level: Option<RiskLevel>,
}

/// Окно выборки истории.
#[derive(Debug, Clone, Copy)]
pub struct Page {
    pub offset: u64,
    pub limit: u64,
}

/// Записать выполненную команду.
pub async fn create_command_log(
    db: &DatabaseConnection,
    data: CommandLogData,
) -> Result<Model, AppError> {
    let server_exists = servers::Entity::find_by_id(data.server_id.as_str())
        .count(db)
        .await?
        > 0;
    if !server_exists {
        return Err(AppError::validation(
            format!("Сервер '{}' не найден", data.server_id),
            None,
        ));
    }

    let model = ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        server_id: Set(data.server_id),
        session_id: Set(data.session_id),
        command: Set(data.command),
        output_summary: Set(data.output_summary),
        risk_level: Set(data.risk_level),
        source: Set(data.source),
        executed_at: Set(now_timestamp()),
    };
    let log = model.insert(db).await?;
    tracing::debug!("Команда записана в историю сервера {}", log.server_id);
    Ok(log)
}

/// История сервера, новые записи первыми.
pub async fn list_command_logs(
    db: &DatabaseConnection,
    server_id: &str,
    source: Option<CommandSource>,
    page: Page,
) -> Result<Vec<Model>, AppError> {
    let logs = server_logs(server_id, source)
        .order_by_desc(Column::ExecutedAt)
        .offset(page.offset)
        .limit(page.limit)
        .all(db)
        .await?;
    tracing::debug!(
        "История сервера {server_id}: {} записей (offset {}, limit {})",
        logs.len(),
        page.offset,
        page.limit
    );
    Ok(logs)
}

/// Общее число записей истории (без учёта окна выборки).
pub async fn count_command_logs(
    db: &DatabaseConnection,
    server_id: &str,
    source: Option<CommandSource>,
) -> Result<u64, AppError> {
    Ok(server_logs(server_id, source).count(db).await?)
}

fn server_logs(server_id: &str, source: Option<CommandSource>) -> Select<CommandLogEntity> {
    let mut query = CommandLogEntity::find().filter(Column::ServerId.eq(server_id));
    if let Some(source) = source {
        query = query.filter(Column::Source.eq(source));
    }
    query
}
