//! Сервис серверов: профили подключения, проверка ссылок, пароль в хранилище секретов.

use super::{commit_with_secret, now_timestamp, to_column_int};
use crate::error::AppError;
use crate::secrets::{SecretKey, SecretStore};
use llm_shell_entities::servers::{ActiveModel, Column, Entity as ServerEntity, Model};
use llm_shell_entities::{keypairs, server_groups, AuthType};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
};
use serde::Deserialize;
use uuid::Uuid;

const RESOURCE: &str = "Server";

fn default_port() -> i64 {
    22
}

/// Данные сервера (создание и полная замена).
#[derive(Debug, Clone, Deserialize)]
pub struct ServerInput {
    pub group_id: Option<String>,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: i64,
    #[serde(default)]
    pub username: String,
    pub auth_type: Option<AuthType>,
    pub key_id: Option<String>,
    pub proxy_jump: Option<String>,
    pub startup_cmd: Option<String>,
    pub notes: Option<String>,
    pub color: Option<String>,
    #[serde(default)]
    pub sort_order: i64,
    /// Пустое значение при обновлении оставляет прежний пароль
    pub password: Option<String>,
}

/// Фильтр списка серверов.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerFilter {
    pub group_id: Option<String>,
}

/// Серверы в порядке (sort_order, created_at), при необходимости только одной группы.
pub async fn list_servers(
    db: &DatabaseConnection,
    filter: &ServerFilter,
) -> Result<Vec<Model>, AppError> {
    let mut query = ServerEntity::find();
    if let Some(group_id) = &filter.group_id {
        query = query.filter(Column::GroupId.eq(group_id.as_str()));
    }
    let servers = query
        .order_by_asc(Column::SortOrder)
        .order_by_asc(Column::CreatedAt)
        .all(db)
        .await?;
    tracing::debug!("Загружено серверов: {}", servers.len());
    Ok(servers)
}

pub async fn get_server(db: &DatabaseConnection, id: &str) -> Result<Model, AppError> {
    ServerEntity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::not_found(RESOURCE, id))
}

/// Создать сервер. Пароль записывается до фиксации строки.
pub async fn create_server(
    db: &DatabaseConnection,
    secrets: &dyn SecretStore,
    data: ServerInput,
) -> Result<Model, AppError> {
    let auth_type = ensure_credentials(&data)?;
    validate_references(db, data.group_id.as_deref(), data.key_id.as_deref()).await?;

    let now = now_timestamp();
    let id = Uuid::new_v4().to_string();

    let txn = db.begin().await?;
    let server = ActiveModel {
        id: Set(id.clone()),
        group_id: Set(data.group_id),
        label: Set(data.label),
        host: Set(data.host),
        port: Set(to_column_int("port", data.port)?),
        username: Set(data.username),
        auth_type: Set(auth_type),
        key_id: Set(data.key_id),
        proxy_jump: Set(data.proxy_jump),
        startup_cmd: Set(data.startup_cmd),
        notes: Set(data.notes),
        color: Set(data.color),
        sort_order: Set(to_column_int("sort_order", data.sort_order)?),
        last_connected_at: Set(None),
        created_at: Set(now.clone()),
        updated_at: Set(now),
    }
    .insert(&txn)
    .await?;
    commit_with_secret(
        txn,
        secrets,
        &SecretKey::server(&id),
        data.password.as_deref(),
    )
    .await?;

    tracing::info!("Создан сервер {id} ({}@{})", server.username, server.host);
    Ok(server)
}

/// Полная замена полей сервера (кроме id, created_at и last_connected_at).
pub async fn update_server(
    db: &DatabaseConnection,
    secrets: &dyn SecretStore,
    id: &str,
    data: ServerInput,
) -> Result<Model, AppError> {
    let record = get_server(db, id).await?;
    let auth_type = data
        .auth_type
        .ok_or_else(|| AppError::validation("Не указан auth_type", None))?;
    validate_references(db, data.group_id.as_deref(), data.key_id.as_deref()).await?;

    let txn = db.begin().await?;
    let mut model: ActiveModel = record.into();
    model.group_id = Set(data.group_id);
    model.label = Set(data.label);
    model.host = Set(data.host);
    model.port = Set(to_column_int("port", data.port)?);
    model.username = Set(data.username);
    model.auth_type = Set(auth_type);
    model.key_id = Set(data.key_id);
    model.proxy_jump = Set(data.proxy_jump);
    model.startup_cmd = Set(data.startup_cmd);
    model.notes = Set(data.notes);
    model.color = Set(data.color);
    model.sort_order = Set(to_column_int("sort_order", data.sort_order)?);
    model.updated_at = Set(now_timestamp());
    let server = model.update(&txn).await?;
    commit_with_secret(
        txn,
        secrets,
        &SecretKey::server(id),
        data.password.as_deref(),
    )
    .await?;

    tracing::info!("Обновлён сервер {id}");
    Ok(server)
}

/// Удалить сервер: сначала пароль, затем строка (история команд удаляется каскадом).
pub async fn delete_server(
    db: &DatabaseConnection,
    secrets: &dyn SecretStore,
    id: &str,
) -> Result<(), AppError> {
    get_server(db, id).await?;

    secrets.delete(&SecretKey::server(id)).await?;
    ServerEntity::delete_by_id(id).exec(db).await?;

    tracing::info!("Удалён сервер {id}");
    Ok(())
}

/// Пароль сервера для движка SSH-сессий.
pub async fn get_password(
    secrets: &dyn SecretStore,
    id: &str,
) -> Result<Option<String>, AppError> {
    Ok(secrets.get(&SecretKey::server(id)).await?)
}

/// Проверить, что для выбранного способа аутентификации передан секрет или ключ.
fn ensure_credentials(data: &ServerInput) -> Result<AuthType, AppError> {
    let auth_type = data
        .auth_type
        .ok_or_else(|| AppError::validation("Не указан auth_type", None))?;

    let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.is_empty());
    match auth_type {
        AuthType::Key if !present(&data.key_id) => Err(AppError::validation(
            "Для auth_type 'key' обязателен key_id",
            None,
        )),
        AuthType::Password if !present(&data.password) => Err(AppError::validation(
            "Для auth_type 'password' обязателен password",
            None,
        )),
        _ => Ok(auth_type),
    }
}

/// Проверить, что группа и ключ, на которые ссылается сервер, существуют.
async fn validate_references(
    db: &DatabaseConnection,
    group_id: Option<&str>,
    key_id: Option<&str>,
) -> Result<(), AppError> {
    if let Some(group_id) = group_id {
        let exists = server_groups::Entity::find_by_id(group_id).count(db).await? > 0;
        if !exists {
            return Err(AppError::validation(
                format!("Группа '{group_id}' не найдена"),
                None,
            ));
        }
    }

    if let Some(key_id) = key_id {
        let exists = keypairs::Entity::find_by_id(key_id).count(db).await? > 0;
        if !exists {
            return Err(AppError::validation(
                format!("Ключ '{key_id}' не найден"),
                None,
            ));
        }
    }

    Ok(())
}
