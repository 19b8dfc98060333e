//! Сервис групп серверов.

use super::{now_timestamp, to_column_int};
use crate::error::AppError;
use llm_shell_entities::server_groups::{ActiveModel, Column, Entity as GroupEntity, Model};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, DatabaseConnection, EntityTrait, ModelTrait, QueryOrder,
};
use serde::Deserialize;
use uuid::Uuid;

const RESOURCE: &str = "ServerGroup";

/// Данные группы (создание и полная замена).
#[derive(Debug, Clone, Deserialize)]
pub struct GroupInput {
    #[serde(default)]
    pub name: String,
    pub color: Option<String>,
    #[serde(default)]
    pub sort_order: i64,
}

/// Все группы в порядке (sort_order, created_at).
pub async fn list_groups(db: &DatabaseConnection) -> Result<Vec<Model>, AppError> {
    let groups = GroupEntity::find()
        .order_by_asc(Column::SortOrder)
        .order_by_asc(Column::CreatedAt)
        .all(db)
        .await?;
    tracing::debug!("Загружено групп: {}", groups.len());
    Ok(groups)
}

pub async fn get_group(db: &DatabaseConnection, id: &str) -> Result<Model, AppError> {
    GroupEntity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::not_found(RESOURCE, id))
}

pub async fn create_group(db: &DatabaseConnection, data: GroupInput) -> Result<Model, AppError> {
    let now = now_timestamp();
    let model = ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        name: Set(data.name),
        color: Set(data.color),
        sort_order: Set(to_column_int("sort_order", data.sort_order)?),
        created_at: Set(now.clone()),
        updated_at: Set(now),
    };
    let group = model.insert(db).await?;
    tracing::info!("Создана группа {} ({})", group.id, group.name);
    Ok(group)
}

/// Полная замена полей группы.
pub async fn update_group(
    db: &DatabaseConnection,
    id: &str,
    data: GroupInput,
) -> Result<Model, AppError> {
    let record = get_group(db, id).await?;

    let mut model: ActiveModel = record.into();
    model.name = Set(data.name);
    model.color = Set(data.color);
    model.sort_order = Set(to_column_int("sort_order", data.sort_order)?);
    model.updated_at = Set(now_timestamp());
    let group = model.update(db).await?;

    tracing::info!("Обновлена группа {id}");
    Ok(group)
}

/// Удалить группу. Ссылки серверов на неё обнуляет внешний ключ (ON DELETE SET NULL).
pub async fn delete_group(db: &DatabaseConnection, id: &str) -> Result<(), AppError> {
    let record = get_group(db, id).await?;
    record.delete(db).await?;
    tracing::info!("Удалена группа {id}");
    Ok(())
}
