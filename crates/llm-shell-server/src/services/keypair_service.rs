//! Сервис SSH-ключей. Парольная фраза хранится только в хранилище секретов.

use super::{commit_with_secret, now_timestamp};
use crate::error::AppError;
use crate::secrets::{SecretKey, SecretStore};
use llm_shell_entities::keypairs::{ActiveModel, Column, Entity as KeyPairEntity, Model};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, DatabaseConnection, EntityTrait, QueryOrder,
    TransactionTrait,
};
use serde::Deserialize;
use uuid::Uuid;

const RESOURCE: &str = "KeyPair";

/// Данные ключевой пары (создание и полная замена).
#[derive(Debug, Clone, Deserialize)]
pub struct KeyPairInput {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub private_key_path: String,
    pub public_key_path: Option<String>,
    /// Пустое значение при обновлении оставляет прежнюю фразу
    pub passphrase: Option<String>,
}

pub async fn list_keypairs(db: &DatabaseConnection) -> Result<Vec<Model>, AppError> {
    let keypairs = KeyPairEntity::find()
        .order_by_asc(Column::CreatedAt)
        .all(db)
        .await?;
    tracing::debug!("Загружено ключей: {}", keypairs.len());
    Ok(keypairs)
}

pub async fn get_keypair(db: &DatabaseConnection, id: &str) -> Result<Model, AppError> {
    KeyPairEntity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::not_found(RESOURCE, id))
}

/// Создать ключевую пару. Фраза записывается до фиксации строки.
pub async fn create_keypair(
    db: &DatabaseConnection,
    secrets: &dyn SecretStore,
    data: KeyPairInput,
) -> Result<Model, AppError> {
    let now = now_timestamp();
    let id = Uuid::new_v4().to_string();

    let txn = db.begin().await?;
    let keypair = ActiveModel {
        id: Set(id.clone()),
        label: Set(data.label),
        private_key_path: Set(data.private_key_path),
        public_key_path: Set(data.public_key_path),
        created_at: Set(now.clone()),
        updated_at: Set(now),
    }
    .insert(&txn)
    .await?;
    commit_with_secret(
        txn,
        secrets,
        &SecretKey::keypair(&id),
        data.passphrase.as_deref(),
    )
    .await?;

    tracing::info!("Создан ключ {id} ({})", keypair.label);
    Ok(keypair)
}

/// Полная замена полей ключевой пары.
pub async fn update_keypair(
    db: &DatabaseConnection,
    secrets: &dyn SecretStore,
    id: &str,
    data: KeyPairInput,
) -> Result<Model, AppError> {
    let record = get_keypair(db, id).await?;

    let txn = db.begin().await?;
    let mut model: ActiveModel = record.into();
    model.label = Set(data.label);
    model.private_key_path = Set(data.private_key_path);
    model.public_key_path = Set(data.public_key_path);
    model.updated_at = Set(now_timestamp());
    let keypair = model.update(&txn).await?;
    commit_with_secret(
        txn,
        secrets,
        &SecretKey::keypair(id),
        data.passphrase.as_deref(),
    )
    .await?;

    tracing::info!("Обновлён ключ {id}");
    Ok(keypair)
}

/// Удалить ключевую пару: сначала секрет, затем строку.
/// Ссылки серверов обнуляет внешний ключ (ON DELETE SET NULL).
pub async fn delete_keypair(
    db: &DatabaseConnection,
    secrets: &dyn SecretStore,
    id: &str,
) -> Result<(), AppError> {
    get_keypair(db, id).await?;

    secrets.delete(&SecretKey::keypair(id)).await?;
    KeyPairEntity::delete_by_id(id).exec(db).await?;

    tracing::info!("Удалён ключ {id}");
    Ok(())
}

/// Парольная фраза ключа для движка SSH-сессий.
pub async fn get_passphrase(
    secrets: &dyn SecretStore,
    id: &str,
) -> Result<Option<String>, AppError> {
    Ok(secrets.get(&SecretKey::keypair(id)).await?)
}
