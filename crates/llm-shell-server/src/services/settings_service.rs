//! Сервис настроек: таблица ключ-значение поверх встроенных значений по умолчанию.
//!
//! API-ключ в таблицу не попадает: он хранится в хранилище секретов, наружу
//! отдаётся только маска.

use super::{commit_with_secret, commit_without_secret};
use crate::config::SettingsDefaults;
use crate::error::AppError;
use crate::secrets::{SecretKey, SecretStore};
use llm_shell_entities::settings::{ActiveModel, Column, Entity as SettingEntity};
use sea_orm::sea_query::OnConflict;
use sea_orm::{ActiveValue::Set, DatabaseConnection, EntityTrait, TransactionTrait};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const MASK: &str = "***";

/// Снимок всех настроек.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SettingsSnapshot {
    pub model: String,
    pub terminal_font: String,
    pub terminal_size: String,
    pub theme: String,
    pub output_buffer: String,
    pub context_lines: String,
    pub max_chat_rounds: String,
    /// Маскированный API-ключ (например "sk-***abcd")
    pub api_key_masked: String,
}

/// Частичное обновление: записываются только переданные ключи.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsUpdate {
    pub model: Option<String>,
    pub terminal_font: Option<String>,
    pub terminal_size: Option<String>,
    pub theme: Option<String>,
    pub output_buffer: Option<String>,
    pub context_lines: Option<String>,
    pub max_chat_rounds: Option<String>,
    /// Пустая строка удаляет сохранённый ключ
    pub api_key: Option<String>,
}

impl SettingsUpdate {
    /// Пары (ключ, значение) для таблицы settings.
    fn stored_pairs(&self) -> Vec<(&'static str, &str)> {
        [
            ("model", &self.model),
            ("terminal_font", &self.terminal_font),
            ("terminal_size", &self.terminal_size),
            ("theme", &self.theme),
            ("output_buffer", &self.output_buffer),
            ("context_lines", &self.context_lines),
            ("max_chat_rounds", &self.max_chat_rounds),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.as_deref().map(|v| (key, v)))
        .collect()
    }
}

pub async fn get_all(
    db: &DatabaseConnection,
    secrets: &dyn SecretStore,
    defaults: &SettingsDefaults,
) -> Result<SettingsSnapshot, AppError> {
    let mut stored: HashMap<String, String> = SettingEntity::find()
        .all(db)
        .await?
        .into_iter()
        .map(|row| (row.key, row.value))
        .collect();
    let api_key = secrets.get(&SecretKey::ApiKey).await?;
    tracing::debug!("Сохранённых настроек: {}", stored.len());

    let mut take = |key: &str, default: &str| {
        stored
            .remove(key)
            .unwrap_or_else(|| default.to_string())
    };

    Ok(SettingsSnapshot {
        model: take("model", &defaults.model),
        terminal_font: take("terminal_font", &defaults.terminal_font),
        terminal_size: take("terminal_size", &defaults.terminal_size),
        theme: take("theme", &defaults.theme),
        output_buffer: take("output_buffer", &defaults.output_buffer),
        context_lines: take("context_lines", &defaults.context_lines),
        max_chat_rounds: take("max_chat_rounds", &defaults.max_chat_rounds),
        api_key_masked: api_key.as_deref().map(mask_api_key).unwrap_or_default(),
    })
}

/// Применить частичное обновление и вернуть новый снимок.
pub async fn update(
    db: &DatabaseConnection,
    secrets: &dyn SecretStore,
    defaults: &SettingsDefaults,
    data: SettingsUpdate,
) -> Result<SettingsSnapshot, AppError> {
    let pairs = data.stored_pairs();
    let txn = db.begin().await?;
    for (key, value) in &pairs {
        let row = ActiveModel {
            key: Set(key.to_string()),
            value: Set(value.to_string()),
        };
        SettingEntity::insert(row)
            .on_conflict(
                OnConflict::column(Column::Key)
                    .update_column(Column::Value)
                    .to_owned(),
            )
            .exec(&txn)
            .await?;
    }

    // Ключ меняется последним, перед COMMIT
    match data.api_key.as_deref() {
        Some("") => {
            commit_without_secret(txn, secrets, &SecretKey::ApiKey).await?;
            tracing::info!("API-ключ удалён");
        }
        Some(api_key) => {
            commit_with_secret(txn, secrets, &SecretKey::ApiKey, Some(api_key)).await?;
            tracing::info!("API-ключ обновлён");
        }
        None => txn.commit().await?,
    }
    if !pairs.is_empty() {
        tracing::info!("Обновлено настроек: {}", pairs.len());
    }

    get_all(db, secrets, defaults).await
}

/// Маска API-ключа: первые 3 и последние 4 символа, если ключ длиннее 7 символов.
pub fn mask_api_key(api_key: &str) -> String {
    let chars: Vec<char> = api_key.chars().collect();
    match chars.len() {
        0 => String::new(),
        len if len > 7 => {
            let head: String = chars[..3].iter().collect();
            let tail: String = chars[len - 4..].iter().collect();
            format!("{head}{MASK}{tail}")
        }
        _ => MASK.to_string(),
    }
}
