//! Бизнес-логика: по одному сервису на сущность.

pub mod command_log_service;
pub mod group_service;
pub mod keypair_service;
pub mod server_service;
pub mod settings_service;

use crate::error::AppError;
use crate::secrets::{SecretKey, SecretStore};
use chrono::{SecondsFormat, Utc};
use sea_orm::DatabaseTransaction;

/// Текущее время в ISO-8601 с фиксированной точностью (лексикографический
/// порядок совпадает с хронологическим).
pub(crate) fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Привести целое из запроса к типу колонки.
pub(crate) fn to_column_int(field: &str, value: i64) -> Result<i32, AppError> {
    i32::try_from(value).map_err(|_| {
        AppError::validation(
            "Некорректные входные данные",
            Some(format!("{field}: значение {value} вне допустимого диапазона")),
        )
    })
}

/// Зафиксировать транзакцию, предварительно записав секрет.
///
/// Пустое или отсутствующее значение оставляет секрет без изменений.
/// Ошибка записи секрета откатывает транзакцию (она просто отбрасывается).
/// Если не удался сам COMMIT, прежнее значение секрета восстанавливается.
pub(crate) async fn commit_with_secret(
    txn: DatabaseTransaction,
    secrets: &dyn SecretStore,
    key: &SecretKey,
    value: Option<&str>,
) -> Result<(), AppError> {
    let Some(value) = value.filter(|v| !v.is_empty()) else {
        txn.commit().await?;
        return Ok(());
    };

    let previous = secrets.get(key).await?;
    secrets.set(key, value).await?;
    commit_or_restore(txn, secrets, key, previous).await
}

/// Зафиксировать транзакцию, предварительно удалив секрет.
pub(crate) async fn commit_without_secret(
    txn: DatabaseTransaction,
    secrets: &dyn SecretStore,
    key: &SecretKey,
) -> Result<(), AppError> {
    let previous = secrets.get(key).await?;
    secrets.delete(key).await?;
    commit_or_restore(txn, secrets, key, previous).await
}

/// COMMIT; при ошибке секрету возвращается значение `previous`.
async fn commit_or_restore(
    txn: DatabaseTransaction,
    secrets: &dyn SecretStore,
    key: &SecretKey,
    previous: Option<String>,
) -> Result<(), AppError> {
    if let Err(e) = txn.commit().await {
        let restored = match previous {
            Some(old) => secrets.set(key, &old).await,
            None => secrets.delete(key).await,
        };
        if let Err(restore_err) = restored {
            tracing::error!("Не удалось восстановить секрет {key}: {restore_err}");
        }
        return Err(e.into());
    }

    Ok(())
}

