//! Типы ошибок бэкенда.
//!
//! Каждая ошибка несёт машинный код, сообщение, необязательную деталь и
//! HTTP-статус. В ответ она уходит конвертом
//! `{"error": {"code", "message", "detail"?}}`.

use crate::secrets::SecretStoreError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{resource} не найден: {id}")]
    NotFound { resource: &'static str, id: String },

    #[error("{message}")]
    Validation {
        message: String,
        detail: Option<String>,
    },

    #[error("{message}")]
    Conflict {
        message: String,
        detail: Option<String>,
    },

    // Ошибки SSH-сессий и ИИ-ассистента: зарезервированы за движком сессий,
    // в этом сервисе не возникают.
    #[error("SSH-соединение отклонено: {host}:{port}")]
    SshConnectionRefused { host: String, port: u16 },

    #[error("Ошибка SSH-аутентификации")]
    SshAuthFailed(Option<String>),

    #[error("Ключ хоста не прошёл проверку")]
    SshHostKeyInvalid(Option<String>),

    #[error("SSH-соединение потеряно")]
    SshConnectionLost(Option<String>),

    #[error("Ошибка SSH-канала")]
    SshChannelFailed(Option<String>),

    #[error("Недействительный API-ключ")]
    AiAuthFailed,

    #[error("ИИ-сервис перегружен")]
    AiRateLimited,

    #[error("ИИ-сервис не ответил вовремя")]
    AiTimeout,

    #[error("ИИ-сервис недоступен")]
    AiUnavailable,

    #[error("Команда заблокирована политикой безопасности: {command}")]
    CommandBlocked { command: String, reason: String },

    #[error("Ошибка хранилища секретов: {0}")]
    SecretStore(#[from] SecretStoreError),

    #[error("Внутренняя ошибка: {0}")]
    Internal(String),
}

impl AppError {
    pub fn not_found(resource: &'static str, id: impl Into<String>) -> Self {
        AppError::NotFound {
            resource,
            id: id.into(),
        }
    }

    pub fn validation(message: impl Into<String>, detail: Option<String>) -> Self {
        AppError::Validation {
            message: message.into(),
            detail,
        }
    }

    /// Машинный код ошибки.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::NotFound { .. } => "NOT_FOUND",
            AppError::Validation { .. } => "VALIDATION_ERROR",
            AppError::Conflict { .. } => "CONFLICT",
            AppError::SshConnectionRefused { .. } => "SSH_CONN_REFUSED",
            AppError::SshAuthFailed(_) => "SSH_AUTH_FAILED",
            AppError::SshHostKeyInvalid(_) => "SSH_HOST_KEY_INVALID",
            AppError::SshConnectionLost(_) => "SSH_CONN_LOST",
            AppError::SshChannelFailed(_) => "SSH_CHANNEL_FAILED",
            AppError::AiAuthFailed => "AI_AUTH_FAILED",
            AppError::AiRateLimited => "AI_RATE_LIMITED",
            AppError::AiTimeout => "AI_TIMEOUT",
            AppError::AiUnavailable => "AI_UNAVAILABLE",
            AppError::CommandBlocked { .. } => "COMMAND_BLOCKED",
            AppError::SecretStore(_) => "SECRET_STORE_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::SshConnectionRefused { .. }
            | AppError::SshAuthFailed(_)
            | AppError::SshHostKeyInvalid(_)
            | AppError::SshConnectionLost(_)
            | AppError::SshChannelFailed(_)
            | AppError::AiUnavailable => StatusCode::BAD_GATEWAY,
            AppError::AiAuthFailed => StatusCode::UNAUTHORIZED,
            AppError::AiRateLimited => StatusCode::TOO_MANY_REQUESTS,
            AppError::AiTimeout => StatusCode::GATEWAY_TIMEOUT,
            AppError::CommandBlocked { .. } => StatusCode::FORBIDDEN,
            AppError::SecretStore(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Сообщение для пользователя (без внутренних подробностей).
    pub fn message(&self) -> String {
        match self {
            AppError::NotFound { resource, .. } => format!("{resource} не найден"),
            AppError::SshConnectionRefused { .. } => "SSH-соединение отклонено".to_string(),
            AppError::CommandBlocked { .. } => {
                "Команда заблокирована политикой безопасности".to_string()
            }
            AppError::SecretStore(_) => "Ошибка хранилища секретов".to_string(),
            AppError::Internal(_) => "Внутренняя ошибка сервера".to_string(),
            other => other.to_string(),
        }
    }

    pub fn detail(&self) -> Option<String> {
        match self {
            AppError::NotFound { id, .. } => Some(format!("Ресурс '{id}' не существует")),
            AppError::Validation { detail, .. } | AppError::Conflict { detail, .. } => {
                detail.clone()
            }
            AppError::SshConnectionRefused { host, port } => {
                Some(format!("Не удалось подключиться к {host}:{port}"))
            }
            AppError::SshAuthFailed(detail)
            | AppError::SshHostKeyInvalid(detail)
            | AppError::SshConnectionLost(detail)
            | AppError::SshChannelFailed(detail) => detail.clone(),
            AppError::AiAuthFailed => Some("Обновите API-ключ в настройках".to_string()),
            AppError::AiRateLimited => Some("Превышен лимит запросов".to_string()),
            AppError::AiTimeout => Some("Время ожидания запроса истекло".to_string()),
            AppError::AiUnavailable => Some("Сервис временно недоступен".to_string()),
            AppError::CommandBlocked { command, reason } => {
                Some(format!("Команда '{command}' заблокирована: {reason}"))
            }
            AppError::SecretStore(_) | AppError::Internal(_) => None,
        }
    }

    /// Тело ответа об ошибке.
    pub fn to_body(&self) -> serde_json::Value {
        let mut error = json!({
            "code": self.code(),
            "message": self.message(),
        });
        if let Some(detail) = self.detail() {
            error["detail"] = serde_json::Value::String(detail);
        }
        json!({ "error": error })
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("{self}");
        }
        (status, axum::Json(self.to_body())).into_response()
    }
}

impl From<sea_orm::DbErr> for AppError {
    fn from(e: sea_orm::DbErr) -> Self {
        AppError::Internal(e.to_string())
    }
}
