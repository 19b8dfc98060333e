//! Проверка входных данных на границе API.
//!
//! Тело и query-параметры проверяются до вызова сервиса; нарушения
//! собираются все сразу и возвращаются одной ошибкой 422.

use crate::error::AppError;
use crate::services::group_service::GroupInput;
use crate::services::keypair_service::KeyPairInput;
use crate::services::server_service::{ServerFilter, ServerInput};
use crate::services::settings_service::SettingsUpdate;
use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::request::Parts;
use axum::Json;
use regex::Regex;
use serde::de::DeserializeOwned;
use std::sync::LazyLock;

static COLOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#[0-9A-Fa-f]{6}$").expect("корректное регулярное выражение"));

const MAX_NAME_LEN: usize = 100;

/// Входные данные, которые умеют себя проверять.
pub trait Validate {
    fn validate(&self) -> Result<(), AppError>;
}

/// Накопитель нарушений.
#[derive(Debug, Default)]
pub struct Violations(Vec<String>);

impl Violations {
    pub fn check(&mut self, ok: bool, field: &str, reason: &str) {
        if !ok {
            self.0.push(format!("{field}: {reason}"));
        }
    }

    /// Строка длиной от 1 до `max` символов.
    pub fn length(&mut self, field: &str, value: &str, max: usize) {
        let len = value.chars().count();
        if len == 0 {
            self.0.push(format!("{field}: обязательное поле"));
        } else if len > max {
            self.0
                .push(format!("{field}: длина не должна превышать {max} символов"));
        }
    }

    pub fn required(&mut self, field: &str, value: &str) {
        self.check(!value.is_empty(), field, "обязательное поле");
    }

    pub fn color(&mut self, field: &str, value: Option<&str>) {
        if let Some(color) = value {
            self.check(COLOR_RE.is_match(color), field, "ожидается цвет вида #RRGGBB");
        }
    }

    pub fn range(&mut self, field: &str, value: i64, min: i64, max: i64) {
        self.check(
            (min..=max).contains(&value),
            field,
            &format!("значение должно быть от {min} до {max}"),
        );
    }

    pub fn into_result(self) -> Result<(), AppError> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(AppError::validation(
                "Некорректные входные данные",
                Some(self.0.join("; ")),
            ))
        }
    }
}

impl Validate for GroupInput {
    fn validate(&self) -> Result<(), AppError> {
        let mut v = Violations::default();
        v.length("name", &self.name, MAX_NAME_LEN);
        v.color("color", self.color.as_deref());
        v.range("sort_order", self.sort_order, 0, i64::from(i32::MAX));
        v.into_result()
    }
}

impl Validate for KeyPairInput {
    fn validate(&self) -> Result<(), AppError> {
        let mut v = Violations::default();
        v.length("label", &self.label, MAX_NAME_LEN);
        v.required("private_key_path", &self.private_key_path);
        v.into_result()
    }
}

impl Validate for ServerInput {
    fn validate(&self) -> Result<(), AppError> {
        let mut v = Violations::default();
        v.length("label", &self.label, MAX_NAME_LEN);
        v.required("host", &self.host);
        v.range("port", self.port, 1, 65535);
        v.required("username", &self.username);
        v.check(self.auth_type.is_some(), "auth_type", "обязательное поле");
        v.color("color", self.color.as_deref());
        v.range("sort_order", self.sort_order, 0, i64::from(i32::MAX));
        v.into_result()
    }
}

impl Validate for ServerFilter {
    fn validate(&self) -> Result<(), AppError> {
        Ok(())
    }
}

impl Validate for SettingsUpdate {
    fn validate(&self) -> Result<(), AppError> {
        let mut v = Violations::default();
        if let Some(theme) = &self.theme {
            v.check(
                matches!(theme.as_str(), "light" | "dark"),
                "theme",
                "допустимые значения: light, dark",
            );
        }
        v.into_result()
    }
}

/// JSON-тело, прошедшее проверку.
pub struct ValidJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| AppError::validation("Некорректное тело запроса", Some(e.body_text())))?;
        value.validate()?;
        Ok(ValidJson(value))
    }
}

/// Query-параметры, прошедшие проверку.
pub struct ValidQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for ValidQuery<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|e| {
                AppError::validation("Некорректные параметры запроса", Some(e.body_text()))
            })?;
        value.validate()?;
        Ok(ValidQuery(value))
    }
}
