//! Маршруты настроек.

use crate::api::validation::ValidJson;
use crate::api::AppState;
use crate::error::AppError;
use crate::services::settings_service::{self, SettingsSnapshot, SettingsUpdate};
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

pub fn routes() -> Router<AppState> {
    Router::new().route("/settings", get(get_settings).patch(update_settings))
}

/// GET /api/settings — все настройки с подставленными значениями по умолчанию.
async fn get_settings(State(state): State<AppState>) -> Result<Json<SettingsSnapshot>, AppError> {
    let snapshot =
        settings_service::get_all(&state.db, state.secrets.as_ref(), &state.settings_defaults)
            .await?;
    Ok(Json(snapshot))
}

/// PATCH /api/settings — частичное обновление.
async fn update_settings(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<SettingsUpdate>,
) -> Result<Json<SettingsSnapshot>, AppError> {
    let snapshot = settings_service::update(
        &state.db,
        state.secrets.as_ref(),
        &state.settings_defaults,
        req,
    )
    .await?;
    Ok(Json(snapshot))
}
