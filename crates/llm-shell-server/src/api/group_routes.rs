//! Маршруты групп серверов.

use crate::api::validation::ValidJson;
use crate::api::AppState;
use crate::error::AppError;
use crate::services::group_service::{self, GroupInput};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use llm_shell_entities::server_groups::Model as ServerGroup;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/groups", get(list_groups).post(create_group))
        .route(
            "/groups/{group_id}",
            get(get_group).put(update_group).delete(delete_group),
        )
}

/// GET /api/groups
async fn list_groups(State(state): State<AppState>) -> Result<Json<Vec<ServerGroup>>, AppError> {
    Ok(Json(group_service::list_groups(&state.db).await?))
}

/// POST /api/groups
async fn create_group(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<GroupInput>,
) -> Result<(StatusCode, Json<ServerGroup>), AppError> {
    let group = group_service::create_group(&state.db, req).await?;
    Ok((StatusCode::CREATED, Json(group)))
}

/// GET /api/groups/{group_id}
async fn get_group(
    State(state): State<AppState>,
    Path(group_id): Path<String>,
) -> Result<Json<ServerGroup>, AppError> {
    Ok(Json(group_service::get_group(&state.db, &group_id).await?))
}

/// PUT /api/groups/{group_id}
async fn update_group(
    State(state): State<AppState>,
    Path(group_id): Path<String>,
    ValidJson(req): ValidJson<GroupInput>,
) -> Result<Json<ServerGroup>, AppError> {
    let group = group_service::update_group(&state.db, &group_id, req).await?;
    Ok(Json(group))
}

/// DELETE /api/groups/{group_id} — серверы группы остаются без группы.
async fn delete_group(
    State(state): State<AppState>,
    Path(group_id): Path<String>,
) -> Result<StatusCode, AppError> {
    group_service::delete_group(&state.db, &group_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
