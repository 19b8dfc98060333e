//! Маршруты SSH-ключей. Парольная фраза принимается, но никогда не возвращается.

use crate::api::validation::ValidJson;
use crate::api::AppState;
use crate::error::AppError;
use crate::services::keypair_service::{self, KeyPairInput};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use llm_shell_entities::keypairs::Model as KeyPair;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/keypairs", get(list_keypairs).post(create_keypair))
        .route(
            "/keypairs/{keypair_id}",
            get(get_keypair).put(update_keypair).delete(delete_keypair),
        )
}

async fn list_keypairs(State(state): State<AppState>) -> Result<Json<Vec<KeyPair>>, AppError> {
    Ok(Json(keypair_service::list_keypairs(&state.db).await?))
}

async fn create_keypair(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<KeyPairInput>,
) -> Result<(StatusCode, Json<KeyPair>), AppError> {
    let keypair = keypair_service::create_keypair(&state.db, state.secrets.as_ref(), req).await?;
    Ok((StatusCode::CREATED, Json(keypair)))
}

async fn get_keypair(
    State(state): State<AppState>,
    Path(keypair_id): Path<String>,
) -> Result<Json<KeyPair>, AppError> {
    Ok(Json(keypair_service::get_keypair(&state.db, &keypair_id).await?))
}

async fn update_keypair(
    State(state): State<AppState>,
    Path(keypair_id): Path<String>,
    ValidJson(req): ValidJson<KeyPairInput>,
) -> Result<Json<KeyPair>, AppError> {
    let keypair =
        keypair_service::update_keypair(&state.db, state.secrets.as_ref(), &keypair_id, req)
            .await?;
    Ok(Json(keypair))
}

async fn delete_keypair(
    State(state): State<AppState>,
    Path(keypair_id): Path<String>,
) -> Result<StatusCode, AppError> {
    keypair_service::delete_keypair(&state.db, state.secrets.as_ref(), &keypair_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
