//! Маршруты серверов и их истории команд.

use crate::api::validation::{ValidJson, ValidQuery, Validate, Violations};
use crate::api::AppState;
use crate::error::AppError;
use crate::services::command_log_service::{self, Page};
use crate::services::server_service::{self, ServerFilter, ServerInput};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use llm_shell_entities::command_logs::Model as CommandLog;
use llm_shell_entities::servers::Model as Server;
use llm_shell_entities::CommandSource;
use serde::{Deserialize, Serialize};

const DEFAULT_COMMAND_LIMIT: i64 = 50;
const MAX_COMMAND_LIMIT: i64 = 100;

fn default_limit() -> i64 {
    DEFAULT_COMMAND_LIMIT
}

/// Параметры выборки истории команд.
#[derive(Debug, Deserialize)]
pub struct CommandQuery {
    #[serde(default)]
    pub offset: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
    pub source: Option<CommandSource>,
}

impl Validate for CommandQuery {
    fn validate(&self) -> Result<(), AppError> {
        let mut v = Violations::default();
        v.range("offset", self.offset, 0, i64::MAX);
        v.range("limit", self.limit, 1, MAX_COMMAND_LIMIT);
        v.into_result()
    }
}

#[derive(Debug, Serialize)]
pub struct CommandLogListResponse {
    pub items: Vec<CommandLog>,
    pub total: u64,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/servers", get(list_servers).post(create_server))
        .route(
            "/servers/{server_id}",
            get(get_server).put(update_server).delete(delete_server),
        )
        .route("/servers/{server_id}/commands", get(list_commands))
}

// ── Обработчики ──────────────────────────────────────────────────────────────

/// GET /api/servers — список серверов (опционально `?group_id=`).
async fn list_servers(
    State(state): State<AppState>,
    ValidQuery(filter): ValidQuery<ServerFilter>,
) -> Result<Json<Vec<Server>>, AppError> {
    let servers = server_service::list_servers(&state.db, &filter).await?;
    Ok(Json(servers))
}

/// POST /api/servers — создать сервер.
async fn create_server(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<ServerInput>,
) -> Result<(StatusCode, Json<Server>), AppError> {
    let server = server_service::create_server(&state.db, state.secrets.as_ref(), req).await?;
    Ok((StatusCode::CREATED, Json(server)))
}

/// GET /api/servers/{server_id}
async fn get_server(
    State(state): State<AppState>,
    Path(server_id): Path<String>,
) -> Result<Json<Server>, AppError> {
    let server = server_service::get_server(&state.db, &server_id).await?;
    Ok(Json(server))
}

/// PUT /api/servers/{server_id} — полная замена.
async fn update_server(
    State(state): State<AppState>,
    Path(server_id): Path<String>,
    ValidJson(req): ValidJson<ServerInput>,
) -> Result<Json<Server>, AppError> {
    let server =
        server_service::update_server(&state.db, state.secrets.as_ref(), &server_id, req).await?;
    Ok(Json(server))
}

/// DELETE /api/servers/{server_id}
async fn delete_server(
    State(state): State<AppState>,
    Path(server_id): Path<String>,
) -> Result<StatusCode, AppError> {
    server_service::delete_server(&state.db, state.secrets.as_ref(), &server_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/servers/{server_id}/commands — история команд с пагинацией.
async fn list_commands(
    State(state): State<AppState>,
    Path(server_id): Path<String>,
    ValidQuery(query): ValidQuery<CommandQuery>,
) -> Result<Json<CommandLogListResponse>, AppError> {
    server_service::get_server(&state.db, &server_id).await?;

    // Границы проверены в CommandQuery::validate
    let page = Page {
        offset: query.offset.unsigned_abs(),
        limit: query.limit.unsigned_abs(),
    };
    let items =
        command_log_service::list_command_logs(&state.db, &server_id, query.source, page).await?;
    let total = command_log_service::count_command_logs(&state.db, &server_id, query.source).await?;

    Ok(Json(CommandLogListResponse { items, total }))
}
