//! HTTP API: маршрутизация и состояние приложения.

pub mod group_routes;
pub mod keypair_routes;
pub mod server_routes;
pub mod settings_routes;
pub mod validation;

use crate::config::SettingsDefaults;
use crate::secrets::SecretStore;
use axum::http::HeaderValue;
use axum::routing::get;
use axum::{Json, Router};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

/// Общее состояние приложения.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub secrets: Arc<dyn SecretStore>,
    pub settings_defaults: Arc<SettingsDefaults>,
}

/// Построить маршрутизатор Axum.
pub fn build_router(state: AppState, cors_origins: &[String]) -> Router {
    let origins: Vec<HeaderValue> = cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            // "*" несовместим с allow_credentials
            Ok(_) if origin == "*" => {
                tracing::warn!("CORS-источник '*' не поддерживается, пропущен");
                None
            }
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Пропущен некорректный CORS-источник: {origin}");
                None
            }
        })
        .collect();

    // С credentials нельзя использовать "*", поэтому методы и заголовки зеркалируются
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true);

    let api_routes = Router::new()
        .merge(group_routes::routes())
        .merge(keypair_routes::routes())
        .merge(server_routes::routes())
        .merge(settings_routes::routes());

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health — проверка живости для супервизора процесса.
async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
