//! Локальный бэкенд SSH-клиента LLM Shell: профили серверов, ключи, группы,
//! история команд и настройки по REST API.

pub mod api;
pub mod config;
pub mod error;
pub mod secrets;
pub mod services;

#[cfg(test)]
mod tests;

use api::AppState;
use config::{SecretStoreMode, ServerConfig};
use llm_shell_migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection};
use secrets::{FileSecretStore, MemorySecretStore, SecretStore, SECRET_SERVICE};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

/// Запустить бэкенд.
pub async fn run(config: ServerConfig) -> anyhow::Result<()> {
    // 1. Подключение к БД и миграции
    let db = connect_database(&config).await?;

    // 2. Хранилище секретов
    info!("Хранилище секретов: {}", config.secret_store);
    let secrets: Arc<dyn SecretStore> = match config.secret_store {
        SecretStoreMode::File => {
            info!("Каталог секретов: {}", config.secrets_dir.display());
            Arc::new(FileSecretStore::open(&config.secrets_dir, SECRET_SERVICE).await?)
        }
        SecretStoreMode::Memory => {
            tracing::warn!("Секреты хранятся только в памяти и будут потеряны при остановке");
            Arc::new(MemorySecretStore::new())
        }
    };

    // 3. Состояние приложения
    let state = AppState {
        db,
        secrets,
        settings_defaults: Arc::new(config.settings_defaults.clone()),
    };

    // 4. Маршрутизатор
    let app = api::build_router(state, &config.cors_origins);

    // 5. Graceful shutdown
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Получен сигнал завершения, останавливаю сервер...");
        let _ = shutdown_tx.send(true);
    });

    // 6. Запуск сервера
    serve(&config, app, shutdown_rx).await?;

    info!("Сервер остановлен");
    Ok(())
}

/// Открыть файл БД из конфигурации и закрыть его от других пользователей.
async fn connect_database(config: &ServerConfig) -> anyhow::Result<DatabaseConnection> {
    if let Some(parent) = config.database_path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    info!("Подключение к базе данных: {}", config.database_path.display());
    let db = open_database(&config.database_url()).await?;
    secrets::restrict_permissions(&config.database_path).await?;
    Ok(db)
}

/// Подключиться к SQLite и применить миграции.
///
/// Один коннект: запись в БД последовательна, а внешние ключи
/// включаются для соединения явно.
pub async fn open_database(url: &str) -> anyhow::Result<DatabaseConnection> {
    let mut options = ConnectOptions::new(url);
    options.max_connections(1).sqlx_logging(false);
    let db = Database::connect(options).await?;
    db.execute_unprepared("PRAGMA foreign_keys = ON").await?;

    info!("Выполнение миграций...");
    Migrator::up(&db, None).await?;
    Ok(db)
}

/// HTTP без TLS: бэкенд слушает только локальный адрес.
async fn serve(
    config: &ServerConfig,
    app: axum::Router,
    mut shutdown_rx: watch::Receiver<bool>,
) -> anyhow::Result<()> {
    let addr: SocketAddr = config.listen.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Сервер запущен на http://{addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            while !*shutdown_rx.borrow_and_update() {
                if shutdown_rx.changed().await.is_err() {
                    break;
                }
            }
        })
        .await?;
    Ok(())
}
