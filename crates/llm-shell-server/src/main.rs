//! Точка входа бэкенда LLM Shell.

use clap::Parser;
use llm_shell_server::config::{default_data_dir, SecretStoreMode, ServerConfig, SettingsDefaults};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "llm-shell-server",
    about = "LLM Shell — локальный бэкенд SSH-клиента"
)]
struct Cli {
    /// Адрес для прослушивания (host:port)
    #[arg(long, default_value = "127.0.0.1:8765", env = "LLM_SHELL_LISTEN")]
    listen: String,

    /// Каталог данных приложения
    #[arg(long, env = "LLM_SHELL_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Путь к файлу БД (по умолчанию <data-dir>/data.db)
    #[arg(long, env = "LLM_SHELL_DATABASE_PATH")]
    database_path: Option<PathBuf>,

    /// Разрешённые CORS-источники через запятую
    #[arg(
        long,
        env = "LLM_SHELL_CORS_ORIGINS",
        value_delimiter = ',',
        default_value = "http://localhost:5173,http://127.0.0.1:5173"
    )]
    cors_origins: Vec<String>,

    /// Хранилище секретов: file, memory
    #[arg(long, default_value = "file", env = "LLM_SHELL_SECRET_STORE")]
    secret_store: String,

    /// Уровень логирования, если не задан RUST_LOG
    #[arg(long, default_value = "info", env = "LLM_SHELL_LOG_LEVEL")]
    log_level: String,

    /// Модель ассистента по умолчанию
    #[arg(long, env = "LLM_SHELL_DEFAULT_MODEL")]
    default_model: Option<String>,

    /// Шрифт терминала по умолчанию
    #[arg(long, env = "LLM_SHELL_DEFAULT_TERMINAL_FONT")]
    default_terminal_font: Option<String>,

    /// Размер шрифта терминала по умолчанию
    #[arg(long, env = "LLM_SHELL_DEFAULT_TERMINAL_SIZE")]
    default_terminal_size: Option<String>,

    /// Число строк контекста по умолчанию
    #[arg(long, env = "LLM_SHELL_DEFAULT_CONTEXT_LINES")]
    default_context_lines: Option<String>,

    /// Максимум раундов диалога по умолчанию
    #[arg(long, env = "LLM_SHELL_MAX_CHAT_ROUNDS")]
    max_chat_rounds: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env читается до разбора аргументов, чтобы env-значения подхватил clap
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Инициализация логгера
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let secret_store: SecretStoreMode = cli
        .secret_store
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;

    let data_dir = cli.data_dir.unwrap_or_else(default_data_dir);
    let database_path = cli
        .database_path
        .unwrap_or_else(|| data_dir.join("data.db"));

    let mut settings_defaults = SettingsDefaults::default();
    let overrides = [
        (cli.default_model, &mut settings_defaults.model),
        (cli.default_terminal_font, &mut settings_defaults.terminal_font),
        (cli.default_terminal_size, &mut settings_defaults.terminal_size),
        (cli.default_context_lines, &mut settings_defaults.context_lines),
        (cli.max_chat_rounds, &mut settings_defaults.max_chat_rounds),
    ];
    for (value, target) in overrides {
        if let Some(value) = value {
            *target = value;
        }
    }

    let config = ServerConfig {
        listen: cli.listen,
        database_path,
        secrets_dir: data_dir,
        secret_store,
        cors_origins: cli.cors_origins,
        settings_defaults,
    };

    llm_shell_server::run(config).await
}
