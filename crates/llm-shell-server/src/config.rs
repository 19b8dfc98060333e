//! Конфигурация бэкенда.

use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Адрес для прослушивания (например "127.0.0.1:8765")
    pub listen: String,

    /// Путь к файлу SQLite
    pub database_path: PathBuf,

    /// Каталог файлового хранилища секретов
    pub secrets_dir: PathBuf,

    /// Реализация хранилища секретов
    pub secret_store: SecretStoreMode,

    /// Разрешённые источники CORS (фронтенд)
    pub cors_origins: Vec<String>,

    /// Значения настроек по умолчанию
    pub settings_defaults: SettingsDefaults,
}

impl ServerConfig {
    /// URL подключения sea-orm к файлу БД.
    pub fn database_url(&self) -> String {
        format!("sqlite://{}?mode=rwc", self.database_path.display())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretStoreMode {
    /// Зашифрованный файл в каталоге данных
    File,
    /// Только память процесса, секреты теряются при перезапуске
    Memory,
}

impl std::str::FromStr for SecretStoreMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "file" => Ok(SecretStoreMode::File),
            "memory" => Ok(SecretStoreMode::Memory),
            other => Err(format!(
                "Неизвестное хранилище секретов: {other}. Допустимые: file, memory"
            )),
        }
    }
}

impl std::fmt::Display for SecretStoreMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SecretStoreMode::File => write!(f, "file"),
            SecretStoreMode::Memory => write!(f, "memory"),
        }
    }
}

/// Встроенные значения настроек: подставляются для ключей,
/// которых нет в таблице settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsDefaults {
    pub model: String,
    pub terminal_font: String,
    pub terminal_size: String,
    pub theme: String,
    pub output_buffer: String,
    pub context_lines: String,
    pub max_chat_rounds: String,
}

impl Default for SettingsDefaults {
    fn default() -> Self {
        Self {
            model: "claude-sonnet-4-20250514".to_string(),
            terminal_font: "Monaco".to_string(),
            terminal_size: "14".to_string(),
            theme: "dark".to_string(),
            output_buffer: "1000".to_string(),
            context_lines: "50".to_string(),
            max_chat_rounds: "10".to_string(),
        }
    }
}

/// Каталог данных приложения по умолчанию (`<data_dir>/llm-shell`).
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("llm-shell")
}
