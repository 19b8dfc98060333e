//! Хранилище секретов: пароли серверов, парольные фразы ключей, API-ключ.
//!
//! Секреты никогда не попадают в реляционную БД. Сервисы зависят только от
//! трейта [`SecretStore`]; конкретное хранилище выбирается при запуске.

use aes_gcm::aead::Aead;
use aes_gcm::{Aes256Gcm, KeyInit, Nonce};
use async_trait::async_trait;
use base64::Engine;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::sync::Mutex;

/// Имя сервиса, общее для всех записей приложения.
pub const SECRET_SERVICE: &str = "llm-shell";

const NONCE_SIZE: usize = 12;
const MASTER_KEY_SIZE: usize = 32;

/// Ключ записи в хранилище секретов.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SecretKey {
    /// Пароль сервера: `server:<id>`
    Server(String),
    /// Парольная фраза ключевой пары: `keypair:<id>`
    KeyPair(String),
    /// API-ключ ассистента: `api_key`
    ApiKey,
}

impl SecretKey {
    pub fn server(id: &str) -> Self {
        SecretKey::Server(id.to_string())
    }

    pub fn keypair(id: &str) -> Self {
        SecretKey::KeyPair(id.to_string())
    }
}

impl fmt::Display for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SecretKey::Server(id) => write!(f, "server:{id}"),
            SecretKey::KeyPair(id) => write!(f, "keypair:{id}"),
            SecretKey::ApiKey => write!(f, "api_key"),
        }
    }
}

#[derive(Debug, Error)]
pub enum SecretStoreError {
    #[error("ошибка ввода-вывода: {0}")]
    Io(#[from] std::io::Error),

    #[error("повреждённый файл секретов: {0}")]
    Format(#[from] serde_json::Error),

    #[error("ошибка шифрования: {0}")]
    Crypto(String),
}

/// Хранилище секретов с адресацией по [`SecretKey`].
#[async_trait]
pub trait SecretStore: Send + Sync {
    async fn set(&self, key: &SecretKey, value: &str) -> Result<(), SecretStoreError>;

    async fn get(&self, key: &SecretKey) -> Result<Option<String>, SecretStoreError>;

    /// Удалить запись. Отсутствие записи ошибкой не считается.
    async fn delete(&self, key: &SecretKey) -> Result<(), SecretStoreError>;
}

// ── In-memory ────────────────────────────────────────────────────────────────

/// Хранилище в памяти процесса (тесты и `--secret-store memory`).
#[derive(Default)]
pub struct MemorySecretStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SecretStore for MemorySecretStore {
    async fn set(&self, key: &SecretKey, value: &str) -> Result<(), SecretStoreError> {
        self.entries
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn get(&self, key: &SecretKey) -> Result<Option<String>, SecretStoreError> {
        Ok(self.entries.lock().await.get(&key.to_string()).cloned())
    }

    async fn delete(&self, key: &SecretKey) -> Result<(), SecretStoreError> {
        self.entries.lock().await.remove(&key.to_string());
        Ok(())
    }
}

// ── Зашифрованный файл ───────────────────────────────────────────────────────

/// Хранилище в файле: каждое значение зашифровано AES-256-GCM.
///
/// Формат файла: JSON-объект `"<service>/<key>" -> base64(nonce || ciphertext || tag)`.
/// Мастер-ключ лежит рядом в отдельном файле (hex) и создаётся при первом запуске.
pub struct FileSecretStore {
    path: PathBuf,
    cipher: Aes256Gcm,
    service: String,
    lock: Mutex<()>,
}

impl FileSecretStore {
    /// Открыть хранилище в каталоге `dir` (`secrets.json` + `secrets.key`).
    pub async fn open(dir: &Path, service: &str) -> Result<Self, SecretStoreError> {
        tokio::fs::create_dir_all(dir).await?;
        let master_key = load_or_create_master_key(&dir.join("secrets.key")).await?;

        // AES-ключ выводится из мастер-ключа через SHA-256
        let derived = Sha256::digest(master_key);
        let cipher = Aes256Gcm::new_from_slice(&derived)
            .map_err(|e| SecretStoreError::Crypto(format!("инициализация ключа: {e}")))?;

        Ok(Self {
            path: dir.join("secrets.json"),
            cipher,
            service: service.to_string(),
            lock: Mutex::new(()),
        })
    }

    fn entry_name(&self, key: &SecretKey) -> String {
        format!("{}/{key}", self.service)
    }

    async fn read_entries(&self) -> Result<BTreeMap<String, String>, SecretStoreError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.is_empty() => Ok(BTreeMap::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_entries(
        &self,
        entries: &BTreeMap<String, String>,
    ) -> Result<(), SecretStoreError> {
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, serde_json::to_vec_pretty(entries)?).await?;
        restrict_permissions(&tmp).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    fn encrypt(&self, plaintext: &str) -> Result<String, SecretStoreError> {
        let mut nonce_bytes = [0u8; NONCE_SIZE];
        getrandom::fill(&mut nonce_bytes)
            .map_err(|e| SecretStoreError::Crypto(format!("генерация nonce: {e}")))?;

        let ciphertext = self
            .cipher
            .encrypt(Nonce::from_slice(&nonce_bytes), plaintext.as_bytes())
            .map_err(|e| SecretStoreError::Crypto(format!("шифрование: {e}")))?;

        let mut combined = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        combined.extend_from_slice(&nonce_bytes);
        combined.extend_from_slice(&ciphertext);
        Ok(base64::engine::general_purpose::STANDARD.encode(combined))
    }

    fn decrypt(&self, encoded: &str) -> Result<String, SecretStoreError> {
        let combined = base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .map_err(|e| SecretStoreError::Crypto(format!("base64: {e}")))?;
        if combined.len() <= NONCE_SIZE {
            return Err(SecretStoreError::Crypto("слишком короткий шифртекст".into()));
        }

        let (nonce, ciphertext) = combined.split_at(NONCE_SIZE);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|e| SecretStoreError::Crypto(format!("расшифровка: {e}")))?;
        String::from_utf8(plaintext)
            .map_err(|e| SecretStoreError::Crypto(format!("не UTF-8: {e}")))
    }
}

#[async_trait]
impl SecretStore for FileSecretStore {
    async fn set(&self, key: &SecretKey, value: &str) -> Result<(), SecretStoreError> {
        let _guard = self.lock.lock().await;
        let mut entries = self.read_entries().await?;
        entries.insert(self.entry_name(key), self.encrypt(value)?);
        self.write_entries(&entries).await
    }

    async fn get(&self, key: &SecretKey) -> Result<Option<String>, SecretStoreError> {
        let _guard = self.lock.lock().await;
        let entries = self.read_entries().await?;
        entries
            .get(&self.entry_name(key))
            .map(|encoded| self.decrypt(encoded))
            .transpose()
    }

    async fn delete(&self, key: &SecretKey) -> Result<(), SecretStoreError> {
        let _guard = self.lock.lock().await;
        let mut entries = self.read_entries().await?;
        if entries.remove(&self.entry_name(key)).is_some() {
            self.write_entries(&entries).await?;
        }
        Ok(())
    }
}

/// Прочитать мастер-ключ или сгенерировать новый.
async fn load_or_create_master_key(
    path: &Path,
) -> Result<[u8; MASTER_KEY_SIZE], SecretStoreError> {
    match tokio::fs::read_to_string(path).await {
        Ok(contents) => {
            let bytes = hex::decode(contents.trim())
                .map_err(|e| SecretStoreError::Crypto(format!("мастер-ключ: {e}")))?;
            bytes
                .try_into()
                .map_err(|_| SecretStoreError::Crypto("мастер-ключ неверной длины".into()))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            let mut key = [0u8; MASTER_KEY_SIZE];
            getrandom::fill(&mut key)
                .map_err(|e| SecretStoreError::Crypto(format!("генерация ключа: {e}")))?;
            tokio::fs::write(path, hex::encode(key)).await?;
            restrict_permissions(path).await?;
            tracing::info!("Создан мастер-ключ хранилища секретов: {}", path.display());
            Ok(key)
        }
        Err(e) => Err(e.into()),
    }
}

/// Права 0600 на файлы с секретами (только Unix).
pub(crate) async fn restrict_permissions(path: &Path) -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)).await?;
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}
