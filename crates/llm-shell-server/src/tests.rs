//! Тесты: маскирование ключа, хранилища секретов, сервисы на SQLite в памяти,
//! интеграционные тесты HTTP.

#[cfg(test)]
mod tests {
    use crate::config::SettingsDefaults;
    use crate::error::AppError;
    use crate::secrets::{
        FileSecretStore, MemorySecretStore, SecretKey, SecretStore, SecretStoreError,
        SECRET_SERVICE,
    };
    use crate::services::command_log_service::{self, CommandLogData, Page};
    use crate::services::group_service::{self, GroupInput};
    use crate::services::keypair_service::{self, KeyPairInput};
    use crate::services::server_service::{self, ServerFilter, ServerInput};
    use crate::services::settings_service::{self, mask_api_key, SettingsUpdate};
    use async_trait::async_trait;
    use llm_shell_entities::{AuthType, CommandSource, RiskLevel};
    use sea_orm::DatabaseConnection;

    async fn test_db() -> DatabaseConnection {
        crate::open_database("sqlite::memory:").await.unwrap()
    }

    fn group(name: &str, sort_order: i64) -> GroupInput {
        GroupInput {
            name: name.to_string(),
            color: Some("#FF5733".to_string()),
            sort_order,
        }
    }

    fn keypair(label: &str, passphrase: Option<&str>) -> KeyPairInput {
        KeyPairInput {
            label: label.to_string(),
            private_key_path: format!("/home/user/.ssh/{label}"),
            public_key_path: None,
            passphrase: passphrase.map(str::to_string),
        }
    }

    fn password_server(label: &str, group_id: Option<&str>) -> ServerInput {
        ServerInput {
            group_id: group_id.map(str::to_string),
            label: label.to_string(),
            host: "10.0.0.1".to_string(),
            port: 22,
            username: "root".to_string(),
            auth_type: Some(AuthType::Password),
            key_id: None,
            proxy_jump: None,
            startup_cmd: None,
            notes: None,
            color: None,
            sort_order: 0,
            password: Some("s3cret".to_string()),
        }
    }

    /// Хранилище, в которое невозможно записать.
    struct FailingSecretStore;

    #[async_trait]
    impl SecretStore for FailingSecretStore {
        async fn set(&self, _key: &SecretKey, _value: &str) -> Result<(), SecretStoreError> {
            Err(SecretStoreError::Crypto("хранилище недоступно".into()))
        }

        async fn get(&self, _key: &SecretKey) -> Result<Option<String>, SecretStoreError> {
            Ok(None)
        }

        async fn delete(&self, _key: &SecretKey) -> Result<(), SecretStoreError> {
            Ok(())
        }
    }

    // ── Маскирование API-ключа ───────────────────────────────────────────────

    #[test]
    fn test_mask_long_key() {
        assert_eq!(mask_api_key("sk-ant-abcdef1234"), "sk-***1234");
        assert_eq!(mask_api_key("12345678"), "123***5678");
    }

    #[test]
    fn test_mask_short_key() {
        assert_eq!(mask_api_key("1234567"), "***");
        assert_eq!(mask_api_key("x"), "***");
        assert_eq!(mask_api_key(""), "");
    }

    // ── Хранилища секретов ───────────────────────────────────────────────────

    #[test]
    fn test_secret_key_names() {
        assert_eq!(SecretKey::server("abc").to_string(), "server:abc");
        assert_eq!(SecretKey::keypair("abc").to_string(), "keypair:abc");
        assert_eq!(SecretKey::ApiKey.to_string(), "api_key");
    }

    #[tokio::test]
    async fn test_memory_store_roundtrip() {
        let store = MemorySecretStore::new();
        let key = SecretKey::server("srv-1");

        assert_eq!(store.get(&key).await.unwrap(), None);
        store.set(&key, "pw").await.unwrap();
        assert_eq!(store.get(&key).await.unwrap().as_deref(), Some("pw"));

        store.delete(&key).await.unwrap();
        store.delete(&key).await.unwrap();
        assert_eq!(store.get(&key).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_file_store_encrypts_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let key = SecretKey::server("srv-1");

        let store = FileSecretStore::open(dir.path(), SECRET_SERVICE).await.unwrap();
        store.set(&key, "very-secret-password").await.unwrap();

        let raw = std::fs::read_to_string(dir.path().join("secrets.json")).unwrap();
        assert!(
            !raw.contains("very-secret-password"),
            "Секрет не должен храниться открытым текстом"
        );
        assert!(raw.contains("llm-shell/server:srv-1"));

        // Повторное открытие использует тот же мастер-ключ
        let reopened = FileSecretStore::open(dir.path(), SECRET_SERVICE).await.unwrap();
        assert_eq!(
            reopened.get(&key).await.unwrap().as_deref(),
            Some("very-secret-password")
        );

        reopened.delete(&key).await.unwrap();
        reopened.delete(&key).await.unwrap();
        assert_eq!(reopened.get(&key).await.unwrap(), None);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_file_store_restricts_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let store = FileSecretStore::open(dir.path(), SECRET_SERVICE).await.unwrap();
        store.set(&SecretKey::ApiKey, "sk-test").await.unwrap();

        for name in ["secrets.json", "secrets.key"] {
            let mode = std::fs::metadata(dir.path().join(name))
                .unwrap()
                .permissions()
                .mode();
            assert_eq!(mode & 0o777, 0o600, "{name} должен быть доступен только владельцу");
        }
    }

    // ── Конверт ошибок ───────────────────────────────────────────────────────

    #[test]
    fn test_error_codes_and_statuses() {
        use axum::http::StatusCode;

        let cases = [
            (AppError::not_found("Server", "x"), "NOT_FOUND", StatusCode::NOT_FOUND),
            (
                AppError::validation("bad", None),
                "VALIDATION_ERROR",
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                AppError::SshConnectionRefused {
                    host: "10.0.0.1".into(),
                    port: 22,
                },
                "SSH_CONN_REFUSED",
                StatusCode::BAD_GATEWAY,
            ),
            (AppError::AiAuthFailed, "AI_AUTH_FAILED", StatusCode::UNAUTHORIZED),
            (AppError::AiRateLimited, "AI_RATE_LIMITED", StatusCode::TOO_MANY_REQUESTS),
            (AppError::AiTimeout, "AI_TIMEOUT", StatusCode::GATEWAY_TIMEOUT),
            (
                AppError::CommandBlocked {
                    command: "rm -rf /".into(),
                    reason: "опасная команда".into(),
                },
                "COMMAND_BLOCKED",
                StatusCode::FORBIDDEN,
            ),
            (
                AppError::Internal("db".into()),
                "INTERNAL_ERROR",
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, code, status) in cases {
            assert_eq!(err.code(), code);
            assert_eq!(err.status(), status);
            assert_eq!(err.to_body()["error"]["code"], code);
        }
    }

    #[test]
    fn test_error_body_hides_internal_details() {
        let body = AppError::Internal("no such table: servers".into()).to_body();
        assert_eq!(body["error"]["message"], "Внутренняя ошибка сервера");
        assert!(body["error"].get("detail").is_none());

        let body = AppError::not_found("Server", "abc").to_body();
        assert_eq!(body["error"]["message"], "Server не найден");
        assert_eq!(body["error"]["detail"], "Ресурс 'abc' не существует");
    }

    // ── Группы ───────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_group_get_returns_created() {
        let db = test_db().await;
        let created = group_service::create_group(&db, group("Prod", 0)).await.unwrap();
        let fetched = group_service::get_group(&db, &created.id).await.unwrap();
        assert_eq!(created, fetched);
        assert_eq!(created.created_at, created.updated_at);
    }

    #[tokio::test]
    async fn test_groups_sorted_by_sort_order() {
        let db = test_db().await;
        for (name, order) in [("a", 2), ("b", 0), ("c", 1)] {
            group_service::create_group(&db, group(name, order)).await.unwrap();
        }

        let names: Vec<String> = group_service::list_groups(&db)
            .await
            .unwrap()
            .into_iter()
            .map(|g| g.name)
            .collect();
        assert_eq!(names, ["b", "c", "a"]);
    }

    #[tokio::test]
    async fn test_group_update_replaces_all_fields() {
        let db = test_db().await;
        let created = group_service::create_group(&db, group("Prod", 3)).await.unwrap();

        let updated = group_service::update_group(
            &db,
            &created.id,
            GroupInput {
                name: "Staging".to_string(),
                color: None,
                sort_order: 0,
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.name, "Staging");
        assert_eq!(updated.color, None);
        assert_eq!(updated.sort_order, 0);
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at >= created.updated_at);
    }

    #[tokio::test]
    async fn test_group_missing_is_not_found() {
        let db = test_db().await;
        let err = group_service::delete_group(&db, "missing").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { resource: "ServerGroup", .. }));
        assert_eq!(err.code(), "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_delete_group_detaches_servers() {
        let db = test_db().await;
        let secrets = MemorySecretStore::new();
        let prod = group_service::create_group(&db, group("Prod", 0)).await.unwrap();
        let server =
            server_service::create_server(&db, &secrets, password_server("web", Some(&prod.id)))
                .await
                .unwrap();

        group_service::delete_group(&db, &prod.id).await.unwrap();

        let server = server_service::get_server(&db, &server.id).await.unwrap();
        assert_eq!(server.group_id, None);
    }

    // ── Ключи ────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_keypair_passphrase_lifecycle() {
        let db = test_db().await;
        let secrets = MemorySecretStore::new();

        let key = keypair_service::create_keypair(&db, &secrets, keypair("id_rsa", Some("phrase")))
            .await
            .unwrap();
        assert_eq!(
            keypair_service::get_passphrase(&secrets, &key.id).await.unwrap().as_deref(),
            Some("phrase")
        );

        // Пустая фраза при обновлении сохраняет прежнюю
        keypair_service::update_keypair(&db, &secrets, &key.id, keypair("id_rsa", Some("")))
            .await
            .unwrap();
        assert_eq!(
            keypair_service::get_passphrase(&secrets, &key.id).await.unwrap().as_deref(),
            Some("phrase")
        );

        keypair_service::delete_keypair(&db, &secrets, &key.id).await.unwrap();
        assert_eq!(keypair_service::get_passphrase(&secrets, &key.id).await.unwrap(), None);
        assert!(keypair_service::list_keypairs(&db).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_keypair_update_overwrites_passphrase() {
        let db = test_db().await;
        let secrets = MemorySecretStore::new();
        let key = keypair_service::create_keypair(&db, &secrets, keypair("id_rsa", Some("old")))
            .await
            .unwrap();

        let mut input = keypair("id_rsa_new", Some("new"));
        input.public_key_path = Some("/home/user/.ssh/id_rsa_new.pub".to_string());
        let updated = keypair_service::update_keypair(&db, &secrets, &key.id, input)
            .await
            .unwrap();

        assert_eq!(updated.label, "id_rsa_new");
        assert_eq!(updated.created_at, key.created_at);
        assert_eq!(
            keypair_service::get_passphrase(&secrets, &key.id).await.unwrap().as_deref(),
            Some("new")
        );
    }

    #[tokio::test]
    async fn test_delete_keypair_detaches_servers() {
        let db = test_db().await;
        let secrets = MemorySecretStore::new();
        let key = keypair_service::create_keypair(&db, &secrets, keypair("id_ed25519", None))
            .await
            .unwrap();

        let mut input = password_server("db", None);
        input.auth_type = Some(AuthType::Key);
        input.key_id = Some(key.id.clone());
        input.password = None;
        let server = server_service::create_server(&db, &secrets, input).await.unwrap();
        assert_eq!(server.key_id.as_deref(), Some(key.id.as_str()));

        keypair_service::delete_keypair(&db, &secrets, &key.id).await.unwrap();

        let server = server_service::get_server(&db, &server.id).await.unwrap();
        assert_eq!(server.key_id, None);
        assert_eq!(server.auth_type, AuthType::Key);
    }

    // ── Серверы ──────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_server_password_goes_to_secret_store() {
        let db = test_db().await;
        let secrets = MemorySecretStore::new();
        let server = server_service::create_server(&db, &secrets, password_server("web", None))
            .await
            .unwrap();

        assert_eq!(
            server_service::get_password(&secrets, &server.id).await.unwrap().as_deref(),
            Some("s3cret")
        );

        let json = serde_json::to_value(&server).unwrap();
        assert!(json.get("password").is_none());

        server_service::delete_server(&db, &secrets, &server.id).await.unwrap();
        assert_eq!(server_service::get_password(&secrets, &server.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_server_unknown_references_rejected() {
        let db = test_db().await;
        let secrets = MemorySecretStore::new();

        let err = server_service::create_server(&db, &secrets, password_server("web", Some("nope")))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));

        let mut input = password_server("web", None);
        input.auth_type = Some(AuthType::Key);
        input.key_id = Some("nope".to_string());
        let err = server_service::create_server(&db, &secrets, input).await.unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));

        assert!(server_service::list_servers(&db, &ServerFilter::default())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_server_requires_credentials_for_auth_type() {
        let db = test_db().await;
        let secrets = MemorySecretStore::new();

        let mut key_without_id = password_server("a", None);
        key_without_id.auth_type = Some(AuthType::Key);
        let err = server_service::create_server(&db, &secrets, key_without_id)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");

        let mut password_without_secret = password_server("b", None);
        password_without_secret.password = Some(String::new());
        let err = server_service::create_server(&db, &secrets, password_without_secret)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_server_not_saved_when_secret_store_fails() {
        let db = test_db().await;
        let err = server_service::create_server(&db, &FailingSecretStore, password_server("web", None))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::SecretStore(_)));
        assert_eq!(err.code(), "SECRET_STORE_ERROR");
        assert!(server_service::list_servers(&db, &ServerFilter::default())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_server_filter_by_group() {
        let db = test_db().await;
        let secrets = MemorySecretStore::new();
        let prod = group_service::create_group(&db, group("Prod", 0)).await.unwrap();
        server_service::create_server(&db, &secrets, password_server("in", Some(&prod.id)))
            .await
            .unwrap();
        server_service::create_server(&db, &secrets, password_server("out", None))
            .await
            .unwrap();

        let filter = ServerFilter {
            group_id: Some(prod.id.clone()),
        };
        let servers = server_service::list_servers(&db, &filter).await.unwrap();
        assert_eq!(servers.len(), 1);
        assert_eq!(servers[0].label, "in");
    }

    #[tokio::test]
    async fn test_servers_sorted_by_sort_order() {
        let db = test_db().await;
        let secrets = MemorySecretStore::new();
        for (label, order) in [("a", 2), ("b", 0), ("c", 1)] {
            let mut input = password_server(label, None);
            input.sort_order = order;
            server_service::create_server(&db, &secrets, input).await.unwrap();
        }

        let labels: Vec<String> = server_service::list_servers(&db, &ServerFilter::default())
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.label)
            .collect();
        assert_eq!(labels, ["b", "c", "a"]);
    }

    #[tokio::test]
    async fn test_server_update_replaces_fields_and_keeps_password() {
        let db = test_db().await;
        let secrets = MemorySecretStore::new();
        let created = server_service::create_server(&db, &secrets, password_server("web", None))
            .await
            .unwrap();

        let mut input = password_server("web-2", None);
        input.host = "10.0.0.2".to_string();
        input.port = 2222;
        input.notes = Some("primary".to_string());
        input.password = Some(String::new());
        let updated = server_service::update_server(&db, &secrets, &created.id, input)
            .await
            .unwrap();

        assert_eq!(updated.label, "web-2");
        assert_eq!(updated.host, "10.0.0.2");
        assert_eq!(updated.port, 2222);
        assert_eq!(updated.notes.as_deref(), Some("primary"));
        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(updated.last_connected_at, created.last_connected_at);
        assert_eq!(
            server_service::get_server(&db, &created.id).await.unwrap(),
            updated
        );
        assert_eq!(
            server_service::get_password(&secrets, &created.id).await.unwrap().as_deref(),
            Some("s3cret")
        );

        // Непустой пароль перезаписывает прежний
        let mut input = password_server("web-2", None);
        input.password = Some("n3w".to_string());
        server_service::update_server(&db, &secrets, &created.id, input)
            .await
            .unwrap();
        assert_eq!(
            server_service::get_password(&secrets, &created.id).await.unwrap().as_deref(),
            Some("n3w")
        );
    }

    #[tokio::test]
    async fn test_server_update_unknown_references_rejected() {
        let db = test_db().await;
        let secrets = MemorySecretStore::new();
        let created = server_service::create_server(&db, &secrets, password_server("web", None))
            .await
            .unwrap();

        let err = server_service::update_server(
            &db,
            &secrets,
            &created.id,
            password_server("web", Some("nope")),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");

        let mut input = password_server("web", None);
        input.auth_type = Some(AuthType::Key);
        input.key_id = Some("nope".to_string());
        let err = server_service::update_server(&db, &secrets, &created.id, input)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");

        let server = server_service::get_server(&db, &created.id).await.unwrap();
        assert_eq!(server, created);

        let err = server_service::update_server(&db, &secrets, "missing", password_server("x", None))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");
    }

    // ── История команд ───────────────────────────────────────────────────────

    fn log_entry(server_id: &str, n: usize, source: CommandSource) -> CommandLogData {
        CommandLogData {
            server_id: server_id.to_string(),
            session_id: "session-1".to_string(),
            command: format!("echo {n}"),
            source,
            output_summary: None,
            risk_level: Some(RiskLevel::Low),
        }
    }

    #[tokio::test]
    async fn test_command_log_pagination_and_filter() {
        let db = test_db().await;
        let secrets = MemorySecretStore::new();
        let server = server_service::create_server(&db, &secrets, password_server("web", None))
            .await
            .unwrap();

        for n in 0..5 {
            let source = if n < 3 { CommandSource::Manual } else { CommandSource::Ai };
            command_log_service::create_command_log(&db, log_entry(&server.id, n, source))
                .await
                .unwrap();
        }

        let page = Page { offset: 2, limit: 2 };
        let items = command_log_service::list_command_logs(&db, &server.id, None, page)
            .await
            .unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(
            command_log_service::count_command_logs(&db, &server.id, None).await.unwrap(),
            5
        );

        let all = command_log_service::list_command_logs(
            &db,
            &server.id,
            None,
            Page { offset: 0, limit: 100 },
        )
        .await
        .unwrap();
        assert!(all.windows(2).all(|w| w[0].executed_at >= w[1].executed_at));

        assert_eq!(
            command_log_service::count_command_logs(&db, &server.id, Some(CommandSource::Ai))
                .await
                .unwrap(),
            2
        );
    }

    #[tokio::test]
    async fn test_command_log_source_filter() {
        let db = test_db().await;
        let secrets = MemorySecretStore::new();
        let server = server_service::create_server(&db, &secrets, password_server("web", None))
            .await
            .unwrap();

        let sources = [CommandSource::Manual, CommandSource::Manual, CommandSource::Ai];
        for (n, source) in sources.into_iter().enumerate() {
            command_log_service::create_command_log(&db, log_entry(&server.id, n, source))
                .await
                .unwrap();
        }

        let items = command_log_service::list_command_logs(
            &db,
            &server.id,
            Some(CommandSource::Ai),
            Page { offset: 0, limit: 50 },
        )
        .await
        .unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].source, CommandSource::Ai);
        assert_eq!(items[0].command, "echo 2");
    }

    #[tokio::test]
    async fn test_command_log_requires_existing_server() {
        let db = test_db().await;
        let err = command_log_service::create_command_log(
            &db,
            log_entry("missing", 0, CommandSource::Manual),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_command_logs_removed_with_server() {
        let db = test_db().await;
        let secrets = MemorySecretStore::new();
        let server = server_service::create_server(&db, &secrets, password_server("web", None))
            .await
            .unwrap();
        command_log_service::create_command_log(&db, log_entry(&server.id, 0, CommandSource::Ai))
            .await
            .unwrap();

        server_service::delete_server(&db, &secrets, &server.id).await.unwrap();

        assert_eq!(
            command_log_service::count_command_logs(&db, &server.id, None).await.unwrap(),
            0
        );
    }

    // ── Настройки ────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_settings_defaults() {
        let db = test_db().await;
        let secrets = MemorySecretStore::new();
        let defaults = SettingsDefaults::default();

        let snapshot = settings_service::get_all(&db, &secrets, &defaults).await.unwrap();
        assert_eq!(snapshot.model, "claude-sonnet-4-20250514");
        assert_eq!(snapshot.terminal_font, "Monaco");
        assert_eq!(snapshot.theme, "dark");
        assert_eq!(snapshot.max_chat_rounds, "10");
        assert_eq!(snapshot.api_key_masked, "");
    }

    #[tokio::test]
    async fn test_settings_update_and_api_key_removal() {
        let db = test_db().await;
        let secrets = MemorySecretStore::new();
        let defaults = SettingsDefaults::default();

        let snapshot = settings_service::update(
            &db,
            &secrets,
            &defaults,
            SettingsUpdate {
                theme: Some("light".to_string()),
                api_key: Some("sk-ant-abcdef1234".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(snapshot.theme, "light");
        assert_eq!(snapshot.terminal_font, "Monaco");
        assert_eq!(snapshot.api_key_masked, "sk-***1234");
        assert_eq!(
            secrets.get(&SecretKey::ApiKey).await.unwrap().as_deref(),
            Some("sk-ant-abcdef1234")
        );

        // Повторная запись перезаписывает строку настроек
        let snapshot = settings_service::update(
            &db,
            &secrets,
            &defaults,
            SettingsUpdate {
                theme: Some("dark".to_string()),
                api_key: Some(String::new()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(snapshot.theme, "dark");
        assert_eq!(snapshot.api_key_masked, "");
        assert_eq!(secrets.get(&SecretKey::ApiKey).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_settings_not_saved_when_secret_store_fails() {
        let db = test_db().await;
        let defaults = SettingsDefaults::default();

        let err = settings_service::update(
            &db,
            &FailingSecretStore,
            &defaults,
            SettingsUpdate {
                theme: Some("light".to_string()),
                api_key: Some("sk-ant-abcdef1234".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code(), "SECRET_STORE_ERROR");

        let snapshot = settings_service::get_all(&db, &FailingSecretStore, &defaults)
            .await
            .unwrap();
        assert_eq!(snapshot.theme, "dark");
    }

    // ── Конфигурация ─────────────────────────────────────────────────────────

    #[test]
    fn test_secret_store_mode_parse() {
        use crate::config::SecretStoreMode;

        assert_eq!("file".parse::<SecretStoreMode>(), Ok(SecretStoreMode::File));
        assert_eq!("MEMORY".parse::<SecretStoreMode>(), Ok(SecretStoreMode::Memory));
        assert!("keyring".parse::<SecretStoreMode>().is_err());
        assert_eq!(SecretStoreMode::Memory.to_string(), "memory");
    }

    // ── HTTP интеграционные тесты ─────────────────────────────────────────────

    mod integration {
        use super::*;
        use crate::api::{build_router, AppState};
        use axum::body::Body;
        use axum::http::{Request, StatusCode};
        use serde_json::{json, Value};
        use std::sync::Arc;
        use tower::ServiceExt;

        async fn build_test_app() -> (axum::Router, AppState) {
            let state = AppState {
                db: test_db().await,
                secrets: Arc::new(MemorySecretStore::new()),
                settings_defaults: Arc::new(SettingsDefaults::default()),
            };
            let app = build_router(state.clone(), &["http://localhost:5173".to_string()]);
            (app, state)
        }

        async fn send(
            app: &axum::Router,
            method: &str,
            uri: &str,
            body: Option<Value>,
        ) -> (StatusCode, Value) {
            let mut request = Request::builder().method(method).uri(uri);
            let body = match body {
                Some(value) => {
                    request = request.header("content-type", "application/json");
                    Body::from(value.to_string())
                }
                None => Body::empty(),
            };

            let response = app
                .clone()
                .oneshot(request.body(body).unwrap())
                .await
                .unwrap();
            let status = response.status();
            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            let json = if bytes.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&bytes).unwrap()
            };
            (status, json)
        }

        fn server_body() -> Value {
            json!({
                "label": "web",
                "host": "10.0.0.1",
                "username": "root",
                "auth_type": "password",
                "password": "s3cret"
            })
        }

        #[tokio::test]
        async fn test_health_check() {
            let (app, _) = build_test_app().await;
            let (status, body) = send(&app, "GET", "/health", None).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body, json!({ "status": "ok" }));
        }

        #[tokio::test]
        async fn test_routes_live_under_api_prefix() {
            let (app, _) = build_test_app().await;
            let (status, _) = send(&app, "GET", "/groups", None).await;
            assert_eq!(status, StatusCode::NOT_FOUND);
            let (status, body) = send(&app, "GET", "/api/groups", None).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body, json!([]));
        }

        #[tokio::test]
        async fn test_not_found_envelope() {
            let (app, _) = build_test_app().await;
            for uri in ["/api/groups/missing", "/api/keypairs/missing", "/api/servers/missing"] {
                let (status, body) = send(&app, "DELETE", uri, None).await;
                assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
                assert_eq!(body["error"]["code"], "NOT_FOUND");
                assert!(body["error"]["message"].is_string());
            }
        }

        #[tokio::test]
        async fn test_group_crud_over_http() {
            let (app, _) = build_test_app().await;

            let (status, created) = send(
                &app,
                "POST",
                "/api/groups",
                Some(json!({ "name": "Prod", "color": "#00FF00" })),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
            let id = created["id"].as_str().unwrap().to_string();
            assert_eq!(created["sort_order"], 0);

            let uri = format!("/api/groups/{id}");
            let (status, updated) =
                send(&app, "PUT", &uri, Some(json!({ "name": "Staging", "sort_order": 5 }))).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(updated["name"], "Staging");
            assert_eq!(updated["color"], Value::Null);

            let (status, body) = send(&app, "DELETE", &uri, None).await;
            assert_eq!(status, StatusCode::NO_CONTENT);
            assert_eq!(body, Value::Null);

            let (status, _) = send(&app, "GET", &uri, None).await;
            assert_eq!(status, StatusCode::NOT_FOUND);
        }

        #[tokio::test]
        async fn test_group_invalid_input() {
            let (app, _) = build_test_app().await;

            let (status, body) = send(
                &app,
                "POST",
                "/api/groups",
                Some(json!({ "name": "Prod", "color": "red" })),
            )
            .await;
            assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
            assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

            let (status, _) =
                send(&app, "POST", "/api/groups", Some(json!({ "name": "x".repeat(101) }))).await;
            assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

            let (status, body) = send(&app, "POST", "/api/groups", Some(json!({ "name": 5 }))).await;
            assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
            assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        }

        #[tokio::test]
        async fn test_server_invalid_port() {
            let (app, _) = build_test_app().await;
            let mut body = server_body();
            body["port"] = json!(70000);

            let (status, response) = send(&app, "POST", "/api/servers", Some(body)).await;
            assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
            assert_eq!(response["error"]["code"], "VALIDATION_ERROR");
            assert!(response["error"]["detail"].as_str().unwrap().contains("port"));
        }

        #[tokio::test]
        async fn test_server_update_over_http() {
            let (app, _) = build_test_app().await;
            let (_, server) = send(&app, "POST", "/api/servers", Some(server_body())).await;
            let uri = format!("/api/servers/{}", server["id"].as_str().unwrap());

            let mut body = server_body();
            body["group_id"] = json!("nope");
            let (status, response) = send(&app, "PUT", &uri, Some(body)).await;
            assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
            assert_eq!(response["error"]["code"], "VALIDATION_ERROR");

            let mut body = server_body();
            body["label"] = json!("renamed");
            body["password"] = json!("");
            let (status, updated) = send(&app, "PUT", &uri, Some(body)).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(updated["label"], "renamed");
            assert_eq!(updated["created_at"], server["created_at"]);
            assert!(updated.get("password").is_none());
        }

        #[tokio::test]
        async fn test_wildcard_cors_origin_is_skipped() {
            let (_, state) = build_test_app().await;
            let origins = ["*".to_string(), "http://localhost:5173".to_string()];
            let app = build_router(state, &origins);

            let (status, _) = send(&app, "GET", "/health", None).await;
            assert_eq!(status, StatusCode::OK);
        }

        #[tokio::test]
        async fn test_secrets_never_in_responses() {
            let (app, state) = build_test_app().await;

            let (status, key) = send(
                &app,
                "POST",
                "/api/keypairs",
                Some(json!({
                    "label": "id_rsa",
                    "private_key_path": "/home/user/.ssh/id_rsa",
                    "passphrase": "phrase"
                })),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
            assert!(key.get("passphrase").is_none());

            let (status, server) = send(&app, "POST", "/api/servers", Some(server_body())).await;
            assert_eq!(status, StatusCode::CREATED);
            assert!(server.get("password").is_none());
            assert_eq!(server["port"], 22);
            assert_eq!(server["auth_type"], "password");

            let (_, list) = send(&app, "GET", "/api/servers", None).await;
            assert!(!list.to_string().contains("s3cret"));

            let id = server["id"].as_str().unwrap();
            assert_eq!(
                state
                    .secrets
                    .get(&SecretKey::server(id))
                    .await
                    .unwrap()
                    .as_deref(),
                Some("s3cret")
            );
        }

        #[tokio::test]
        async fn test_server_commands_endpoint() {
            let (app, state) = build_test_app().await;
            let (_, server) = send(&app, "POST", "/api/servers", Some(server_body())).await;
            let id = server["id"].as_str().unwrap().to_string();

            for n in 0..5 {
                command_log_service::create_command_log(
                    &state.db,
                    log_entry(&id, n, CommandSource::Manual),
                )
                .await
                .unwrap();
            }

            let uri = format!("/api/servers/{id}/commands?offset=2&limit=2");
            let (status, page) = send(&app, "GET", &uri, None).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(page["items"].as_array().unwrap().len(), 2);
            assert_eq!(page["total"], 5);

            let uri = format!("/api/servers/{id}/commands?source=ai");
            let (_, page) = send(&app, "GET", &uri, None).await;
            assert_eq!(page["total"], 0);

            let uri = format!("/api/servers/{id}/commands?limit=100");
            let (status, _) = send(&app, "GET", &uri, None).await;
            assert_eq!(status, StatusCode::OK);

            let uri = format!("/api/servers/{id}/commands?limit=200");
            let (status, body) = send(&app, "GET", &uri, None).await;
            assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
            assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

            let (status, body) = send(&app, "GET", "/api/servers/missing/commands", None).await;
            assert_eq!(status, StatusCode::NOT_FOUND);
            assert_eq!(body["error"]["code"], "NOT_FOUND");
        }

        #[tokio::test]
        async fn test_settings_over_http() {
            let (app, _) = build_test_app().await;

            let (status, settings) = send(&app, "GET", "/api/settings", None).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(settings["theme"], "dark");
            assert_eq!(settings["api_key_masked"], "");

            let (status, settings) = send(
                &app,
                "PATCH",
                "/api/settings",
                Some(json!({ "api_key": "sk-ant-abcdef1234", "terminal_size": "16" })),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(settings["api_key_masked"], "sk-***1234");
            assert_eq!(settings["terminal_size"], "16");
            assert!(!settings.to_string().contains("sk-ant-abcdef1234"));

            let (status, body) =
                send(&app, "PATCH", "/api/settings", Some(json!({ "theme": "blue" }))).await;
            assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
            assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        }
    }
}
