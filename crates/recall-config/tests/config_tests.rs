// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the recall configuration system.

use figment::Jail;
use recall_config::diagnostic::ConfigError;
use recall_config::{
    PersistenceMode, RetrievalScope, load_and_validate_path, load_and_validate_str,
    load_config_from_path, load_config_from_str,
};

#[test]
fn valid_toml_deserializes_into_recall_config() {
    let toml = r#"
[agent]
name = "helper"
log_level = "debug"
system_prompt = "Be brief."

[memory]
active_limit = 3
context_messages = 2
top_k = 5
persistence = "null"
retrieval_scope = "session"

[storage]
database_path = "/tmp/recall-test.db"
wal_mode = false
op_timeout_ms = 250
retry_once = false

[embedding]
model = "nomic-embed-text"
dimensions = 768
timeout_ms = 2000

[ollama]
base_url = "http://127.0.0.1:11434"
model = "mistral"
request_timeout_secs = 60
temperature = 0.2
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.agent.name, "helper");
    assert_eq!(config.agent.system_prompt.as_deref(), Some("Be brief."));
    assert_eq!(config.memory.active_limit, 3);
    assert_eq!(config.memory.context_messages, 2);
    assert_eq!(config.memory.top_k, 5);
    assert_eq!(config.memory.persistence, PersistenceMode::Null);
    assert_eq!(config.memory.retrieval_scope, RetrievalScope::Session);
    assert_eq!(config.storage.database_path, "/tmp/recall-test.db");
    assert!(!config.storage.wal_mode);
    assert_eq!(config.storage.op_timeout_ms, 250);
    assert!(!config.storage.retry_once);
    assert_eq!(config.embedding.dimensions, 768);
    assert_eq!(config.ollama.model, "mistral");
    assert!((config.ollama.temperature - 0.2).abs() < f32::EPSILON);
}

#[test]
fn partial_section_keeps_defaults() {
    let config = load_config_from_str("[memory]\nactive_limit = 7\n").unwrap();
    assert_eq!(config.memory.active_limit, 7);
    assert_eq!(config.memory.context_messages, 6);
    assert_eq!(config.memory.top_k, 3);
}

#[test]
fn unknown_key_gets_a_suggestion() {
    let errors = load_and_validate_str("[memory]\nactve_limit = 4\n").unwrap_err();
    assert_eq!(errors.len(), 1);
    match &errors[0] {
        ConfigError::UnknownKey {
            key, suggestion, ..
        } => {
            assert_eq!(key, "actve_limit");
            assert_eq!(suggestion.as_deref(), Some("active_limit"));
        }
        other => panic!("expected UnknownKey, got {other:?}"),
    }
}

#[test]
fn negative_limit_is_rejected() {
    let errors = load_and_validate_str("[memory]\nactive_limit = -1\n").unwrap_err();
    assert!(
        matches!(errors[0], ConfigError::InvalidType { .. }),
        "got {:?}",
        errors[0]
    );
}

#[test]
fn unknown_persistence_mode_is_rejected() {
    let errors = load_and_validate_str("[memory]\npersistence = \"cloud\"\n").unwrap_err();
    assert!(!errors.is_empty());
}

#[test]
fn validation_errors_surface_from_str_loader() {
    let errors = load_and_validate_str("[embedding]\ndimensions = 0\n").unwrap_err();
    assert!(matches!(errors[0], ConfigError::Validation { .. }));
}

#[test]
fn env_vars_override_file_values() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "custom.toml",
            r#"
[memory]
active_limit = 10
"#,
        )?;
        jail.set_env("RECALL_MEMORY_ACTIVE_LIMIT", "42");
        jail.set_env("RECALL_OLLAMA_BASE_URL", "http://ollama.internal:11434");
        jail.set_env("RECALL_STORAGE_RETRY_ONCE", "false");

        let config = load_config_from_path(std::path::Path::new("custom.toml"))?;
        assert_eq!(config.memory.active_limit, 42);
        assert_eq!(config.ollama.base_url, "http://ollama.internal:11434");
        assert!(!config.storage.retry_once);
        Ok(())
    });
}

#[test]
fn explicit_missing_file_is_an_error() {
    Jail::expect_with(|_jail| {
        let errors = load_and_validate_path(std::path::Path::new("nope.toml")).unwrap_err();
        assert!(errors[0].to_string().contains("nope.toml"));
        Ok(())
    });
}

#[test]
fn explicit_file_validates() {
    Jail::expect_with(|jail| {
        jail.create_file("recall.toml", "[ollama]\ntemperature = 9.0\n")?;
        let errors = load_and_validate_path(std::path::Path::new("recall.toml")).unwrap_err();
        assert!(errors[0].to_string().contains("ollama.temperature"));
        Ok(())
    });
}
