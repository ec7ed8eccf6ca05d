// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level recall configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. All sections are optional.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RecallConfig {
    /// Agent identity and behavior settings.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Two-tier memory settings.
    #[serde(default)]
    pub memory: MemoryConfig,

    /// SQLite vector store settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Embedding capability settings.
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Local Ollama server settings.
    #[serde(default)]
    pub ollama: OllamaConfig,
}

/// Agent identity and behavior configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Display name of the agent.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Optional system prompt sent ahead of every context.
    #[serde(default)]
    pub system_prompt: Option<String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
            system_prompt: None,
        }
    }
}

fn default_agent_name() -> String {
    "recall".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Which vector store variant backs long-term memory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PersistenceMode {
    /// Records are stored in SQLite and retrievable.
    #[default]
    Real,
    /// Records are accepted and dropped; nothing is ever retrieved.
    Null,
}

/// Which records the context assembler may retrieve.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RetrievalScope {
    /// Records from every past session.
    #[default]
    All,
    /// Only records spilled by the current session.
    Session,
}

/// Two-tier memory configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MemoryConfig {
    /// Maximum number of messages kept in active memory.
    #[serde(default = "default_active_limit")]
    pub active_limit: usize,

    /// Number of recent messages placed in every context.
    #[serde(default = "default_context_messages")]
    pub context_messages: usize,

    /// Number of similar records retrieved per turn.
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Real or null vector store.
    #[serde(default)]
    pub persistence: PersistenceMode,

    /// Retrieval across all sessions or only the current one.
    #[serde(default)]
    pub retrieval_scope: RetrievalScope,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            active_limit: default_active_limit(),
            context_messages: default_context_messages(),
            top_k: default_top_k(),
            persistence: PersistenceMode::default(),
            retrieval_scope: RetrievalScope::default(),
        }
    }
}

fn default_active_limit() -> usize {
    100
}

fn default_context_messages() -> usize {
    6
}

fn default_top_k() -> usize {
    3
}

/// SQLite vector store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,

    /// Upper bound on a single store operation, in milliseconds.
    #[serde(default = "default_op_timeout_ms")]
    pub op_timeout_ms: u64,

    /// Retry a failed store write once before reporting a loss.
    #[serde(default = "default_retry_once")]
    pub retry_once: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
            op_timeout_ms: default_op_timeout_ms(),
            retry_once: default_retry_once(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("recall").join("recall.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("recall.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

fn default_op_timeout_ms() -> u64 {
    5_000
}

fn default_retry_once() -> bool {
    true
}

/// Embedding capability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EmbeddingConfig {
    /// Embedding model served by Ollama.
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Expected vector dimensionality. Checked against the model at startup.
    #[serde(default = "default_dimensions")]
    pub dimensions: usize,

    /// Upper bound on a single embedding call, in milliseconds.
    #[serde(default = "default_embedding_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: default_embedding_model(),
            dimensions: default_dimensions(),
            timeout_ms: default_embedding_timeout_ms(),
        }
    }
}

fn default_embedding_model() -> String {
    "all-minilm".to_string()
}

fn default_dimensions() -> usize {
    384
}

fn default_embedding_timeout_ms() -> u64 {
    10_000
}

/// Local Ollama server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OllamaConfig {
    /// Base URL of the Ollama HTTP API.
    #[serde(default = "default_ollama_url")]
    pub base_url: String,

    /// Chat model used for replies.
    #[serde(default = "default_chat_model")]
    pub model: String,

    /// HTTP timeout for a chat request, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: default_ollama_url(),
            model: default_chat_model(),
            request_timeout_secs: default_request_timeout_secs(),
            temperature: default_temperature(),
        }
    }
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_chat_model() -> String {
    "llama3.1:8b".to_string()
}

fn default_request_timeout_secs() -> u64 {
    300
}

fn default_temperature() -> f32 {
    0.7
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = RecallConfig::default();
        assert_eq!(config.agent.name, "recall");
        assert_eq!(config.memory.active_limit, 100);
        assert_eq!(config.memory.context_messages, 6);
        assert_eq!(config.memory.top_k, 3);
        assert_eq!(config.memory.persistence, PersistenceMode::Real);
        assert_eq!(config.memory.retrieval_scope, RetrievalScope::All);
        assert!(config.storage.database_path.ends_with("recall.db"));
        assert!(config.storage.wal_mode);
        assert_eq!(config.embedding.dimensions, 384);
        assert_eq!(config.ollama.base_url, "http://localhost:11434");
    }

    #[test]
    fn modes_serialize_lowercase() {
        let json = serde_json::to_string(&PersistenceMode::Null).unwrap();
        assert_eq!(json, "\"null\"");
        let scope: RetrievalScope = serde_json::from_str("\"session\"").unwrap();
        assert_eq!(scope, RetrievalScope::Session);
    }
}
