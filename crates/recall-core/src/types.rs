// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation and storage types shared across recall crates.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of capability an adapter provides.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Embedding,
    Generation,
    VectorStore,
}

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Convert to string for storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    /// Parse from a stored string. `chatbot` is the legacy assistant label.
    /// Any other label is read as assistant output and logged.
    pub fn from_str_value(s: &str) -> Self {
        match s {
            "user" => Role::User,
            "assistant" | "chatbot" => Role::Assistant,
            other => {
                tracing::warn!(role = %other, "unrecognized role label, reading as assistant");
                Role::Assistant
            }
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Render a timestamp in the fixed-width form used for storage, so that
/// lexicographic order equals temporal order.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Parse a stored RFC 3339 timestamp.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// One turn of conversation. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    id: String,
    role: Role,
    content: String,
    timestamp: DateTime<Utc>,
    session_id: String,
}

impl Message {
    /// Create a message stamped with a fresh id and the current time.
    pub fn new(role: Role, content: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
            session_id: session_id.into(),
        }
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self::new(Role::User, content, session_id)
    }

    /// Create an assistant message.
    pub fn assistant(content: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content, session_id)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }
}

/// Metadata persisted alongside every vector record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordMetadata {
    pub role: Role,
    /// When the source message was created.
    pub timestamp: DateTime<Utc>,
    pub session_id: String,
    /// Id of the message this record was spilled from, if any.
    pub message_id: Option<String>,
}

impl RecordMetadata {
    /// Metadata describing a conversation message.
    pub fn from_message(message: &Message) -> Self {
        Self {
            role: message.role(),
            timestamp: message.timestamp(),
            session_id: message.session_id().to_string(),
            message_id: Some(message.id().to_string()),
        }
    }
}

/// A record submitted to a vector store. The store assigns an id when
/// `id` is `None` and stamps `created_at`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRecord {
    pub id: Option<String>,
    pub embedding: Vec<f32>,
    pub text: String,
    pub metadata: RecordMetadata,
}

impl NewRecord {
    /// Build a record for a spilled message.
    pub fn from_message(message: &Message, embedding: Vec<f32>) -> Self {
        Self {
            id: None,
            embedding,
            text: message.content().to_string(),
            metadata: RecordMetadata::from_message(message),
        }
    }
}

/// A persisted, retrievable unit. Immutable once stored.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorRecord {
    id: String,
    embedding: Vec<f32>,
    text: String,
    metadata: RecordMetadata,
    created_at: DateTime<Utc>,
}

impl VectorRecord {
    /// Assemble a record from its stored parts.
    pub fn from_parts(
        id: String,
        embedding: Vec<f32>,
        text: String,
        metadata: RecordMetadata,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            embedding,
            text,
            metadata,
            created_at,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn embedding(&self) -> &[f32] {
        &self.embedding
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn metadata(&self) -> &RecordMetadata {
        &self.metadata
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Restricts query and list candidates before ranking.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordFilter {
    pub session_id: Option<String>,
    pub role: Option<Role>,
}

impl RecordFilter {
    /// Filter matching a single session.
    pub fn session(session_id: impl Into<String>) -> Self {
        Self {
            session_id: Some(session_id.into()),
            role: None,
        }
    }

    /// Whether a record passes this filter.
    pub fn matches(&self, record: &VectorRecord) -> bool {
        let meta = record.metadata();
        self.session_id
            .as_deref()
            .is_none_or(|sid| meta.session_id == sid)
            && self.role.is_none_or(|role| meta.role == role)
    }
}

/// A record with its similarity score from a query.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredRecord {
    pub record: VectorRecord,
    /// Cosine similarity to the query embedding.
    pub score: f32,
}

/// Descriptive information about a vector store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreInfo {
    /// Backend name, e.g. `sqlite` or `null`.
    pub backend: String,
    /// Where the data lives, if anywhere.
    pub location: Option<String>,
    /// Fixed embedding dimensionality, if known.
    pub dimension: Option<usize>,
    /// Whether stored records become queryable.
    pub persistent: bool,
}

/// Input for an embedding adapter.
#[derive(Debug, Clone)]
pub struct EmbeddingInput {
    pub texts: Vec<String>,
}

/// Output from an embedding adapter.
#[derive(Debug, Clone)]
pub struct EmbeddingOutput {
    /// One vector per input text, in input order.
    pub embeddings: Vec<Vec<f32>>,
    pub dimensions: usize,
}

/// Where a context entry came from.
#[derive(Debug, Clone, PartialEq)]
pub enum ContextSource {
    /// One of the most recent active-memory messages.
    Recent { message_id: String },
    /// A record retrieved from the vector store by similarity.
    Retrieved { record_id: String, score: f32 },
}

/// One entry of the assembled model context.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextEntry {
    pub role: Role,
    pub content: String,
    pub source: ContextSource,
}

impl ContextEntry {
    pub fn is_retrieved(&self) -> bool {
        matches!(self.source, ContextSource::Retrieved { .. })
    }
}

/// A request to the language-model capability.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub system_prompt: Option<String>,
    /// Recent messages oldest to newest, followed by retrieved records.
    pub entries: Vec<ContextEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(session: &str, role: Role) -> VectorRecord {
        VectorRecord::from_parts(
            "r1".into(),
            vec![1.0, 0.0],
            "hello".into(),
            RecordMetadata {
                role,
                timestamp: Utc::now(),
                session_id: session.into(),
                message_id: None,
            },
            Utc::now(),
        )
    }

    #[test]
    fn role_parses_legacy_chatbot_label() {
        assert_eq!(Role::from_str_value("user"), Role::User);
        assert_eq!(Role::from_str_value("assistant"), Role::Assistant);
        assert_eq!(Role::from_str_value("chatbot"), Role::Assistant);
        assert_eq!(Role::User.to_string(), "user");
    }

    #[test]
    #[tracing_test::traced_test]
    fn unknown_role_label_is_logged() {
        assert_eq!(Role::from_str_value(""), Role::Assistant);
        assert!(logs_contain("unrecognized role label"));
    }

    #[test]
    #[tracing_test::traced_test]
    fn known_role_labels_are_silent() {
        Role::from_str_value("chatbot");
        Role::from_str_value("user");
        assert!(!logs_contain("unrecognized role label"));
    }

    #[test]
    fn messages_get_unique_ids() {
        let a = Message::user("hi", "s1");
        let b = Message::user("hi", "s1");
        assert_ne!(a.id(), b.id());
        assert_eq!(a.session_id(), "s1");
        assert_eq!(a.role(), Role::User);
    }

    #[test]
    fn new_record_carries_message_metadata() {
        let msg = Message::assistant("answer", "s2");
        let rec = NewRecord::from_message(&msg, vec![0.5, 0.5]);
        assert!(rec.id.is_none());
        assert_eq!(rec.text, "answer");
        assert_eq!(rec.metadata.role, Role::Assistant);
        assert_eq!(rec.metadata.session_id, "s2");
        assert_eq!(rec.metadata.message_id.as_deref(), Some(msg.id()));
        assert_eq!(rec.metadata.timestamp, msg.timestamp());
    }

    #[test]
    fn filter_matches_on_session_and_role() {
        let rec = record("s1", Role::User);
        assert!(RecordFilter::default().matches(&rec));
        assert!(RecordFilter::session("s1").matches(&rec));
        assert!(!RecordFilter::session("s2").matches(&rec));
        let by_role = RecordFilter {
            session_id: None,
            role: Some(Role::Assistant),
        };
        assert!(!by_role.matches(&rec));
    }

    #[test]
    fn timestamps_sort_lexicographically() {
        let early = parse_timestamp("2026-03-01T00:00:00.000001Z").unwrap();
        let late = parse_timestamp("2026-03-01T00:00:00.000010Z").unwrap();
        let (a, b) = (format_timestamp(&early), format_timestamp(&late));
        assert!(a < b);
        assert_eq!(parse_timestamp(&a), Some(early));
    }

    #[test]
    fn timestamps_keep_nanoseconds() {
        let ts = parse_timestamp("2026-10-18T10:52:13.403558028Z").unwrap();
        let text = format_timestamp(&ts);
        assert_eq!(text, "2026-10-18T10:52:13.403558028Z");
        assert_eq!(parse_timestamp(&text), Some(ts));
        assert_eq!(format_timestamp(&Utc::now()).len(), text.len());
    }
}
