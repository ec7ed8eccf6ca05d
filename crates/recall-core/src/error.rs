// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types shared by every recall crate.

use strum::{Display, EnumString, IntoStaticStr};
use thiserror::Error;

/// The primary error type used across all recall traits and core operations.
#[derive(Debug, Error)]
pub enum RecallError {
    /// Invalid configuration, including an embedding dimensionality that does
    /// not match the vector store. Fatal at startup.
    #[error("configuration error: {0}")]
    Config(String),

    /// The embedding capability failed to produce a vector.
    #[error("embedding error: {message}")]
    Embedding {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The vector store backend could not be reached or failed mid-operation.
    #[error("storage error: {source}")]
    StorageConnectivity {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A record the caller required was not present.
    #[error("record not found: {id}")]
    NotFound { id: String },

    /// A record with this id already exists; stores never overwrite.
    #[error("record already exists: {id}")]
    DuplicateRecord { id: String },

    /// The language-model capability failed to produce a response.
    #[error("generation error: {message}")]
    Generation {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A turn was submitted after the session started closing.
    #[error("session is closed to new turns")]
    SessionClosed,

    /// A turn was cancelled by a close request.
    #[error("turn interrupted by close request")]
    Interrupted,

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Coarse classification of a [`RecallError`], used in loss reports and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    Configuration,
    EmbeddingFailure,
    StorageConnectivityFailure,
    StorageNotFound,
    DuplicateRecord,
    GenerationFailure,
    SessionClosed,
    Interrupted,
    Timeout,
    Internal,
}

impl RecallError {
    /// Build an embedding error from a message alone.
    pub fn embedding(message: impl Into<String>) -> Self {
        RecallError::Embedding {
            message: message.into(),
            source: None,
        }
    }

    /// Build a generation error from a message alone.
    pub fn generation(message: impl Into<String>) -> Self {
        RecallError::Generation {
            message: message.into(),
            source: None,
        }
    }

    /// Wrap any backend error as a connectivity failure.
    pub fn storage(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        RecallError::StorageConnectivity {
            source: source.into(),
        }
    }

    /// Returns the classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            RecallError::Config(_) => ErrorKind::Configuration,
            RecallError::Embedding { .. } => ErrorKind::EmbeddingFailure,
            RecallError::StorageConnectivity { .. } => ErrorKind::StorageConnectivityFailure,
            RecallError::NotFound { .. } => ErrorKind::StorageNotFound,
            RecallError::DuplicateRecord { .. } => ErrorKind::DuplicateRecord,
            RecallError::Generation { .. } => ErrorKind::GenerationFailure,
            RecallError::SessionClosed => ErrorKind::SessionClosed,
            RecallError::Interrupted => ErrorKind::Interrupted,
            RecallError::Timeout { .. } => ErrorKind::Timeout,
            RecallError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Whether a storage operation that failed with this error may be retried.
    ///
    /// Only transient backend failures qualify; a duplicate id or a
    /// dimension mismatch will fail the same way again.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RecallError::StorageConnectivity { .. } | RecallError::Timeout { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_are_distinct_for_embedding_and_storage() {
        let embed = RecallError::embedding("model offline");
        let store = RecallError::storage(std::io::Error::other("disk gone"));
        assert_eq!(embed.kind(), ErrorKind::EmbeddingFailure);
        assert_eq!(store.kind(), ErrorKind::StorageConnectivityFailure);
        assert_ne!(embed.kind(), store.kind());
    }

    #[test]
    fn only_transient_errors_are_retryable() {
        assert!(RecallError::storage(std::io::Error::other("x")).is_retryable());
        assert!(
            RecallError::Timeout {
                duration: std::time::Duration::from_millis(5)
            }
            .is_retryable()
        );
        assert!(!RecallError::DuplicateRecord { id: "a".into() }.is_retryable());
        assert!(!RecallError::Config("dim".into()).is_retryable());
        assert!(!RecallError::embedding("x").is_retryable());
    }

    #[test]
    fn kind_renders_snake_case() {
        assert_eq!(ErrorKind::StorageConnectivityFailure.to_string(), "storage_connectivity_failure");
        assert_eq!(ErrorKind::EmbeddingFailure.to_string(), "embedding_failure");
    }

    #[test]
    fn display_includes_detail() {
        let err = RecallError::NotFound { id: "rec-9".into() };
        assert_eq!(err.to_string(), "record not found: rec-9");
    }
}
