// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ollama adapter for recall.
//!
//! [`OllamaClient`] implements both [`EmbeddingAdapter`] and
//! [`GenerationAdapter`] against a local Ollama server.

pub mod client;
pub mod types;

use async_trait::async_trait;
use recall_core::{
    AdapterType, EmbeddingAdapter, EmbeddingInput, EmbeddingOutput, GenerationAdapter,
    GenerationRequest, HealthStatus, PluginAdapter, RecallError,
};

pub use client::OllamaClient;

#[async_trait]
impl PluginAdapter for OllamaClient {
    fn name(&self) -> &str {
        "ollama"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    /// Reported as generation; the same client also serves embeddings.
    fn adapter_type(&self) -> AdapterType {
        AdapterType::Generation
    }

    async fn health_check(&self) -> Result<HealthStatus, RecallError> {
        Ok(match self.ping().await {
            Ok(()) => HealthStatus::Healthy,
            Err(reason) => HealthStatus::Unhealthy(reason),
        })
    }

    async fn shutdown(&self) -> Result<(), RecallError> {
        Ok(())
    }
}

#[async_trait]
impl EmbeddingAdapter for OllamaClient {
    async fn embed(&self, input: EmbeddingInput) -> Result<EmbeddingOutput, RecallError> {
        let embeddings = self.embed_texts(input.texts).await?;
        let dimensions = embeddings.first().map(Vec::len).unwrap_or(0);
        if embeddings.iter().any(|v| v.len() != dimensions) {
            return Err(RecallError::embedding(
                "Ollama returned embeddings of differing dimensions",
            ));
        }
        Ok(EmbeddingOutput {
            embeddings,
            dimensions,
        })
    }
}

#[async_trait]
impl GenerationAdapter for OllamaClient {
    async fn generate(&self, request: GenerationRequest) -> Result<String, RecallError> {
        self.chat(&request).await
    }
}
