// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for a local Ollama server.
//!
//! Provides [`OllamaClient`], which embeds text through `/api/embed` and
//! generates replies through a non-streaming `/api/chat`.

use std::time::{Duration, Instant};

use recall_config::RecallConfig;
use recall_core::{ContextEntry, GenerationRequest, RecallError};
use tracing::{debug, info};

use crate::types::{
    ApiErrorResponse, ChatMessage, ChatOptions, ChatRequest, ChatResponse, EmbedRequest,
    EmbedResponse,
};

/// Header line for retrieved records appended to a chat.
const RETRIEVED_HEADER: &str = "Relevant messages from earlier conversations:";

/// Which capability a request served, so errors map to the right variant.
#[derive(Debug, Clone, Copy)]
enum Capability {
    Embedding,
    Generation,
}

impl Capability {
    fn error(
        self,
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    ) -> RecallError {
        match self {
            Capability::Embedding => RecallError::Embedding { message, source },
            Capability::Generation => RecallError::Generation { message, source },
        }
    }
}

/// Client for the Ollama HTTP API.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: reqwest::Client,
    base_url: String,
    chat_model: String,
    embedding_model: String,
    temperature: f32,
}

impl OllamaClient {
    /// Creates a client from the `[ollama]` and `[embedding]` sections.
    pub fn new(config: &RecallConfig) -> Result<Self, RecallError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.ollama.request_timeout_secs))
            .build()
            .map_err(|e| RecallError::Config(format!("failed to build HTTP client: {e}")))?;

        info!(
            base_url = %config.ollama.base_url,
            chat_model = %config.ollama.model,
            embedding_model = %config.embedding.model,
            "Ollama client initialized"
        );

        Ok(Self {
            client,
            base_url: config.ollama.base_url.trim_end_matches('/').to_string(),
            chat_model: config.ollama.model.clone(),
            embedding_model: config.embedding.model.clone(),
            temperature: config.ollama.temperature,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn chat_model(&self) -> &str {
        &self.chat_model
    }

    pub fn embedding_model(&self) -> &str {
        &self.embedding_model
    }

    /// Embed each text, returning one vector per input in order.
    pub async fn embed_texts(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, RecallError> {
        let expected = texts.len();
        let request = EmbedRequest {
            model: self.embedding_model.clone(),
            input: texts,
        };
        let response: EmbedResponse = self
            .post_json("/api/embed", &request, Capability::Embedding)
            .await?;

        if response.embeddings.len() != expected {
            return Err(RecallError::embedding(format!(
                "Ollama returned {} embeddings for {expected} inputs",
                response.embeddings.len()
            )));
        }
        Ok(response.embeddings)
    }

    /// Run one non-streaming chat completion.
    pub async fn chat(&self, request: &GenerationRequest) -> Result<String, RecallError> {
        let body = ChatRequest {
            model: self.chat_model.clone(),
            messages: to_chat_messages(request),
            stream: false,
            options: ChatOptions {
                temperature: self.temperature,
            },
        };
        let start = Instant::now();
        let response: ChatResponse = self
            .post_json("/api/chat", &body, Capability::Generation)
            .await?;
        debug!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            done = response.done,
            "chat response received"
        );
        Ok(response.message.content)
    }

    /// Whether the server answers `GET /api/tags`.
    pub async fn ping(&self) -> Result<(), String> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| describe_send_error(&e, &self.base_url))?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(format!("Ollama returned {}", response.status()))
        }
    }

    async fn post_json<B, R>(
        &self,
        endpoint: &str,
        body: &B,
        capability: Capability,
    ) -> Result<R, RecallError>
    where
        B: serde::Serialize + ?Sized,
        R: serde::de::DeserializeOwned,
    {
        let url = format!("{}{endpoint}", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                capability.error(describe_send_error(&e, &self.base_url), Some(Box::new(e)))
            })?;

        let status = response.status();
        debug!(status = %status, endpoint, "Ollama response received");

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<ApiErrorResponse>(&text) {
                Ok(api_err) => format!("Ollama API error ({status}): {}", api_err.error),
                Err(_) => format!("Ollama returned {status}: {text}"),
            };
            return Err(capability.error(message, None));
        }

        let text = response.text().await.map_err(|e| {
            capability.error(
                format!("failed to read Ollama response: {e}"),
                Some(Box::new(e)),
            )
        })?;
        serde_json::from_str(&text).map_err(|e| {
            capability.error(
                format!("failed to parse Ollama response: {e}"),
                Some(Box::new(e)),
            )
        })
    }
}

fn describe_send_error(e: &reqwest::Error, base_url: &str) -> String {
    if e.is_timeout() {
        "request to Ollama timed out".to_string()
    } else if e.is_connect() {
        format!("cannot connect to Ollama at {base_url}. Is Ollama running?")
    } else {
        format!("HTTP request failed: {e}")
    }
}

/// Render a generation request as Ollama chat messages.
///
/// Recent entries keep their roles. Retrieved records follow as one system
/// message so the model can tell them apart from the live conversation.
pub fn to_chat_messages(request: &GenerationRequest) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(request.entries.len() + 2);
    if let Some(prompt) = &request.system_prompt {
        messages.push(ChatMessage {
            role: "system".into(),
            content: prompt.clone(),
        });
    }

    let (retrieved, recent): (Vec<&ContextEntry>, Vec<&ContextEntry>) =
        request.entries.iter().partition(|e| e.is_retrieved());

    messages.extend(recent.into_iter().map(|e| ChatMessage {
        role: e.role.as_str().to_string(),
        content: e.content.clone(),
    }));

    if !retrieved.is_empty() {
        let mut content = String::from(RETRIEVED_HEADER);
        for entry in retrieved {
            content.push_str(&format!("\n- {}: {}", entry.role, entry.content));
        }
        messages.push(ChatMessage {
            role: "system".into(),
            content,
        });
    }
    messages
}
