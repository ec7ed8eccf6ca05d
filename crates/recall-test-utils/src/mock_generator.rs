// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock language model for deterministic testing.
//!
//! Replies are popped from a FIFO queue. When the queue is empty, a default
//! "mock response" is returned. Every request is recorded for assertions.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use recall_core::{
    AdapterType, GenerationAdapter, GenerationRequest, HealthStatus, PluginAdapter, RecallError,
};
use tokio::sync::{Mutex, Notify};

/// A mock generator that returns pre-configured replies.
pub struct MockGenerator {
    responses: Arc<Mutex<VecDeque<String>>>,
    requests: Arc<Mutex<Vec<GenerationRequest>>>,
    fail_next: AtomicUsize,
    hang: AtomicBool,
    started: Notify,
}

impl MockGenerator {
    pub fn new() -> Self {
        Self::with_responses(Vec::new())
    }

    /// Create a generator pre-loaded with the given replies.
    pub fn with_responses(responses: Vec<String>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::from(responses))),
            requests: Arc::new(Mutex::new(Vec::new())),
            fail_next: AtomicUsize::new(0),
            hang: AtomicBool::new(false),
            started: Notify::new(),
        }
    }

    /// Add a reply to the end of the queue.
    pub async fn add_response(&self, text: impl Into<String>) {
        self.responses.lock().await.push_back(text.into());
    }

    /// Fail the next `n` generations.
    pub fn fail_next(&self, n: usize) {
        self.fail_next.store(n, Ordering::SeqCst);
    }

    /// Never finish a generation. Used to test cancellation.
    pub fn hang(&self) {
        self.hang.store(true, Ordering::SeqCst);
    }

    /// Resolves once a generation has started.
    pub async fn wait_started(&self) {
        self.started.notified().await;
    }

    /// Every request received so far.
    pub async fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().await.clone()
    }

    async fn next_response(&self) -> String {
        self.responses
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| "mock response".to_string())
    }
}

impl Default for MockGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockGenerator {
    fn name(&self) -> &str {
        "mock-generator"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Generation
    }

    async fn health_check(&self) -> Result<HealthStatus, RecallError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), RecallError> {
        Ok(())
    }
}

#[async_trait]
impl GenerationAdapter for MockGenerator {
    async fn generate(&self, request: GenerationRequest) -> Result<String, RecallError> {
        self.requests.lock().await.push(request);
        self.started.notify_one();

        if self.hang.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }

        let scripted = self
            .fail_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if scripted {
            return Err(RecallError::generation("scripted generation failure"));
        }
        Ok(self.next_response().await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_request() -> GenerationRequest {
        GenerationRequest {
            system_prompt: None,
            entries: Vec::new(),
        }
    }

    #[tokio::test]
    async fn replies_in_order_then_default() {
        let generator = MockGenerator::with_responses(vec!["one".into(), "two".into()]);
        assert_eq!(generator.generate(empty_request()).await.unwrap(), "one");
        assert_eq!(generator.generate(empty_request()).await.unwrap(), "two");
        assert_eq!(
            generator.generate(empty_request()).await.unwrap(),
            "mock response"
        );
        assert_eq!(generator.requests().await.len(), 3);
    }

    #[tokio::test]
    async fn scripted_failure_is_a_generation_error() {
        let generator = MockGenerator::new();
        generator.fail_next(1);
        let err = generator.generate(empty_request()).await.unwrap_err();
        assert_eq!(err.kind(), recall_core::ErrorKind::GenerationFailure);
    }
}
