// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for recall integration tests.
//!
//! Provides mock adapters and test harness infrastructure for fast,
//! deterministic tests without a running model server.
//!
//! # Components
//!
//! - [`MockEmbedder`] - Deterministic embedder with pinned vectors and failure injection
//! - [`MockGenerator`] - Mock language model with queued responses
//! - [`InMemoryVectorStore`] - Inspectable vector store with failure injection
//! - [`TestHarness`] - A session wired to the mocks

pub mod harness;
pub mod memory_store;
pub mod mock_embedder;
pub mod mock_generator;

pub use harness::{HarnessStore, TestHarness, TestHarnessBuilder};
pub use memory_store::InMemoryVectorStore;
pub use mock_embedder::MockEmbedder;
pub use mock_generator::MockGenerator;
