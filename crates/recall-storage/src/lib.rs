// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence for recall's long-term memory.
//!
//! Provides WAL-mode SQLite storage with embedded migrations, a single-writer
//! concurrency model via `tokio-rusqlite`, and a [`VectorStore`] backend
//! that ranks records by cosine similarity.
//!
//! [`VectorStore`]: recall_core::VectorStore

pub mod database;
pub mod migrations;
pub mod store;

pub use database::Database;
pub use store::SqliteVectorStore;
