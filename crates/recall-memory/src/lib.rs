// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Two-tier conversation memory for recall.
//!
//! [`ActiveMemory`] holds the recent window of a session. When it grows past
//! its limit, the [`SpilloverCoordinator`] embeds the oldest messages and
//! writes them to the [`StoreBackend`], which is either a real vector store
//! or the [`NullStore`].

pub mod active;
pub mod backend;
pub mod spillover;

pub use active::ActiveMemory;
pub use backend::{NullStore, StoreBackend, verify_dimensions};
pub use spillover::{
    LossCause, LostMessage, SpillReport, SpilloverCoordinator, SpilloverPolicy, StoredMessage,
    bounded,
};
