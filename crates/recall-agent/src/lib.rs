// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session lifecycle and context assembly for recall.
//!
//! A [`SessionManager`] owns one conversation's active memory, runs turns
//! against a generation capability, and flushes everything to the vector
//! store when closed through its [`CloseHandle`].

pub mod context;
pub mod session;
pub mod shutdown;

pub use context::{AssembledContext, ContextAssembler, ContextSettings};
pub use session::{CloseSummary, MemoryStats, SessionManager, SessionState, TurnResult};
pub use shutdown::{CloseHandle, install_signal_handler};
