// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The active memory buffer: recent messages of one session, in order.

use std::collections::VecDeque;

use recall_core::Message;

/// Ordered buffer of the most recent messages of a session.
///
/// The buffer never rejects an append. Its size bound is enforced by the
/// [`SpilloverCoordinator`](crate::spillover::SpilloverCoordinator), which
/// is the only other code allowed to remove messages.
#[derive(Debug, Default, Clone)]
pub struct ActiveMemory {
    messages: VecDeque<Message>,
}

impl ActiveMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a message to the tail.
    pub fn append(&mut self, message: Message) {
        self.messages.push_back(message);
    }

    /// The last `n` messages, oldest first. Does not mutate the buffer.
    pub fn peek_recent(&self, n: usize) -> Vec<Message> {
        let skip = self.messages.len().saturating_sub(n);
        self.messages.iter().skip(skip).cloned().collect()
    }

    /// Remove and return every message, oldest first.
    pub fn drain(&mut self) -> Vec<Message> {
        self.messages.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Iterate oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    /// Remove the oldest messages until at most `limit` remain.
    pub(crate) fn evict_over(&mut self, limit: usize) -> Vec<Message> {
        let excess = self.messages.len().saturating_sub(limit);
        self.messages.drain(..excess).collect()
    }
}
