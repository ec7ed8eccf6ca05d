// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Generation adapter trait for the language model.

use async_trait::async_trait;

use crate::error::RecallError;
use crate::traits::adapter::PluginAdapter;
use crate::types::GenerationRequest;

/// Adapter that produces an assistant reply from an assembled context.
#[async_trait]
pub trait GenerationAdapter: PluginAdapter {
    /// Generates a single, complete reply.
    async fn generate(&self, request: GenerationRequest) -> Result<String, RecallError>;
}
