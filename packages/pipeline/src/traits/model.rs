//! Model trait, the seam in front of the language-model provider.

use async_trait::async_trait;

use crate::error::ModelResult;

/// A structured-extraction capability.
///
/// Implementations wrap a specific provider and handle transport, auth and
/// response envelope parsing. The returned string is the raw completion
/// content; the enrichment client owns fence stripping and JSON validation.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Request a JSON-only completion for `prompt`.
    async fn complete_json(&self, prompt: &str) -> ModelResult<String>;
}
