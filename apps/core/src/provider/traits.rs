use async_trait::async_trait;

use crate::provider::error::ProviderError;

/// Defines the public interface for a hosted large-language-model.
///
/// This trait abstracts the specific backend so the response engine can be
/// driven by a real API client, a test stub, or nothing at all. Implementors
/// make exactly one attempt per call; retries are their own business.
#[async_trait]
pub trait GenerativeProvider: Send + Sync + 'static {
    /// Generates a complete text reply for a fully assembled prompt.
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError>;

    /// Model identifier reported in engine status.
    fn model_name(&self) -> &str;
}
