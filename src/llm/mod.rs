//! Text-generation providers
//!
//! Every backend implements [`TextCompletionProvider`]: one prompt in, the
//! text of the single best completion out. [`LlmGateway`] wraps the selected
//! provider with the timeout, logging and latency metrics that apply to all
//! of them.

pub mod gateway;
pub mod local;
pub mod openai;

pub use gateway::LlmGateway;
pub use local::LocalProvider;
pub use openai::OpenAiCompatibleProvider;

use crate::config::{ProviderConfig, ProviderKind};
use crate::error::{AppError, AppResult};
use async_trait::async_trait;
use std::sync::Arc;

/// Decoding settings sent with every completion request
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionSettings {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl CompletionSettings {
    pub fn from_config(config: &ProviderConfig) -> Self {
        Self {
            model: config.model().to_string(),
            temperature: config.temperature(),
            max_tokens: config.max_tokens(),
        }
    }
}

/// Failure talking to the text-generation provider
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProviderError {
    #[error("Request to {provider} timed out after {timeout_seconds} seconds")]
    Timeout {
        provider: String,
        timeout_seconds: u64,
    },

    #[error("Request to {provider} failed: {reason}")]
    Request { provider: String, reason: String },

    #[error("{provider} returned HTTP {status}: {body}")]
    Status {
        provider: String,
        status: u16,
        body: String,
    },

    #[error("{provider} returned no completion text")]
    EmptyCompletion { provider: String },

    #[error("{provider} is misconfigured: {details}")]
    Configuration { provider: String, details: String },
}

impl ProviderError {
    /// Short label for logs
    pub fn reason(&self) -> &'static str {
        match self {
            ProviderError::Timeout { .. } => "timeout",
            ProviderError::Request { .. } => "request_failed",
            ProviderError::Status { .. } => "bad_status",
            ProviderError::EmptyCompletion { .. } => "empty_completion",
            ProviderError::Configuration { .. } => "configuration",
        }
    }
}

/// A backend that turns a prompt into completion text
#[async_trait]
pub trait TextCompletionProvider: Send + Sync {
    /// Provider name used in logs and metric labels
    fn name(&self) -> &str;

    async fn complete(
        &self,
        prompt: &str,
        settings: &CompletionSettings,
    ) -> Result<String, ProviderError>;
}

/// Build the provider selected by `config`
///
/// Credentials are resolved here, once, so a missing key fails startup
/// instead of the first request.
pub fn build_provider(config: &ProviderConfig) -> AppResult<Arc<dyn TextCompletionProvider>> {
    build_provider_with(config, |name| std::env::var(name).ok())
}

/// [`build_provider`] with an explicit environment lookup
pub fn build_provider_with<F>(
    config: &ProviderConfig,
    lookup: F,
) -> AppResult<Arc<dyn TextCompletionProvider>>
where
    F: Fn(&str) -> Option<String>,
{
    let base_url = config.base_url().ok_or_else(|| {
        AppError::Config(format!(
            "provider.base_url is required for provider kind '{}'",
            config.kind().as_str()
        ))
    })?;

    match config.kind() {
        ProviderKind::Groq | ProviderKind::OpenAi => {
            let api_key = config.resolve_api_key_with(lookup)?.ok_or_else(|| {
                AppError::MissingCredentials {
                    provider: config.kind().as_str().to_string(),
                    env_var: config.api_key_env().to_string(),
                }
            })?;
            let provider =
                OpenAiCompatibleProvider::new(config.kind().as_str(), base_url, api_key)
                    .map_err(|e| AppError::Config(e.to_string()))?;
            Ok(Arc::new(provider))
        }
        ProviderKind::Local => Ok(Arc::new(LocalProvider::new(base_url))),
    }
}
