//! Single entry point for model calls
//!
//! Enforces the configured timeout, rejects blank completions and records one
//! structured log event and one latency sample per call. No retries.

use super::{CompletionSettings, ProviderError, TextCompletionProvider};
use crate::config::ProviderConfig;
use crate::metrics::Metrics;
use crate::middleware::RequestId;
use std::sync::Arc;
use std::time::{Duration, Instant};

pub struct LlmGateway {
    provider: Arc<dyn TextCompletionProvider>,
    settings: CompletionSettings,
    timeout: Duration,
    metrics: Arc<Metrics>,
}

impl LlmGateway {
    pub fn new(
        provider: Arc<dyn TextCompletionProvider>,
        settings: CompletionSettings,
        timeout: Duration,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            provider,
            settings,
            timeout,
            metrics,
        }
    }

    /// Gateway using the decoding settings and timeout from `config`
    pub fn from_config(
        config: &ProviderConfig,
        provider: Arc<dyn TextCompletionProvider>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self::new(
            provider,
            CompletionSettings::from_config(config),
            config.timeout(),
            metrics,
        )
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn model(&self) -> &str {
        &self.settings.model
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Send `prompt` and return the raw completion text
    ///
    /// # Errors
    ///
    /// `ProviderError::Timeout` when the provider does not answer within the
    /// configured bound, `EmptyCompletion` for blank text, and whatever the
    /// provider itself reports otherwise.
    pub async fn complete(
        &self,
        prompt: &str,
        request_id: RequestId,
    ) -> Result<String, ProviderError> {
        let provider = self.provider.name();
        let started = Instant::now();

        let result =
            match tokio::time::timeout(self.timeout, self.provider.complete(prompt, &self.settings))
                .await
            {
                Ok(Ok(text)) if text.trim().is_empty() => Err(ProviderError::EmptyCompletion {
                    provider: provider.to_string(),
                }),
                Ok(result) => result,
                Err(_elapsed) => Err(ProviderError::Timeout {
                    provider: provider.to_string(),
                    timeout_seconds: self.timeout.as_secs(),
                }),
            };

        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        if let Err(e) = self
            .metrics
            .record_llm_duration(provider, result.is_ok(), elapsed_ms)
        {
            tracing::warn!(error = %e, "Failed to record model latency");
            self.metrics.metrics_recording_failure("record_llm_duration");
        }

        match &result {
            Ok(text) => tracing::info!(
                request_id = %request_id,
                provider,
                model = %self.settings.model,
                prompt_length = prompt.len(),
                response_length = text.len(),
                elapsed_ms = elapsed_ms as u64,
                "Model completion received"
            ),
            Err(e) => tracing::error!(
                request_id = %request_id,
                provider,
                model = %self.settings.model,
                prompt_length = prompt.len(),
                elapsed_ms = elapsed_ms as u64,
                reason = e.reason(),
                error = %e,
                "Model call failed"
            ),
        }

        result
    }
}
