//! Self-hosted OpenAI-compatible servers via open-agent-sdk
//!
//! Used for LM Studio, llama.cpp or vLLM style endpoints that need no API key.

use super::{CompletionSettings, ProviderError, TextCompletionProvider};
use async_trait::async_trait;
use futures::StreamExt;

const PROVIDER_NAME: &str = "local";

#[derive(Debug, Clone)]
pub struct LocalProvider {
    base_url: String,
}

impl LocalProvider {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl TextCompletionProvider for LocalProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn complete(
        &self,
        prompt: &str,
        settings: &CompletionSettings,
    ) -> Result<String, ProviderError> {
        let options = open_agent::AgentOptions::builder()
            .model(settings.model.as_str())
            .base_url(self.base_url.as_str())
            .max_tokens(settings.max_tokens)
            .temperature(settings.temperature)
            .build()
            .map_err(|e| ProviderError::Configuration {
                provider: PROVIDER_NAME.to_string(),
                details: e.to_string(),
            })?;

        let mut stream = open_agent::query(prompt, &options)
            .await
            .map_err(|e| ProviderError::Request {
                provider: PROVIDER_NAME.to_string(),
                reason: e.to_string(),
            })?;

        let mut response_text = String::new();
        let mut block_count = 0usize;
        while let Some(result) = stream.next().await {
            block_count += 1;
            match result {
                Ok(open_agent::ContentBlock::Text(text_block)) => {
                    response_text.push_str(&text_block.text);
                }
                Ok(other_block) => {
                    tracing::warn!(
                        base_url = %self.base_url,
                        block_type = ?other_block,
                        block_number = block_count,
                        "Skipping non-text content block"
                    );
                }
                Err(e) => {
                    // A partial completion is never usable JSON, so it is discarded
                    return Err(ProviderError::Request {
                        provider: PROVIDER_NAME.to_string(),
                        reason: format!(
                            "stream interrupted after {block_count} blocks ({} chars): {e}",
                            response_text.len()
                        ),
                    });
                }
            }
        }

        Ok(response_text)
    }
}
