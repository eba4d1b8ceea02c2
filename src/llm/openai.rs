//! OpenAI-compatible chat completions client (Groq, OpenAI)

use super::{CompletionSettings, ProviderError, TextCompletionProvider};
use crate::config::ApiKey;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Characters of an error response body kept in [`ProviderError::Status`]
const ERROR_BODY_CHARS: usize = 300;

/// Calls `{base_url}/chat/completions` with bearer authentication
pub struct OpenAiCompatibleProvider {
    name: String,
    endpoint: String,
    api_key: ApiKey,
    http: reqwest::Client,
}

impl std::fmt::Debug for OpenAiCompatibleProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiCompatibleProvider")
            .field("name", &self.name)
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key)
            .finish_non_exhaustive()
    }
}

impl OpenAiCompatibleProvider {
    pub fn new(
        name: impl Into<String>,
        base_url: &str,
        api_key: ApiKey,
    ) -> Result<Self, ProviderError> {
        let name = name.into();
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| ProviderError::Configuration {
                provider: name.clone(),
                details: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            name,
            api_key,
            http,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<ResponseMessage>,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[async_trait]
impl TextCompletionProvider for OpenAiCompatibleProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(
        &self,
        prompt: &str,
        settings: &CompletionSettings,
    ) -> Result<String, ProviderError> {
        let body = ChatCompletionRequest {
            model: &settings.model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
        };

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(self.api_key.expose())
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Request {
                provider: self.name.clone(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                provider: self.name.clone(),
                status: status.as_u16(),
                body: text.chars().take(ERROR_BODY_CHARS).collect(),
            });
        }

        let parsed: ChatCompletionResponse =
            response.json().await.map_err(|e| ProviderError::Request {
                provider: self.name.clone(),
                reason: format!("invalid completion body: {e}"),
            })?;

        parsed
            .choices
            .into_iter()
            .find_map(|choice| choice.message.and_then(|message| message.content))
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| ProviderError::EmptyCompletion {
                provider: self.name.clone(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_base_url() {
        let provider =
            OpenAiCompatibleProvider::new("groq", "https://api.groq.com/openai/v1/", ApiKey::new("k"))
                .unwrap();
        assert_eq!(
            provider.endpoint(),
            "https://api.groq.com/openai/v1/chat/completions"
        );
    }

    #[test]
    fn test_debug_redacts_key() {
        let provider = OpenAiCompatibleProvider::new(
            "openai",
            "https://api.openai.com/v1",
            ApiKey::new("sk-live-123"),
        )
        .unwrap();
        let debug = format!("{provider:?}");
        assert!(!debug.contains("sk-live-123"));
        assert!(debug.contains("chat/completions"));
    }

    #[test]
    fn test_request_body_shape() {
        let body = ChatCompletionRequest {
            model: "llama-3.3-70b-versatile",
            messages: [ChatMessage {
                role: "user",
                content: "hi",
            }],
            temperature: 0.5,
            max_tokens: 100,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["messages"][0]["role"], "user");
        assert_eq!(value["messages"][0]["content"], "hi");
        assert_eq!(value["max_tokens"], 100);
    }
}
