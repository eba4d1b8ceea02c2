//! Configuration management for TripGenie
//!
//! Parses TOML configuration files and provides typed access to settings.

use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Environment variable that overrides `provider.model`
pub const MODEL_OVERRIDE_ENV: &str = "TRIPGENIE_MODEL";

/// Upper bound for `provider.timeout_seconds`
pub const MAX_TIMEOUT_SECONDS: u64 = 300;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub server: ServerConfig,
    pub provider: ProviderConfig,
    #[serde(default)]
    pub rate_limits: RateLimitsConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    /// Address to bind; `host` must be an IP literal, hostnames are rejected
    pub fn socket_addr(&self) -> AppResult<SocketAddr> {
        let ip = self.host.trim().parse::<IpAddr>().map_err(|_| {
            AppError::Config(format!(
                "server.host '{}' must be an IP address such as 0.0.0.0 or 127.0.0.1",
                self.host
            ))
        })?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Which text-generation backend to call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Groq,
    #[serde(rename = "openai")]
    OpenAi,
    /// Self-hosted OpenAI-compatible server, no API key required
    Local,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Groq => "groq",
            ProviderKind::OpenAi => "openai",
            ProviderKind::Local => "local",
        }
    }

    /// Base URL used when `provider.base_url` is omitted
    pub fn default_base_url(&self) -> Option<&'static str> {
        match self {
            ProviderKind::Groq => Some("https://api.groq.com/openai/v1"),
            ProviderKind::OpenAi => Some("https://api.openai.com/v1"),
            ProviderKind::Local => None,
        }
    }

    /// Hosted providers refuse requests without a bearer token
    pub fn requires_api_key(&self) -> bool {
        !matches!(self, ProviderKind::Local)
    }
}

/// Model provider configuration
///
/// Fields are private so a validated config cannot be mutated afterwards.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderConfig {
    kind: ProviderKind,
    model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    base_url: Option<String>,
    #[serde(default = "default_api_key_env")]
    api_key_env: String,
    #[serde(default = "default_temperature")]
    temperature: f32,
    #[serde(default = "default_max_tokens")]
    max_tokens: u32,
    #[serde(default = "default_timeout_seconds")]
    timeout_seconds: u64,
}

impl ProviderConfig {
    pub fn kind(&self) -> ProviderKind {
        self.kind
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Configured base URL, falling back to the provider default
    pub fn base_url(&self) -> Option<&str> {
        self.base_url
            .as_deref()
            .or_else(|| self.kind.default_base_url())
    }

    /// Name of the environment variable holding the API key
    pub fn api_key_env(&self) -> &str {
        &self.api_key_env
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    pub fn timeout_seconds(&self) -> u64 {
        self.timeout_seconds
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Read the API key from the process environment
    pub fn resolve_api_key(&self) -> AppResult<Option<ApiKey>> {
        self.resolve_api_key_with(|name| std::env::var(name).ok())
    }

    /// Read the API key through `lookup`
    ///
    /// # Errors
    ///
    /// Returns `MissingCredentials` if the provider requires a key and the
    /// variable is unset or blank. For `local` a key is optional.
    pub fn resolve_api_key_with<F>(&self, lookup: F) -> AppResult<Option<ApiKey>>
    where
        F: Fn(&str) -> Option<String>,
    {
        let key = lookup(&self.api_key_env)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .map(ApiKey);

        if key.is_none() && self.kind.requires_api_key() {
            return Err(AppError::MissingCredentials {
                provider: self.kind.as_str().to_string(),
                env_var: self.api_key_env.clone(),
            });
        }
        Ok(key)
    }
}

fn default_api_key_env() -> String {
    "LLAMA_API_KEY".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    2048
}

fn default_timeout_seconds() -> u64 {
    30
}

/// A provider credential
///
/// `Debug` is redacted so the key never reaches a log line.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

/// Fixed-window rate limits, per client IP
///
/// Trip planning and shuffle share the `ai_*` budget.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitsConfig {
    #[serde(default = "default_ai_window")]
    pub ai_window_seconds: u64,
    #[serde(default = "default_ai_max")]
    pub ai_max_requests: u32,
    #[serde(default = "default_chat_window")]
    pub chat_window_seconds: u64,
    #[serde(default = "default_chat_max")]
    pub chat_max_requests: u32,
}

impl RateLimitsConfig {
    pub fn ai_window(&self) -> Duration {
        Duration::from_secs(self.ai_window_seconds)
    }

    pub fn chat_window(&self) -> Duration {
        Duration::from_secs(self.chat_window_seconds)
    }
}

impl Default for RateLimitsConfig {
    fn default() -> Self {
        Self {
            ai_window_seconds: default_ai_window(),
            ai_max_requests: default_ai_max(),
            chat_window_seconds: default_chat_window(),
            chat_max_requests: default_chat_max(),
        }
    }
}

fn default_ai_window() -> u64 {
    15 * 60
}

fn default_ai_max() -> u32 {
    20
}

fn default_chat_window() -> u64 {
    60
}

fn default_chat_max() -> u32 {
    10
}

/// Observability configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Reads, parses, applies environment overrides and validates, with a
    /// distinct error for each phase.
    pub fn from_file<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let path_display = path.as_ref().display().to_string();

        let content = std::fs::read_to_string(path.as_ref()).map_err(|source| {
            AppError::ConfigFileRead {
                path: path_display.clone(),
                source,
            }
        })?;

        let mut config: Self =
            toml::from_str(&content).map_err(|source| AppError::ConfigParseFailed {
                path: path_display.clone(),
                source,
            })?;

        config.apply_env_overrides_with(|name| std::env::var(name).ok());

        config
            .validate()
            .map_err(|e| AppError::ConfigValidationFailed {
                path: path_display,
                reason: e.to_string(),
            })?;

        Ok(config)
    }

    /// Apply overrides looked up through `lookup`
    ///
    /// Only `TRIPGENIE_MODEL` is supported. Blank values are ignored.
    pub fn apply_env_overrides_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(model) = lookup(MODEL_OVERRIDE_ENV)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
        {
            tracing::info!(
                configured = %self.provider.model,
                model = %model,
                "Model overridden by {}",
                MODEL_OVERRIDE_ENV
            );
            self.provider.model = model;
        }
    }

    /// Check every range and cross-field constraint
    pub fn validate(&self) -> AppResult<()> {
        if self.server.host.trim().is_empty() {
            return Err(AppError::Config("server.host cannot be empty".to_string()));
        }
        self.server.socket_addr()?;

        let provider = &self.provider;
        if provider.model.trim().is_empty() {
            return Err(AppError::Config("provider.model cannot be empty".to_string()));
        }

        match provider.base_url() {
            Some(url) if !(url.starts_with("http://") || url.starts_with("https://")) => {
                return Err(AppError::Config(format!(
                    "provider.base_url '{url}' must start with http:// or https://"
                )));
            }
            Some(_) => {}
            None => {
                return Err(AppError::Config(format!(
                    "provider.base_url is required for provider kind '{}'",
                    provider.kind.as_str()
                )));
            }
        }

        if provider.api_key_env.trim().is_empty() {
            return Err(AppError::Config(
                "provider.api_key_env cannot be empty".to_string(),
            ));
        }

        if !provider.temperature.is_finite() || !(0.0..=2.0).contains(&provider.temperature) {
            return Err(AppError::Config(format!(
                "provider.temperature must be between 0.0 and 2.0, got {}",
                provider.temperature
            )));
        }

        if provider.max_tokens == 0 {
            return Err(AppError::Config(
                "provider.max_tokens must be greater than 0".to_string(),
            ));
        }

        if provider.timeout_seconds == 0 || provider.timeout_seconds > MAX_TIMEOUT_SECONDS {
            return Err(AppError::Config(format!(
                "provider.timeout_seconds must be in (0, {MAX_TIMEOUT_SECONDS}], got {}",
                provider.timeout_seconds
            )));
        }

        let limits = &self.rate_limits;
        for (name, value) in [
            ("ai_window_seconds", limits.ai_window_seconds),
            ("ai_max_requests", u64::from(limits.ai_max_requests)),
            ("chat_window_seconds", limits.chat_window_seconds),
            ("chat_max_requests", u64::from(limits.chat_max_requests)),
        ] {
            if value == 0 {
                return Err(AppError::Config(format!(
                    "rate_limits.{name} must be greater than 0"
                )));
            }
        }

        let level = self.observability.log_level.to_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(AppError::Config(format!(
                "observability.log_level '{}' is not one of {}",
                self.observability.log_level,
                LOG_LEVELS.join(", ")
            )));
        }

        Ok(())
    }
}

impl FromStr for Config {
    type Err = AppError;

    fn from_str(toml_str: &str) -> Result<Self, Self::Err> {
        let config: Config =
            toml::from_str(toml_str).map_err(|source| AppError::ConfigParseFailed {
                path: "<string>".to_string(),
                source,
            })?;

        config.validate()?;
        Ok(config)
    }
}
