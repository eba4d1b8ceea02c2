//! Command-line interface for TripGenie
//!
//! Provides argument parsing and subcommand handling for the TripGenie binary.

use clap::{Parser, Subcommand};

/// Travel-planning API backed by a text-generation model
#[derive(Parser)]
#[command(name = "tripgenie")]
#[command(version)]
#[command(about = "Travel-planning API backed by a text-generation model")]
#[command(
    long_about = "TripGenie builds itineraries, replacement suggestions and travel chat \
    replies by prompting a text-generation provider and validating what it returns."
)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml", global = true)]
    pub config: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Generate a template configuration file
    Config {
        /// Output file path (prints to stdout if not specified)
        #[arg(short, long)]
        output: Option<String>,
    },
}

/// Generate template configuration content
pub fn generate_config_template() -> &'static str {
    r#"# TripGenie Configuration
# ========================
#
# This file configures the HTTP server, the text-generation provider,
# per-IP rate limits and logging.

# ─────────────────────────────────────────────────────────────────────────────
# SERVER CONFIGURATION
# ─────────────────────────────────────────────────────────────────────────────

[server]
# IP address to bind to (0.0.0.0 for all interfaces, 127.0.0.1 for localhost only)
host = "0.0.0.0"

# Port to listen on
port = 3000

# ─────────────────────────────────────────────────────────────────────────────
# PROVIDER
# ─────────────────────────────────────────────────────────────────────────────
#
# kind:
#   - "groq":   Groq hosted models (needs an API key)
#   - "openai": OpenAI or any hosted OpenAI-compatible API (needs an API key)
#   - "local":  Self-hosted OpenAI-compatible server such as Ollama or
#               LM Studio (no key, base_url required)
#
# The API key is read once at startup from the environment variable named by
# api_key_env. TRIPGENIE_MODEL, when set, overrides `model`.

[provider]
kind = "groq"
model = "llama-3.3-70b-versatile"

# Defaults: groq -> https://api.groq.com/openai/v1, openai -> https://api.openai.com/v1
# base_url = "http://localhost:11434/v1"

api_key_env = "LLAMA_API_KEY"

# Sampling temperature (0.0-2.0)
temperature = 0.7

# Maximum tokens to generate per completion
max_tokens = 2048

# Upper bound on one model call, 1-300 seconds
timeout_seconds = 30

# ─────────────────────────────────────────────────────────────────────────────
# RATE LIMITS
# ─────────────────────────────────────────────────────────────────────────────
#
# Fixed windows per client IP. Trip planning and shuffle share the ai_* budget.

[rate_limits]
ai_window_seconds = 900
ai_max_requests = 20
chat_window_seconds = 60
chat_max_requests = 10

# ─────────────────────────────────────────────────────────────────────────────
# OBSERVABILITY
# ─────────────────────────────────────────────────────────────────────────────

[observability]
# Log level: "trace", "debug", "info", "warn", "error"
# RUST_LOG takes precedence when set
log_level = "info"

# Prometheus metrics are always available at /metrics on the server port
"#
}
