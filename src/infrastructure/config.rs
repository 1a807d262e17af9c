//! Environment-driven configuration
//!
//! Every setting has a default; a value that does not parse is logged and
//! the default is used instead.

use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

use crate::application::turn::TurnConfig;
use crate::infrastructure::services::{AnthropicConfig, OllamaConfig};

/// Which completion backend serves the agents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    Anthropic,
    Ollama,
    /// Canned replies, no network
    Scripted,
}

impl FromStr for LlmProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "anthropic" => Ok(LlmProvider::Anthropic),
            "ollama" => Ok(LlmProvider::Ollama),
            "scripted" => Ok(LlmProvider::Scripted),
            other => Err(format!("unknown LLM provider '{}'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    /// Allowed browser origin; any origin when unset
    pub cors_origin: Option<String>,
    pub llm_provider: LlmProvider,
    pub anthropic: AnthropicConfig,
    pub ollama: OllamaConfig,
    pub turn: TurnConfig,
    /// Fixed shuffle seed for reproducible boards
    pub deck_seed: Option<u64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            cors_origin: None,
            llm_provider: LlmProvider::Anthropic,
            anthropic: AnthropicConfig::default(),
            ollama: OllamaConfig::default(),
            turn: TurnConfig::default(),
            deck_seed: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = TurnConfig::default();

        let turn = TurnConfig {
            max_steps: env_or("MAX_TURN_STEPS", defaults.max_steps),
            completion_timeout: Duration::from_secs(env_or(
                "COMPLETION_TIMEOUT_SECS",
                defaults.completion_timeout.as_secs(),
            )),
            completion_retries: env_or("COMPLETION_RETRIES", defaults.completion_retries),
            retry_backoff: defaults.retry_backoff,
            max_mentor_consultations: env_parse("MAX_MENTOR_CONSULTATIONS"),
            max_tokens: env_or("LLM_MAX_TOKENS", defaults.max_tokens),
            temperature: env_or("LLM_TEMPERATURE", defaults.temperature),
        };

        Self {
            port: env_or("PORT", 8000),
            cors_origin: std::env::var("CORS_ORIGIN").ok().filter(|o| !o.is_empty()),
            llm_provider: env_or("LLM_PROVIDER", LlmProvider::Anthropic),
            anthropic: AnthropicConfig::default(),
            ollama: OllamaConfig::default(),
            turn,
            deck_seed: env_parse("DECK_SEED"),
        }
    }
}

fn env_parse<T>(key: &str) -> Option<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Ignoring {}={:?}: {}", key, raw, e);
            None
        }
    }
}

fn env_or<T>(key: &str, default: T) -> T
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    env_parse(key).unwrap_or(default)
}
