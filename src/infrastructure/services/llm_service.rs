//! LLM Service
//!
//! Abstraction for streaming text completions (supports Anthropic and Ollama,
//! plus a scripted service for tests and offline runs)

use std::collections::{HashMap, VecDeque};
use std::pin::Pin;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, Stream, StreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::domain::value_objects::AgentRole;

/// LLM service error
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Timeout")]
    Timeout,
    #[error("Service unavailable")]
    Unavailable,
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },
    #[error("Not configured: {0}")]
    NotConfigured(String),
}

/// Finite, non-restartable sequence of text chunks
pub type CompletionStream = Pin<Box<dyn Stream<Item = Result<String, LlmError>> + Send>>;

/// One completion call
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// Which agent is speaking (providers ignore it; the scripted service keys on it)
    pub role: AgentRole,
    pub system_prompt: String,
    pub user_prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// LLM Service trait
#[async_trait]
pub trait LlmService: Send + Sync {
    /// Start a completion and stream back text chunks
    async fn stream(&self, request: CompletionRequest) -> Result<CompletionStream, LlmError>;

    /// Run a completion to the end and return the full text
    async fn invoke(&self, request: CompletionRequest) -> Result<String, LlmError> {
        let mut chunks = self.stream(request).await?;
        let mut text = String::new();
        while let Some(chunk) = chunks.next().await {
            text.push_str(&chunk?);
        }
        Ok(text)
    }

    /// Check if service is available
    async fn health_check(&self) -> bool;

    fn name(&self) -> &'static str;
}

// ============================================================================
// Anthropic
// ============================================================================

const ANTHROPIC_API_BASE: &str = "https://api.anthropic.com/v1";
const ANTHROPIC_API_VERSION: &str = "2023-06-01";

/// Anthropic service configuration
#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub connect_timeout_secs: u64,
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            api_key: std::env::var("ANTHROPIC_API_KEY").ok().filter(|k| !k.is_empty()),
            model: std::env::var("ANTHROPIC_MODEL")
                .unwrap_or_else(|_| "claude-3-7-sonnet-20250219".to_string()),
            connect_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<AnthropicMessage<'a>>,
    temperature: f32,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum AnthropicStreamEvent {
    ContentBlockDelta {
        delta: AnthropicDelta,
    },
    Error {
        error: AnthropicApiError,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum AnthropicDelta {
    TextDelta {
        text: String,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct AnthropicApiError {
    message: String,
}

/// Anthropic Messages API with server-sent-event streaming
pub struct AnthropicService {
    client: Client,
    config: AnthropicConfig,
}

impl AnthropicService {
    pub fn new(config: AnthropicConfig) -> Result<Self, LlmError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()?;

        info!("AnthropicService initialized (model: {})", config.model);

        Ok(Self { client, config })
    }

    fn api_key(&self) -> Result<&str, LlmError> {
        self.config
            .api_key
            .as_deref()
            .ok_or_else(|| LlmError::NotConfigured("ANTHROPIC_API_KEY is not set".to_string()))
    }
}

#[async_trait]
impl LlmService for AnthropicService {
    async fn stream(&self, request: CompletionRequest) -> Result<CompletionStream, LlmError> {
        let api_key = self.api_key()?;
        let body = AnthropicRequest {
            model: &self.config.model,
            max_tokens: request.max_tokens,
            system: &request.system_prompt,
            messages: vec![AnthropicMessage {
                role: "user",
                content: &request.user_prompt,
            }],
            temperature: request.temperature,
            stream: true,
        };

        debug!(
            "Calling Anthropic API for {} ({} prompt chars)",
            request.role.as_str(),
            request.user_prompt.len()
        );

        let response = self
            .client
            .post(format!("{ANTHROPIC_API_BASE}/messages"))
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_API_VERSION)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            error!("Anthropic API error: {} - {}", status, message);
            return Err(LlmError::Api { status, message });
        }

        // Carry incomplete SSE lines over to the next network chunk
        let chunks = response
            .bytes_stream()
            .scan(String::new(), |buffer, result| {
                let texts = match result {
                    Ok(bytes) => {
                        buffer.push_str(&String::from_utf8_lossy(&bytes));
                        drain_anthropic_events(buffer)
                    }
                    Err(e) => vec![Err(LlmError::Http(e))],
                };
                futures::future::ready(Some(texts))
            })
            .flat_map(stream::iter);

        Ok(Box::pin(chunks))
    }

    async fn health_check(&self) -> bool {
        self.config.api_key.is_some()
    }

    fn name(&self) -> &'static str {
        "anthropic"
    }
}

/// Consume complete `data:` lines from the buffer and return their text deltas
fn drain_anthropic_events(buffer: &mut String) -> Vec<Result<String, LlmError>> {
    let mut texts = Vec::new();

    while let Some(newline_pos) = buffer.find('\n') {
        let line = buffer[..newline_pos].trim_end_matches('\r');

        if let Some(json_str) = line.strip_prefix("data:").map(str::trim) {
            if !json_str.is_empty() && json_str != "[DONE]" {
                match serde_json::from_str::<AnthropicStreamEvent>(json_str) {
                    Ok(AnthropicStreamEvent::ContentBlockDelta {
                        delta: AnthropicDelta::TextDelta { text },
                    }) => texts.push(Ok(text)),
                    Ok(AnthropicStreamEvent::Error { error }) => {
                        texts.push(Err(LlmError::InvalidResponse(error.message)))
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!("Skipping unparseable Anthropic event: {}", e);
                    }
                }
            }
        }

        buffer.drain(..=newline_pos);
    }

    texts
}

// ============================================================================
// Ollama
// ============================================================================

/// Ollama service configuration
#[derive(Debug, Clone)]
pub struct OllamaConfig {
    pub base_url: String,
    pub model: String,
    pub connect_timeout_secs: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: std::env::var("OLLAMA_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:11434".to_string()),
            model: std::env::var("OLLAMA_MODEL").unwrap_or_else(|_| "llama3.2".to_string()),
            connect_timeout_secs: 10,
        }
    }
}

/// Ollama request body
#[derive(Debug, Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    system: &'a str,
    prompt: &'a str,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

/// One NDJSON line of a streaming Ollama response
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    #[serde(default)]
    response: String,
    #[serde(default)]
    error: Option<String>,
}

/// Ollama LLM service implementation
pub struct OllamaService {
    client: Client,
    config: OllamaConfig,
}

impl OllamaService {
    pub fn new(config: OllamaConfig) -> Result<Self, LlmError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()?;

        info!(
            "OllamaService initialized: {} (model: {})",
            config.base_url, config.model
        );

        Ok(Self { client, config })
    }
}

#[async_trait]
impl LlmService for OllamaService {
    async fn stream(&self, request: CompletionRequest) -> Result<CompletionStream, LlmError> {
        let url = format!("{}/api/generate", self.config.base_url);
        let body = OllamaRequest {
            model: &self.config.model,
            system: &request.system_prompt,
            prompt: &request.user_prompt,
            stream: true,
            options: OllamaOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens,
            },
        };

        debug!("Calling Ollama API: {} for {}", url, request.role.as_str());

        let response = self.client.post(&url).json(&body).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            error!("Ollama API error: {} - {}", status, message);
            return Err(LlmError::Api { status, message });
        }

        let chunks = response
            .bytes_stream()
            .scan(String::new(), |buffer, result| {
                let texts = match result {
                    Ok(bytes) => {
                        buffer.push_str(&String::from_utf8_lossy(&bytes));
                        drain_ollama_lines(buffer)
                    }
                    Err(e) => vec![Err(LlmError::Http(e))],
                };
                futures::future::ready(Some(texts))
            })
            .flat_map(stream::iter);

        Ok(Box::pin(chunks))
    }

    async fn health_check(&self) -> bool {
        let url = format!("{}/api/tags", self.config.base_url);

        match self.client.get(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                warn!("Ollama health check failed: {}", e);
                false
            }
        }
    }

    fn name(&self) -> &'static str {
        "ollama"
    }
}

fn drain_ollama_lines(buffer: &mut String) -> Vec<Result<String, LlmError>> {
    let mut texts = Vec::new();

    while let Some(newline_pos) = buffer.find('\n') {
        let line = buffer[..newline_pos].trim();
        if !line.is_empty() {
            match serde_json::from_str::<OllamaResponse>(line) {
                Ok(OllamaResponse {
                    error: Some(message),
                    ..
                }) => texts.push(Err(LlmError::InvalidResponse(message))),
                Ok(line) if !line.response.is_empty() => texts.push(Ok(line.response)),
                Ok(_) => {}
                Err(e) => texts.push(Err(LlmError::InvalidResponse(e.to_string()))),
            }
        }
        buffer.drain(..=newline_pos);
    }

    texts
}

// ============================================================================
// Scripted (tests and offline runs)
// ============================================================================

/// Canned reply for one completion call
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    Text(String),
    /// Fail before producing any output
    Fail(String),
    /// Produce the text, then fail
    FailAfter(String, String),
    /// Never produce anything
    Stall,
}

/// Replies to each role from a queue. The last queued reply repeats.
pub struct ScriptedLlmService {
    scripts: Mutex<HashMap<AgentRole, VecDeque<ScriptedReply>>>,
    requests: Mutex<Vec<CompletionRequest>>,
    chunk_chars: usize,
}

impl ScriptedLlmService {
    pub fn new() -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            requests: Mutex::new(Vec::new()),
            chunk_chars: 12,
        }
    }

    /// Queue text replies for a role
    pub fn with_replies<I, S>(self, role: AgentRole, replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with_script(role, replies.into_iter().map(|r| ScriptedReply::Text(r.into())))
    }

    pub fn with_script<I>(self, role: AgentRole, replies: I) -> Self
    where
        I: IntoIterator<Item = ScriptedReply>,
    {
        self.scripts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entry(role)
            .or_default()
            .extend(replies);
        self
    }

    /// Offline demo: one mentor question, then a final decision the referee accepts
    pub fn demo() -> Self {
        Self::new()
            .with_replies(
                AgentRole::Player,
                [
                    "Should I attack with my active Pokémon or build up my bench first?",
                    "FINAL DECISION: Attack the opponent's active Pokémon with my active Pokémon.",
                ],
            )
            .with_replies(
                AgentRole::Mentor,
                ["Attack now; your bench is already developed."],
            )
            .with_replies(AgentRole::Referee, ["The action was legal."])
    }

    /// Every request received so far, in order
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn request_count(&self, role: AgentRole) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|r| r.role == role)
            .count()
    }

    fn next_reply(&self, role: AgentRole) -> Option<ScriptedReply> {
        let mut scripts = self.scripts.lock().unwrap_or_else(|e| e.into_inner());
        let queue = scripts.get_mut(&role)?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }

    fn chunk(&self, text: &str) -> Vec<Result<String, LlmError>> {
        let chars: Vec<char> = text.chars().collect();
        chars
            .chunks(self.chunk_chars.max(1))
            .map(|c| Ok(c.iter().collect::<String>()))
            .collect()
    }
}

impl Default for ScriptedLlmService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LlmService for ScriptedLlmService {
    async fn stream(&self, request: CompletionRequest) -> Result<CompletionStream, LlmError> {
        let role = request.role;
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request);

        match self.next_reply(role) {
            None => Err(LlmError::Unavailable),
            Some(ScriptedReply::Fail(message)) => Err(LlmError::InvalidResponse(message)),
            Some(ScriptedReply::Text(text)) => Ok(Box::pin(stream::iter(self.chunk(&text)))),
            Some(ScriptedReply::FailAfter(text, message)) => {
                let mut chunks = self.chunk(&text);
                chunks.push(Err(LlmError::InvalidResponse(message)));
                Ok(Box::pin(stream::iter(chunks)))
            }
            Some(ScriptedReply::Stall) => Ok(Box::pin(stream::pending::<Result<String, LlmError>>())),
        }
    }

    async fn health_check(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}
