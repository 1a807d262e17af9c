use std::sync::Arc;

use async_broadcast::{broadcast, Receiver, Sender};

use crate::domain::entities::PlayerId;
use crate::infrastructure::config::{AppConfig, LlmProvider};
use crate::infrastructure::decks::StarterDecks;
use crate::infrastructure::services::{
    AnthropicService, BoardStore, LlmService, OllamaService, ScriptedLlmService,
};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,

    /// The single shared board
    pub board_store: Arc<BoardStore>,

    /// Completion backend for all three agents
    pub llm_service: Arc<dyn LlmService>,

    /// Event broadcaster for SSE
    pub event_sender: Sender<BoardEvent>,
    pub event_receiver: Receiver<BoardEvent>,

    pub started_at: std::time::Instant,
}

impl AppState {
    pub async fn new(config: AppConfig) -> anyhow::Result<Self> {
        let llm_service: Arc<dyn LlmService> = match config.llm_provider {
            LlmProvider::Anthropic => {
                if config.anthropic.api_key.is_none() {
                    anyhow::bail!("ANTHROPIC_API_KEY must be set when LLM_PROVIDER=anthropic");
                }
                Arc::new(AnthropicService::new(config.anthropic.clone())?)
            }
            LlmProvider::Ollama => Arc::new(OllamaService::new(config.ollama.clone())?),
            LlmProvider::Scripted => {
                tracing::warn!("Using scripted LLM replies - agents will not reason");
                Arc::new(ScriptedLlmService::demo())
            }
        };

        if llm_service.health_check().await {
            tracing::info!("LLM service '{}' available", llm_service.name());
        } else {
            tracing::warn!(
                "LLM service '{}' not reachable - turns will fail until it is",
                llm_service.name()
            );
        }

        let decks = StarterDecks::embedded()?;
        let board_store = Arc::new(BoardStore::from_decks(decks, config.deck_seed));

        Ok(Self::with_services(config, llm_service, board_store))
    }

    /// Assemble state from ready-made services
    pub fn with_services(
        config: AppConfig,
        llm_service: Arc<dyn LlmService>,
        board_store: Arc<BoardStore>,
    ) -> Self {
        // Create event broadcaster (capacity of 1000 events)
        let (mut event_sender, event_receiver) = broadcast(1000);
        // Slow subscribers lose the oldest events instead of stalling turns
        event_sender.set_overflow(true);

        Self {
            config,
            board_store,
            llm_service,
            event_sender,
            event_receiver,
            started_at: std::time::Instant::now(),
        }
    }

    /// Broadcast an event to all connected SSE clients
    pub fn broadcast_event(&self, event: BoardEvent) {
        let receiver_count = self.event_sender.receiver_count();
        tracing::debug!(
            "Broadcasting event '{}' to {} receivers",
            event.event_type,
            receiver_count
        );
        match self.event_sender.try_broadcast(event) {
            Ok(None) => {
                tracing::debug!("Event broadcast but no active receivers");
            }
            Ok(Some(_)) => {
                tracing::debug!("Event broadcast successfully with overflow");
            }
            Err(e) => {
                tracing::warn!("Failed to broadcast event: {:?}", e);
            }
        }
    }
}

/// Board change notification for SSE subscribers
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    /// Player number (1 or 2) whose turn caused the change
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player: Option<u8>,
    /// Additional data fields (flattened into root)
    #[serde(flatten)]
    pub data: serde_json::Value,
    pub timestamp: i64,
}

impl BoardEvent {
    pub fn new(event_type: &str, player: Option<PlayerId>) -> Self {
        Self {
            event_type: event_type.to_string(),
            player: player.map(|p| p.number()),
            data: serde_json::Value::Object(serde_json::Map::new()),
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = data;
        self
    }
}
