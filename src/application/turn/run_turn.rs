//! The Player / Mentor / Referee turn loop
//!
//! ```text
//! Player --question--> Mentor --> Player
//! Player --FINAL DECISION--> Referee --illegal--> Player
//!                            Referee --legal--> done
//! ```
//!
//! Every node execution is one step. A turn that has not reached a legal
//! ruling after `max_steps` steps stops with `hit_step_limit` set.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::events::{FenceFilter, TurnEvent, TurnEvents};
use super::prompts::{self, Prompt};
use crate::domain::entities::{BoardState, PlayerId};
use crate::domain::services::{
    apply_state_update, catalog_for_view, project_view, referee_view, PlayerDecision,
    RefereeVerdict, StateUpdate,
};
use crate::domain::value_objects::{AgentRole, ConversationState, TurnResult};
use crate::infrastructure::services::{CompletionRequest, LlmError, LlmService};

/// Turn loop tuning
#[derive(Debug, Clone)]
pub struct TurnConfig {
    /// Ceiling on node executions per turn
    pub max_steps: usize,
    /// Wall-clock limit for one completion, including streaming
    pub completion_timeout: Duration,
    /// Extra attempts for a completion that failed before producing output
    pub completion_retries: u32,
    /// Delay before retry n is n times this
    pub retry_backoff: Duration,
    /// Once the Player has asked this many questions it must decide.
    /// `None` leaves the Player free to keep asking.
    pub max_mentor_consultations: Option<usize>,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for TurnConfig {
    fn default() -> Self {
        Self {
            max_steps: 500,
            completion_timeout: Duration::from_secs(120),
            completion_retries: 2,
            retry_backoff: Duration::from_millis(500),
            max_mentor_consultations: None,
            max_tokens: 4096,
            temperature: 0.3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Player,
    Mentor,
    Referee,
}

impl Stage {
    fn role(self) -> AgentRole {
        match self {
            Stage::Player => AgentRole::Player,
            Stage::Mentor => AgentRole::Mentor,
            Stage::Referee => AgentRole::Referee,
        }
    }
}

enum Transition {
    Next(Stage),
    Done,
}

/// Run one turn for one player
pub struct RunTurn {
    llm: Arc<dyn LlmService>,
    config: TurnConfig,
}

impl RunTurn {
    pub fn new(llm: Arc<dyn LlmService>, config: TurnConfig) -> Self {
        Self { llm, config }
    }

    /// Drive the turn to a legal ruling or the step ceiling
    ///
    /// `board` is only written when the Referee approves an action and its
    /// state update merges cleanly. Completion failures never escape; they
    /// become illegal rulings and the loop continues.
    pub async fn execute(
        &self,
        board: &mut BoardState,
        player: PlayerId,
        events: &TurnEvents,
    ) -> TurnResult {
        let turn_id = Uuid::new_v4().to_string();
        info!("Turn {} started for {}", turn_id, player.as_str());

        let view = match project_view(board, player) {
            Ok(view) => view,
            Err(e) => {
                error!("Turn {}: board data error: {}", turn_id, e);
                let explanation = format!("Board data error: {}", e);
                events.emit(TurnEvent::Verdict {
                    is_legal: false,
                    explanation: explanation.clone(),
                });
                let result = TurnResult {
                    turn_id,
                    player,
                    action: String::new(),
                    is_legal: false,
                    explanation,
                    updated_state: referee_view(board, player),
                    conversation: Vec::new(),
                    hit_step_limit: false,
                    steps: 0,
                };
                events.emit(TurnEvent::Finished(Box::new(result.clone())));
                return result;
            }
        };

        let mut conversation = ConversationState::new(view);
        let mut stage = Stage::Player;
        let mut steps = 0;
        let mut completed = false;

        while steps < self.config.max_steps {
            steps += 1;
            debug!("Turn {} step {}: {}", turn_id, steps, stage.role().as_str());
            events.emit(TurnEvent::StageStarted(stage.role()));

            let transition = match stage {
                Stage::Player => self.player_step(board, player, &mut conversation, events).await,
                Stage::Mentor => self.mentor_step(board, &mut conversation, events).await,
                Stage::Referee => {
                    self.referee_step(board, player, &mut conversation, events)
                        .await
                }
            };

            match transition {
                Transition::Next(next) => stage = next,
                Transition::Done => {
                    completed = true;
                    break;
                }
            }
        }

        let hit_step_limit = !completed;
        let explanation = if hit_step_limit {
            warn!(
                "Turn {} hit the step limit ({}) without a legal action",
                turn_id, self.config.max_steps
            );
            events.status(format!("Step limit of {} reached", self.config.max_steps));
            if conversation.decision_explanation.is_empty() {
                format!(
                    "Step limit of {} reached before a legal action was found",
                    self.config.max_steps
                )
            } else {
                conversation.decision_explanation.clone()
            }
        } else {
            conversation.decision_explanation.clone()
        };

        let result = TurnResult {
            turn_id,
            player,
            action: conversation.player_action.clone(),
            is_legal: completed && conversation.decision_is_legal,
            explanation,
            updated_state: referee_view(board, player),
            conversation: conversation.transcript,
            hit_step_limit,
            steps,
        };

        info!(
            "Turn {} finished after {} steps (legal: {}, step limit: {})",
            result.turn_id, result.steps, result.is_legal, result.hit_step_limit
        );
        events.emit(TurnEvent::Finished(Box::new(result.clone())));
        result
    }

    async fn player_step(
        &self,
        board: &BoardState,
        player: PlayerId,
        conversation: &mut ConversationState,
        events: &TurnEvents,
    ) -> Transition {
        // The board may have been the subject of a rejected update; re-derive
        match project_view(board, player) {
            Ok(view) => conversation.view = view,
            Err(e) => {
                error!("Board data error: {}", e);
                conversation.record_verdict(false, format!("Board data error: {}", e));
                self.emit_verdict(conversation, events);
                return Transition::Done;
            }
        }

        let must_decide = self
            .config
            .max_mentor_consultations
            .is_some_and(|limit| conversation.mentor_consultations >= limit);

        let catalog = catalog_for_view(&conversation.view, &board.card_map);
        let prompt = prompts::player_prompt(conversation, &catalog, must_decide);

        let text = match self.complete(AgentRole::Player, prompt, events).await {
            Ok(text) => text,
            Err(e) => return self.stage_failed(e, conversation, events),
        };

        let decision = PlayerDecision::decode(&text);
        let is_final = decision.is_final();
        conversation.record_player(decision.into_text(), is_final);

        if is_final {
            Transition::Next(Stage::Referee)
        } else if must_decide {
            events.status("Mentor consultation limit reached, asking the player to decide");
            Transition::Next(Stage::Player)
        } else {
            Transition::Next(Stage::Mentor)
        }
    }

    async fn mentor_step(
        &self,
        board: &BoardState,
        conversation: &mut ConversationState,
        events: &TurnEvents,
    ) -> Transition {
        let catalog = catalog_for_view(&conversation.view, &board.card_map);
        let prompt = prompts::mentor_prompt(conversation, &catalog);

        match self.complete(AgentRole::Mentor, prompt, events).await {
            Ok(text) => {
                conversation.record_mentor(text);
                Transition::Next(Stage::Player)
            }
            Err(e) => self.stage_failed(e, conversation, events),
        }
    }

    async fn referee_step(
        &self,
        board: &mut BoardState,
        player: PlayerId,
        conversation: &mut ConversationState,
        events: &TurnEvents,
    ) -> Transition {
        let view = referee_view(board, player);
        let prompt = prompts::referee_prompt(&view, &board.card_map, &conversation.player_action);

        let text = match self.complete(AgentRole::Referee, prompt, events).await {
            Ok(text) => text,
            Err(e) => return self.stage_failed(e, conversation, events),
        };

        let transition = match RefereeVerdict::decode(&text) {
            RefereeVerdict::Illegal { reason } => {
                info!("Referee rejected action: {}", reason);
                conversation.record_verdict(false, reason);
                conversation.final_decision = false;
                Transition::Next(Stage::Player)
            }
            RefereeVerdict::Legal { update, note } => match update {
                StateUpdate::Proposed(value) => match apply_state_update(board, player, &value) {
                    Ok(merged) => {
                        for id in merged.overfull_benches() {
                            warn!("Bench of {} is over the limit after update", id.as_str());
                        }
                        *board = merged;
                        conversation.record_verdict(true, note);
                        Transition::Done
                    }
                    Err(e) => {
                        warn!("Referee state update rejected: {}", e);
                        conversation.record_verdict(false, format!("State update rejected: {}", e));
                        conversation.final_decision = false;
                        Transition::Next(Stage::Player)
                    }
                },
                StateUpdate::Unparseable(e) => {
                    warn!("Referee state block is not valid JSON, board unchanged: {}", e);
                    conversation.record_verdict(true, note);
                    Transition::Done
                }
                StateUpdate::Missing => {
                    warn!("Referee approved without a state block, board unchanged");
                    conversation.record_verdict(true, note);
                    Transition::Done
                }
            },
        };

        self.emit_verdict(conversation, events);
        transition
    }

    fn stage_failed(
        &self,
        error: LlmError,
        conversation: &mut ConversationState,
        events: &TurnEvents,
    ) -> Transition {
        conversation.record_verdict(false, format!("Error processing action: {}", error));
        conversation.final_decision = false;
        self.emit_verdict(conversation, events);
        Transition::Next(Stage::Player)
    }

    fn emit_verdict(&self, conversation: &ConversationState, events: &TurnEvents) {
        events.emit(TurnEvent::Verdict {
            is_legal: conversation.decision_is_legal,
            explanation: conversation.decision_explanation.clone(),
        });
    }

    /// One completion with timeout, retrying failures that happened before any output
    async fn complete(
        &self,
        role: AgentRole,
        prompt: Prompt,
        events: &TurnEvents,
    ) -> Result<String, LlmError> {
        let request = CompletionRequest {
            role,
            system_prompt: prompt.system,
            user_prompt: prompt.user,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        let mut attempt = 0u32;
        loop {
            let mut streamed = false;
            let outcome = tokio::time::timeout(
                self.config.completion_timeout,
                self.stream_completion(request.clone(), events, &mut streamed),
            )
            .await;

            let error = match outcome {
                Ok(Ok(text)) => return Ok(text),
                Ok(Err(e)) => e,
                Err(_) => LlmError::Timeout,
            };

            if streamed || attempt >= self.config.completion_retries {
                error!(
                    "{} completion failed after {} attempt(s): {}",
                    role.display_name(),
                    attempt + 1,
                    error
                );
                return Err(error);
            }

            attempt += 1;
            warn!(
                "{} completion failed ({}), retry {}/{}",
                role.display_name(),
                error,
                attempt,
                self.config.completion_retries
            );
            events.status(format!(
                "{} completion failed ({}), retrying ({}/{})",
                role.display_name(),
                error,
                attempt,
                self.config.completion_retries
            ));
            tokio::time::sleep(self.config.retry_backoff * attempt).await;
        }
    }

    async fn stream_completion(
        &self,
        request: CompletionRequest,
        events: &TurnEvents,
        streamed: &mut bool,
    ) -> Result<String, LlmError> {
        let role = request.role;
        let mut chunks = self.llm.stream(request).await?;
        let mut fence_filter = (role == AgentRole::Referee).then(FenceFilter::new);
        let mut text = String::new();

        while let Some(chunk) = chunks.next().await {
            let chunk = chunk?;
            if chunk.is_empty() {
                continue;
            }
            *streamed = true;
            text.push_str(&chunk);

            let shown = match fence_filter.as_mut() {
                Some(filter) => filter.push(&chunk),
                None => chunk,
            };
            if !shown.is_empty() {
                events.emit(TurnEvent::Chunk { role, text: shown });
            }
        }

        if let Some(rest) = fence_filter
            .as_mut()
            .map(FenceFilter::finish)
            .filter(|rest| !rest.is_empty())
        {
            events.emit(TurnEvent::Chunk { role, text: rest });
        }

        Ok(text)
    }
}
