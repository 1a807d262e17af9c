use serde::{Deserialize, Serialize};

use super::PlayerView;

/// The three agents taking part in a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentRole {
    Player,
    Mentor,
    Referee,
}

impl AgentRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentRole::Player => "player",
            AgentRole::Mentor => "mentor",
            AgentRole::Referee => "referee",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            AgentRole::Player => "Player",
            AgentRole::Mentor => "Mentor",
            AgentRole::Referee => "Referee",
        }
    }
}

/// One message of the Player / Mentor exchange
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub role: AgentRole,
    pub content: String,
}

/// Working state of a single turn. Created at turn start, dropped at turn end.
#[derive(Debug, Clone)]
pub struct ConversationState {
    pub view: PlayerView,
    pub player_action: String,
    pub transcript: Vec<TranscriptEntry>,
    pub final_decision: bool,
    pub decision_is_legal: bool,
    pub decision_explanation: String,
    pub mentor_consultations: usize,
}

impl ConversationState {
    pub fn new(view: PlayerView) -> Self {
        Self {
            view,
            player_action: String::new(),
            transcript: Vec::new(),
            final_decision: false,
            decision_is_legal: false,
            decision_explanation: String::new(),
            mentor_consultations: 0,
        }
    }

    /// Record a Player message. A final decision also becomes the proposed action.
    pub fn record_player(&mut self, content: String, is_final: bool) {
        if is_final {
            self.player_action = content.clone();
        }
        self.final_decision = is_final;
        self.transcript.push(TranscriptEntry {
            role: AgentRole::Player,
            content,
        });
    }

    pub fn record_mentor(&mut self, content: String) {
        self.mentor_consultations += 1;
        self.transcript.push(TranscriptEntry {
            role: AgentRole::Mentor,
            content,
        });
    }

    pub fn record_verdict(&mut self, is_legal: bool, explanation: impl Into<String>) {
        self.decision_is_legal = is_legal;
        self.decision_explanation = explanation.into();
    }

    pub fn latest_player_message(&self) -> &str {
        self.transcript
            .iter()
            .rev()
            .find(|entry| entry.role == AgentRole::Player)
            .map(|entry| entry.content.as_str())
            .unwrap_or("")
    }

    /// Transcript as "Player: ..." / "Mentor: ..." lines
    pub fn formatted_transcript(&self) -> String {
        let mut formatted = String::new();
        for entry in &self.transcript {
            formatted.push_str(entry.role.display_name());
            formatted.push_str(": ");
            formatted.push_str(&entry.content);
            formatted.push('\n');
        }
        formatted
    }

    /// Feedback for the next Player prompt after a rejected decision
    pub fn rejection_context(&self) -> Option<String> {
        if self.decision_is_legal || self.decision_explanation.is_empty() {
            return None;
        }
        if self.player_action.is_empty() {
            return Some(format!(
                "Your previous step failed: {}\nPlease try again.",
                self.decision_explanation
            ));
        }
        Some(format!(
            "Your previous action: '{}' was ILLEGAL: {}\nPlease reconsider your action.",
            self.player_action, self.decision_explanation
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::PlayerState;
    use crate::domain::value_objects::OpponentView;

    fn empty_view() -> PlayerView {
        PlayerView {
            your_hand: PlayerState::default(),
            opponent_hand: OpponentView {
                active: None,
                bench: vec![],
                discard: vec![],
                lost_zone: vec![],
                deck: "0 cards".to_string(),
                hand: "0 cards".to_string(),
                stadium: None,
                prize_cards: "0 cards".to_string(),
            },
        }
    }

    #[test]
    fn test_transcript_formatting_and_latest_question() {
        let mut state = ConversationState::new(empty_view());
        state.record_player("Should I retreat?".to_string(), false);
        state.record_mentor("No, attack.".to_string());

        assert_eq!(
            state.formatted_transcript(),
            "Player: Should I retreat?\nMentor: No, attack.\n"
        );
        assert_eq!(state.latest_player_message(), "Should I retreat?");
        assert_eq!(state.mentor_consultations, 1);
        assert!(state.player_action.is_empty());
    }

    #[test]
    fn test_rejection_context_only_after_illegal_verdict() {
        let mut state = ConversationState::new(empty_view());
        assert!(state.rejection_context().is_none());

        state.record_player("FINAL DECISION: attack".to_string(), true);
        state.record_verdict(false, "insufficient energy");
        let context = state.rejection_context().unwrap();
        assert!(context.contains("FINAL DECISION: attack"));
        assert!(context.contains("ILLEGAL: insufficient energy"));

        state.record_verdict(true, "Legal.");
        assert!(state.rejection_context().is_none());
    }
}
