use serde::Serialize;

use super::{RefereeView, TranscriptEntry};
use crate::domain::entities::PlayerId;

/// Outcome of one turn, returned to the caller and streamed as the final payload
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnResult {
    pub turn_id: String,
    pub player: PlayerId,
    /// Text of the Player's last final decision (empty if none was made)
    pub action: String,
    pub is_legal: bool,
    pub explanation: String,
    /// Both sides after the turn, from the acting player's seat
    #[serde(rename = "updatedBoardStateFragment")]
    pub updated_state: RefereeView,
    #[serde(rename = "conversationTranscript")]
    pub conversation: Vec<TranscriptEntry>,
    pub hit_step_limit: bool,
    pub steps: usize,
}
