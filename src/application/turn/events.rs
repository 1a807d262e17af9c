//! Progress events emitted while a turn runs

use tokio::sync::mpsc;

use crate::domain::value_objects::{AgentRole, TurnResult};

/// Something a turn observer may want to show
#[derive(Debug, Clone)]
pub enum TurnEvent {
    /// A node began executing
    StageStarted(AgentRole),
    /// Streamed completion text
    Chunk { role: AgentRole, text: String },
    /// The Referee ruled (or a stage failed and was ruled illegal)
    Verdict { is_legal: bool, explanation: String },
    /// Retries, step-limit notices and similar diagnostics
    Status(String),
    /// Final outcome; always the last event of a turn
    Finished(Box<TurnResult>),
}

impl TurnEvent {
    /// Text line for plain-text observers. `Finished` has none.
    pub fn display_text(&self) -> Option<String> {
        match self {
            TurnEvent::StageStarted(role) => Some(stage_banner(*role)),
            TurnEvent::Chunk { text, .. } => Some(text.clone()),
            TurnEvent::Verdict {
                is_legal,
                explanation,
            } => Some(format!(
                "Referee ruling: {} - {}",
                if *is_legal { "LEGAL" } else { "ILLEGAL" },
                explanation
            )),
            TurnEvent::Status(message) => Some(format!("[DEBUG] {}", message)),
            TurnEvent::Finished(_) => None,
        }
    }
}

/// Banner printed when a node starts; consoles key on these exact strings
pub fn stage_banner(role: AgentRole) -> String {
    let name = match role {
        AgentRole::Player => "PLAYER",
        AgentRole::Mentor => "MASTER",
        AgentRole::Referee => "REFEREE",
    };
    format!("-------------{} NODE STARTED-------------------", name)
}

/// Where a turn sends its events. Sending never fails the turn.
#[derive(Debug, Clone, Default)]
pub struct TurnEvents {
    sender: Option<mpsc::UnboundedSender<TurnEvent>>,
}

impl TurnEvents {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<TurnEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (
            Self {
                sender: Some(sender),
            },
            receiver,
        )
    }

    /// Events go nowhere
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn emit(&self, event: TurnEvent) {
        if let Some(sender) = &self.sender {
            // Observer went away; the turn keeps going
            let _ = sender.send(event);
        }
    }

    pub fn status(&self, message: impl Into<String>) {
        self.emit(TurnEvent::Status(message.into()));
    }
}

/// Hides fenced code blocks from a chunked stream
///
/// The Referee's state block is for the server, not for the transcript. A
/// fence marker split across chunks is held back until it can be decided.
#[derive(Debug, Default)]
pub struct FenceFilter {
    pending: String,
    in_block: bool,
}

const FENCE: &str = "```";

impl FenceFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk; returns the part that may be shown now
    pub fn push(&mut self, chunk: &str) -> String {
        self.pending.push_str(chunk);
        let mut visible = String::new();

        loop {
            match self.pending.find(FENCE) {
                Some(pos) => {
                    if !self.in_block {
                        visible.push_str(&self.pending[..pos]);
                    }
                    self.pending.drain(..pos + FENCE.len());
                    self.in_block = !self.in_block;
                }
                None => {
                    let keep = trailing_backticks(&self.pending);
                    let cut = self.pending.len() - keep;
                    if !self.in_block {
                        visible.push_str(&self.pending[..cut]);
                    }
                    self.pending.drain(..cut);
                    break;
                }
            }
        }

        visible
    }

    /// Flush whatever is held back at end of stream
    pub fn finish(&mut self) -> String {
        let rest = std::mem::take(&mut self.pending);
        if self.in_block {
            String::new()
        } else {
            rest
        }
    }
}

fn trailing_backticks(text: &str) -> usize {
    text.bytes().rev().take_while(|b| *b == b'`').count().min(FENCE.len() - 1)
}
