//! Decoders for agent output
//!
//! Agents answer in free text. The protocol is a handful of literal markers
//! plus one fenced JSON block; everything past this module works with the
//! decoded enums only.

use once_cell::sync::Lazy;
use regex::Regex;

/// Marks a Player message as a final decision (case-sensitive substring)
pub const FINAL_DECISION_MARKER: &str = "FINAL DECISION:";
/// Marks a Referee verdict as a rejection (case-sensitive substring)
pub const ILLEGAL_ACTION_MARKER: &str = "ILLEGAL ACTION";
/// Explanation used when a legal verdict carries no state block
pub const NO_UPDATE_FOUND: &str = "no update found";

static JSON_FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```[ \t]*(?i:json)[ \t]*\r?\n(.*?)\r?\n?[ \t]*```").expect("valid regex")
});

static EXPLANATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)Explanation:\s*(.*?)(?:\n\s*\n|$)").expect("valid regex"));

/// What the Player said
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerDecision {
    /// The Player committed to an action; the full message is the action text
    FinalDecision(String),
    /// Anything else goes to the Mentor
    Question(String),
}

impl PlayerDecision {
    pub fn decode(text: &str) -> Self {
        if text.contains(FINAL_DECISION_MARKER) {
            PlayerDecision::FinalDecision(text.to_string())
        } else {
            PlayerDecision::Question(text.to_string())
        }
    }

    pub fn is_final(&self) -> bool {
        matches!(self, PlayerDecision::FinalDecision(_))
    }

    pub fn into_text(self) -> String {
        match self {
            PlayerDecision::FinalDecision(text) | PlayerDecision::Question(text) => text,
        }
    }
}

/// State block carried by a legal verdict
#[derive(Debug, Clone, PartialEq)]
pub enum StateUpdate {
    /// A well-formed JSON value; its shape is checked by the merge
    Proposed(serde_json::Value),
    /// A fenced block that is not valid JSON (parser message inside)
    Unparseable(String),
    /// No fenced JSON block at all
    Missing,
}

/// What the Referee decided
#[derive(Debug, Clone, PartialEq)]
pub enum RefereeVerdict {
    Legal { update: StateUpdate, note: String },
    Illegal { reason: String },
}

impl RefereeVerdict {
    /// Decode a complete Referee response
    ///
    /// The illegality marker wins over any state block. A missing or broken
    /// block never fails decoding; it leaves the board as it was.
    pub fn decode(text: &str) -> Self {
        let fenced = extract_json_block(text);
        let explanation = explanation_text(text, fenced.as_ref().map(|f| f.range.clone()));

        if text.contains(ILLEGAL_ACTION_MARKER) {
            return RefereeVerdict::Illegal {
                reason: explanation,
            };
        }

        match fenced {
            Some(block) => match serde_json::from_str(block.body) {
                Ok(value) => RefereeVerdict::Legal {
                    update: StateUpdate::Proposed(value),
                    note: explanation,
                },
                Err(e) => RefereeVerdict::Legal {
                    update: StateUpdate::Unparseable(e.to_string()),
                    note: no_update_note(explanation),
                },
            },
            None => RefereeVerdict::Legal {
                update: StateUpdate::Missing,
                note: no_update_note(explanation),
            },
        }
    }

    pub fn is_legal(&self) -> bool {
        matches!(self, RefereeVerdict::Legal { .. })
    }

    pub fn explanation(&self) -> &str {
        match self {
            RefereeVerdict::Legal { note, .. } => note,
            RefereeVerdict::Illegal { reason } => reason,
        }
    }
}

fn no_update_note(explanation: String) -> String {
    if explanation.is_empty() {
        NO_UPDATE_FOUND.to_string()
    } else {
        format!("{} ({})", explanation, NO_UPDATE_FOUND)
    }
}

struct JsonBlock<'a> {
    body: &'a str,
    range: std::ops::Range<usize>,
}

fn extract_json_block(text: &str) -> Option<JsonBlock<'_>> {
    let captures = JSON_FENCE.captures(text)?;
    let whole = captures.get(0)?;
    let body = captures.get(1)?;
    Some(JsonBlock {
        body: body.as_str(),
        range: whole.range(),
    })
}

/// Human-readable part of a response: an `Explanation:` paragraph if there is
/// one, otherwise all text outside the fenced block
fn explanation_text(text: &str, fence: Option<std::ops::Range<usize>>) -> String {
    let visible = match fence {
        Some(range) => format!("{}\n{}", &text[..range.start], &text[range.end..]),
        None => text.to_string(),
    };

    if let Some(paragraph) = EXPLANATION
        .captures(&visible)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .filter(|p| !p.is_empty())
    {
        return paragraph.to_string();
    }

    visible.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_player_final_decision_marker() {
        let decision = PlayerDecision::decode("FINAL DECISION: attach energy ( id: 51 ) to Ralts");
        assert!(decision.is_final());

        let question = PlayerDecision::decode("Should I retreat?");
        assert_eq!(question, PlayerDecision::Question("Should I retreat?".to_string()));
    }

    #[test]
    fn test_player_marker_is_case_sensitive() {
        assert!(!PlayerDecision::decode("final decision: attack").is_final());
        assert!(!PlayerDecision::decode("FINAL DECISION attack").is_final());
    }

    #[test]
    fn test_legal_verdict_with_state_block() {
        let text = "The action is legal.\n\n```json\n{\"YOUR_HAND\": {\"x\": 1}}\n```\n";
        let verdict = RefereeVerdict::decode(text);

        assert_eq!(
            verdict,
            RefereeVerdict::Legal {
                update: StateUpdate::Proposed(json!({"YOUR_HAND": {"x": 1}})),
                note: "The action is legal.".to_string(),
            }
        );
    }

    #[test]
    fn test_illegal_marker_discards_state_block() {
        let text = "ILLEGAL ACTION: insufficient energy\n\n```json\n{\"stale\": true}\n```";
        let verdict = RefereeVerdict::decode(text);

        assert!(!verdict.is_legal());
        assert_eq!(verdict.explanation(), "ILLEGAL ACTION: insufficient energy");
    }

    #[test]
    fn test_broken_block_is_tolerated() {
        let text = "Legal.\n```json\n{\"YOUR_HAND\": {\n```";
        match RefereeVerdict::decode(text) {
            RefereeVerdict::Legal { update, note } => {
                assert!(matches!(update, StateUpdate::Unparseable(_)));
                assert_eq!(note, format!("Legal. ({})", NO_UPDATE_FOUND));
            }
            other => panic!("unexpected verdict {:?}", other),
        }
    }

    #[test]
    fn test_missing_block_uses_whole_text() {
        match RefereeVerdict::decode("The action was legal.") {
            RefereeVerdict::Legal { update, note } => {
                assert_eq!(update, StateUpdate::Missing);
                assert!(note.contains("The action was legal."));
                assert!(note.contains(NO_UPDATE_FOUND));
            }
            other => panic!("unexpected verdict {:?}", other),
        }
        assert_eq!(RefereeVerdict::decode("").explanation(), NO_UPDATE_FOUND);
    }

    #[test]
    fn test_explanation_section_is_preferred() {
        let text = "Updated Game State:\n```json\n{}\n```\nExplanation: Legal attack.\n\nThanks";
        assert_eq!(RefereeVerdict::decode(text).explanation(), "Legal attack.");
    }

    #[test]
    fn test_fence_label_and_line_endings_are_tolerated() {
        let text = "ok\r\n``` JSON\r\n{\"a\": 1}\r\n```";
        match RefereeVerdict::decode(text) {
            RefereeVerdict::Legal { update, .. } => {
                assert_eq!(update, StateUpdate::Proposed(json!({"a": 1})));
            }
            other => panic!("unexpected verdict {:?}", other),
        }
    }
}
