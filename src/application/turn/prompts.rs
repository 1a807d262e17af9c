//! Prompt text for the three agents

use crate::domain::entities::CardCatalog;
use crate::domain::services::{FINAL_DECISION_MARKER, ILLEGAL_ACTION_MARKER};
use crate::domain::value_objects::{ConversationState, RefereeView};

/// System and user text for one completion
#[derive(Debug, Clone)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

const ZONE_GUIDE: &str = "\
The game state is JSON with two sides. YOUR_HAND is your side and OPPONENT_HAND is your opponent's side. Each side has:
- active: the Active Pokémon ({id, hp, attachedCards}), where hp is its remaining HP
- bench: up to 5 Benched Pokémon, same shape as active
- hand, deck, prizeCards, discard, lostZone: lists of cards ({id})
- stadium: the Stadium card in play, if any
Your opponent's hand, deck and prize cards are hidden and shown only as counts.
The card details map each card id to its definition (name, HP, attacks, abilities, rules).
Always refer to a card by name followed by its id, for example: Ralts (id: 12).";

/// Player: propose one action or ask the Mentor
pub fn player_prompt(
    conversation: &ConversationState,
    catalog: &CardCatalog,
    must_decide: bool,
) -> Prompt {
    let system = format!(
        "You are playing the Pokémon Trading Card Game. Decide the single next action for your turn.\n\n\
         {ZONE_GUIDE}\n\n\
         You may ask your mentor for advice by replying with a question. \
         When you are ready to act, reply with a line starting with \"{FINAL_DECISION_MARKER}\" \
         followed by exactly one action (for example attaching an Energy, playing a Trainer, \
         evolving, retreating or attacking) and the ids of the cards involved.\n\
         Only choose actions that are legal under the rules and the current game state. Be concise."
    );

    let mut user = format!(
        "Game state:\n{}\n\nCard details:\n{}\n",
        to_pretty_json(&conversation.view),
        to_pretty_json(catalog)
    );

    if !conversation.transcript.is_empty() {
        user.push_str("\nConversation so far:\n");
        user.push_str(&conversation.formatted_transcript());
    }

    if let Some(rejection) = conversation.rejection_context() {
        user.push('\n');
        user.push_str(&rejection);
        user.push('\n');
    }

    if must_decide {
        user.push_str(&format!(
            "\nYou have already consulted your mentor. Reply now with \"{FINAL_DECISION_MARKER}\" and your action.\n"
        ));
    }

    Prompt { system, user }
}

/// Mentor: answer the Player's latest message
pub fn mentor_prompt(conversation: &ConversationState, catalog: &CardCatalog) -> Prompt {
    let system = format!(
        "You are an expert Pokémon Trading Card Game player mentoring a student during their turn.\n\n\
         {ZONE_GUIDE}\n\n\
         Answer the student's question with concrete, legal advice for this game state in a few \
         sentences. Do not make the decision for them and never write \"{FINAL_DECISION_MARKER}\"."
    );

    let user = format!(
        "Game state:\n{}\n\nCard details:\n{}\n\nConversation so far:\n{}\nStudent's question:\n{}\n",
        to_pretty_json(&conversation.view),
        to_pretty_json(catalog),
        conversation.formatted_transcript(),
        conversation.latest_player_message()
    );

    Prompt { system, user }
}

/// Referee: rule on the proposed action and, if legal, return the new state
pub fn referee_prompt(view: &RefereeView, catalog: &CardCatalog, action: &str) -> Prompt {
    let system = format!(
        "You are the referee of a Pokémon Trading Card Game match. You check whether the player's \
         proposed action is legal and, if it is, apply it to the game state.\n\n\
         {ZONE_GUIDE}\n\
         You see both sides in full. YOUR_HAND is the acting player.\n\n\
         If the action is illegal, start your reply with \"{ILLEGAL_ACTION_MARKER}\" followed by a short \
         reason and do not include a game state.\n\
         If the action is legal, reply with a one or two sentence explanation starting with \
         \"Explanation:\", then the complete updated game state as a single fenced ```json block \
         with exactly the keys YOUR_HAND and OPPONENT_HAND, each containing every zone \
         (active, bench, discard, lostZone, deck, hand, stadium, prizeCards) in the same shape as the input. \
         Use null for an empty active or stadium slot and [] for an empty list.\n\
         Never include the card details in your reply, and never invent card ids."
    );

    let user = format!(
        "Game state:\n{}\n\nCard details:\n{}\n\nProposed action:\n{}\n",
        to_pretty_json(view),
        to_pretty_json(catalog),
        action
    );

    Prompt { system, user }
}

fn to_pretty_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("<unserializable: {}>", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{BoardState, CardRef, PlayerId, PlayerState, PokemonInPlay};
    use crate::domain::services::{project_view, referee_view};

    fn board() -> BoardState {
        let catalog = (1..=4)
            .map(|i| {
                (
                    crate::domain::entities::CardId(i),
                    serde_json::from_value(serde_json::json!({
                        "name": format!("Card {}", i),
                        "supertype": "Pokémon",
                        "subtypes": ["Basic"],
                        "hp": "60"
                    }))
                    .unwrap(),
                )
            })
            .collect();
        BoardState::new(
            PlayerState {
                active: Some(PokemonInPlay::new(1, 60)),
                hand: vec![CardRef::new(2)],
                ..Default::default()
            },
            PlayerState {
                active: Some(PokemonInPlay::new(3, 60)),
                hand: vec![CardRef::new(4)],
                ..Default::default()
            },
            catalog,
        )
    }

    #[test]
    fn test_player_prompt_includes_rejection_and_transcript() {
        let board = board();
        let mut conversation = ConversationState::new(project_view(&board, PlayerId::One).unwrap());
        conversation.record_player("Should I retreat?".to_string(), false);
        conversation.record_mentor("No.".to_string());
        conversation.record_player("FINAL DECISION: retreat".to_string(), true);
        conversation.record_verdict(false, "no energy to pay the retreat cost");

        let prompt = player_prompt(&conversation, &board.card_map, false);
        assert!(prompt.system.contains(FINAL_DECISION_MARKER));
        assert!(prompt.user.contains("Mentor: No."));
        assert!(prompt.user.contains("was ILLEGAL: no energy to pay the retreat cost"));
        assert!(!prompt.user.contains("already consulted"));

        let forced = player_prompt(&conversation, &board.card_map, true);
        assert!(forced.user.contains("already consulted"));
    }

    #[test]
    fn test_mentor_prompt_carries_question() {
        let board = board();
        let mut conversation = ConversationState::new(project_view(&board, PlayerId::Two).unwrap());
        conversation.record_player("Which attack is best?".to_string(), false);

        let prompt = mentor_prompt(&conversation, &board.card_map);
        assert!(prompt.user.ends_with("Which attack is best?\n"));
    }

    #[test]
    fn test_referee_prompt_carries_action_and_both_sides() {
        let board = board();
        let prompt = referee_prompt(
            &referee_view(&board, PlayerId::One),
            &board.card_map,
            "FINAL DECISION: attack",
        );
        assert!(prompt.system.contains(ILLEGAL_ACTION_MARKER));
        assert!(prompt.user.contains("YOUR_HAND"));
        assert!(prompt.user.contains("OPPONENT_HAND"));
        assert!(prompt.user.contains("FINAL DECISION: attack"));
    }
}
