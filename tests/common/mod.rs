//! Shared fixtures for the integration tests

#![allow(dead_code)]

use std::time::Duration;

use serde_json::json;

use tcg_agents::application::turn::TurnConfig;
use tcg_agents::domain::entities::{
    BoardState, CardCatalog, CardDefinition, CardId, CardRef, PlayerId, PlayerState, PokemonInPlay,
};
use tcg_agents::domain::services::referee_view;
use tcg_agents::domain::value_objects::RefereeView;

pub const PLAYER_ONE_ACTIVE: u32 = 1;
pub const PLAYER_TWO_ACTIVE: u32 = 11;
/// Card names that only appear in player two's hidden zones
pub const HIDDEN_FROM_PLAYER_ONE: [&str; 3] = ["Iono", "Boss's Orders", "Super Rod"];

fn card(name: &str, supertype: &str, subtypes: &[&str], hp: Option<&str>) -> CardDefinition {
    let mut value = json!({
        "name": name,
        "supertype": supertype,
        "subtypes": subtypes,
    });
    if let Some(hp) = hp {
        value["hp"] = json!(hp);
    }
    serde_json::from_value(value).unwrap()
}

/// Small mid-game board
///
/// Player one: Ralts (1) active with a Psychic Energy (3) attached.
/// Player two: Snorlax (11, 150 HP) active, Pidgey (15) benched.
pub fn fixture_board() -> BoardState {
    let catalog: CardCatalog = [
        (1, card("Ralts", "Pokémon", &["Basic"], Some("70"))),
        (2, card("Kirlia", "Pokémon", &["Stage 1"], Some("80"))),
        (3, card("Basic Psychic Energy", "Energy", &["Basic"], None)),
        (4, card("Nest Ball", "Trainer", &["Item"], None)),
        (5, card("Basic Psychic Energy", "Energy", &["Basic"], None)),
        (6, card("Ralts", "Pokémon", &["Basic"], Some("70"))),
        (7, card("Professor's Research", "Trainer", &["Supporter"], None)),
        (11, card("Snorlax", "Pokémon", &["Basic"], Some("150"))),
        (12, card("Iono", "Trainer", &["Supporter"], None)),
        (13, card("Boss's Orders", "Trainer", &["Supporter"], None)),
        (14, card("Super Rod", "Trainer", &["Item"], None)),
        (15, card("Pidgey", "Pokémon", &["Basic"], Some("60"))),
    ]
    .into_iter()
    .map(|(id, definition)| (CardId(id), definition))
    .collect();

    let player_one = PlayerState {
        active: Some(
            PokemonInPlay::new(PLAYER_ONE_ACTIVE, 70).with_attached(vec![CardRef::new(3)]),
        ),
        hand: vec![CardRef::new(2), CardRef::new(4)],
        deck: vec![CardRef::new(5), CardRef::new(6)],
        prize_cards: vec![CardRef::new(7)],
        ..Default::default()
    };
    let player_two = PlayerState {
        active: Some(PokemonInPlay::new(PLAYER_TWO_ACTIVE, 150)),
        bench: vec![PokemonInPlay::new(15, 60)],
        hand: vec![CardRef::new(12)],
        deck: vec![CardRef::new(13)],
        prize_cards: vec![CardRef::new(14)],
        ..Default::default()
    };

    BoardState::new(player_one, player_two, catalog)
}

/// Fast settings for tests: no retries, no backoff
pub fn turn_config(max_steps: usize) -> TurnConfig {
    TurnConfig {
        max_steps,
        completion_timeout: Duration::from_secs(5),
        completion_retries: 0,
        retry_backoff: Duration::ZERO,
        max_mentor_consultations: None,
        max_tokens: 512,
        temperature: 0.0,
    }
}

/// A legal ruling whose state block is the current board after `edit`
pub fn legal_reply(
    board: &BoardState,
    player: PlayerId,
    explanation: &str,
    edit: impl FnOnce(&mut RefereeView),
) -> String {
    let mut view = referee_view(board, player);
    edit(&mut view);
    format!(
        "Explanation: {}\n\n```json\n{}\n```\n",
        explanation,
        serde_json::to_string_pretty(&view).unwrap()
    )
}

/// Referee reply that knocks 50 HP off the opponent's active Pokémon
pub fn attack_for_fifty(board: &BoardState, player: PlayerId) -> String {
    legal_reply(board, player, "Ralts attacks for 50 damage.", |view| {
        if let Some(active) = view.opponent_hand.active.as_mut() {
            active.hp -= 50;
        }
    })
}
