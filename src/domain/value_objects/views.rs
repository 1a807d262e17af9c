//! Player-scoped projections of the board
//!
//! The key names (`YOUR_HAND` / `OPPONENT_HAND`) are what the agents see and
//! what the Referee writes back, so they are part of the model contract.

use serde::{Deserialize, Serialize};

use crate::domain::entities::{CardId, CardRef, PlayerState, PokemonInPlay};

/// What the acting player (and their Mentor) may see
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerView {
    #[serde(rename = "YOUR_HAND")]
    pub your_hand: PlayerState,
    #[serde(rename = "OPPONENT_HAND")]
    pub opponent_hand: OpponentView,
}

impl PlayerView {
    /// Ids of every card the view exposes
    pub fn visible_card_ids(&self) -> Vec<CardId> {
        let mut ids = self.your_hand.card_ids();
        ids.extend(self.opponent_hand.card_ids());
        ids.sort();
        ids.dedup();
        ids
    }
}

/// The opponent's side with hidden zones reduced to counts ("40 cards")
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpponentView {
    pub active: Option<PokemonInPlay>,
    pub bench: Vec<PokemonInPlay>,
    pub discard: Vec<CardRef>,
    pub lost_zone: Vec<CardRef>,
    pub deck: String,
    pub hand: String,
    pub stadium: Option<CardRef>,
    pub prize_cards: String,
}

impl OpponentView {
    pub fn card_ids(&self) -> Vec<CardId> {
        let mut ids = Vec::new();
        for pokemon in self.active.iter().chain(self.bench.iter()) {
            ids.push(pokemon.id);
            ids.extend(pokemon.attached().iter().map(|c| c.id));
        }
        ids.extend(self.discard.iter().map(|c| c.id));
        ids.extend(self.lost_zone.iter().map(|c| c.id));
        ids.extend(self.stadium.iter().map(|c| c.id));
        ids
    }
}

/// What the Referee sees: both sides in full, from the acting player's seat
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefereeView {
    #[serde(rename = "YOUR_HAND")]
    pub your_hand: PlayerState,
    #[serde(rename = "OPPONENT_HAND")]
    pub opponent_hand: PlayerState,
}

/// "0 cards", "1 card", "40 cards"
pub fn card_count_label(count: usize) -> String {
    if count == 1 {
        "1 card".to_string()
    } else {
        format!("{} cards", count)
    }
}
