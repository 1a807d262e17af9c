//! Folding a Referee-approved update back into the board
//!
//! The write-back mirrors what was exposed: the acting player's side is
//! replaced in full, the opponent's side only in its public zones. Opponent
//! deck, hand and prize contents are never taken from model output.

use serde::Deserialize;

use crate::domain::entities::{
    nullable_zone, BoardState, CardCatalog, CardRef, PlayerId, PlayerState, PokemonInPlay,
};
use crate::domain::DataError;

pub const YOUR_HAND_KEY: &str = "YOUR_HAND";
pub const OPPONENT_HAND_KEY: &str = "OPPONENT_HAND";

/// Opponent zones that may be overwritten. Other keys are ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisibleZones {
    #[serde(deserialize_with = "Option::deserialize")]
    pub active: Option<PokemonInPlay>,
    #[serde(deserialize_with = "nullable_zone")]
    pub bench: Vec<PokemonInPlay>,
    #[serde(deserialize_with = "nullable_zone")]
    pub discard: Vec<CardRef>,
    #[serde(deserialize_with = "nullable_zone")]
    pub lost_zone: Vec<CardRef>,
    #[serde(deserialize_with = "Option::deserialize")]
    pub stadium: Option<CardRef>,
}

impl VisibleZones {
    fn validate(&self, catalog: &CardCatalog) -> Result<(), DataError> {
        let probe = PlayerState {
            active: self.active.clone(),
            bench: self.bench.clone(),
            discard: self.discard.clone(),
            lost_zone: self.lost_zone.clone(),
            stadium: self.stadium,
            ..Default::default()
        };
        probe.validate(catalog)
    }

    fn apply_to(self, target: &mut PlayerState) {
        target.active = self.active;
        target.bench = self.bench;
        target.discard = self.discard;
        target.lost_zone = self.lost_zone;
        target.stadium = self.stadium;
    }
}

/// Build the board that results from applying `update` for `player`
///
/// `update` has the `{YOUR_HAND, OPPONENT_HAND}` shape. On any shape or
/// catalog error nothing is applied and the error is returned; the caller's
/// board is never touched.
pub fn apply_state_update(
    board: &BoardState,
    player: PlayerId,
    update: &serde_json::Value,
) -> Result<BoardState, DataError> {
    let object = update
        .as_object()
        .ok_or_else(|| DataError::shape("state update", "expected a JSON object"))?;

    let own_value = object
        .get(YOUR_HAND_KEY)
        .ok_or(DataError::MissingField(YOUR_HAND_KEY))?;
    let opponent_value = object
        .get(OPPONENT_HAND_KEY)
        .ok_or(DataError::MissingField(OPPONENT_HAND_KEY))?;

    let own = PlayerState::deserialize(own_value).map_err(|e| DataError::shape(YOUR_HAND_KEY, e))?;
    let visible = VisibleZones::deserialize(opponent_value)
        .map_err(|e| DataError::shape(OPPONENT_HAND_KEY, e))?;

    own.validate(&board.card_map)?;
    visible.validate(&board.card_map)?;

    let mut merged = board.clone();
    *merged.player_mut(player) = own;
    visible.apply_to(merged.player_mut(player.opponent()));
    Ok(merged)
}
