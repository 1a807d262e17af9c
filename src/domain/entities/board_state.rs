use serde::{Deserialize, Serialize};

use super::{CardCatalog, PlayerState, MAX_BENCH_SIZE};
use crate::domain::DataError;

/// Which side of the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PlayerId {
    One,
    Two,
}

impl PlayerId {
    pub fn from_number(number: u8) -> Result<Self, DataError> {
        match number {
            1 => Ok(PlayerId::One),
            2 => Ok(PlayerId::Two),
            other => Err(DataError::InvalidPlayer(other)),
        }
    }

    pub fn number(&self) -> u8 {
        match self {
            PlayerId::One => 1,
            PlayerId::Two => 2,
        }
    }

    pub fn opponent(&self) -> Self {
        match self {
            PlayerId::One => PlayerId::Two,
            PlayerId::Two => PlayerId::One,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PlayerId::One => "playerOne",
            PlayerId::Two => "playerTwo",
        }
    }
}

/// Authoritative state of a match: both players plus the shared catalog
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardState {
    pub player_one: PlayerState,
    pub player_two: PlayerState,
    pub card_map: CardCatalog,
}

impl BoardState {
    pub fn new(player_one: PlayerState, player_two: PlayerState, card_map: CardCatalog) -> Self {
        Self {
            player_one,
            player_two,
            card_map,
        }
    }

    pub fn player(&self, id: PlayerId) -> &PlayerState {
        match id {
            PlayerId::One => &self.player_one,
            PlayerId::Two => &self.player_two,
        }
    }

    pub fn player_mut(&mut self, id: PlayerId) -> &mut PlayerState {
        match id {
            PlayerId::One => &mut self.player_one,
            PlayerId::Two => &mut self.player_two,
        }
    }

    /// Check that every card on both sides resolves in the catalog
    pub fn validate(&self) -> Result<(), DataError> {
        self.player_one.validate(&self.card_map)?;
        self.player_two.validate(&self.card_map)
    }

    /// Players whose bench is over the limit. Reported, never corrected.
    pub fn overfull_benches(&self) -> Vec<PlayerId> {
        [PlayerId::One, PlayerId::Two]
            .into_iter()
            .filter(|id| self.player(*id).bench.len() > MAX_BENCH_SIZE)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{CardRef, CardId, PokemonInPlay};

    #[test]
    fn test_player_numbers() {
        assert_eq!(PlayerId::from_number(1).unwrap(), PlayerId::One);
        assert_eq!(PlayerId::from_number(2).unwrap().opponent(), PlayerId::One);
        assert_eq!(PlayerId::from_number(3), Err(DataError::InvalidPlayer(3)));
    }

    #[test]
    fn test_validate_reports_unknown_card() {
        let mut board = BoardState::default();
        board.player_two.hand.push(CardRef::new(42));
        assert_eq!(board.validate(), Err(DataError::UnknownCard(CardId(42))));
    }

    #[test]
    fn test_overfull_bench_is_reported() {
        let mut board = BoardState::default();
        board.player_one.bench = (0..6).map(|i| PokemonInPlay::new(i, 60)).collect();
        assert_eq!(board.overfull_benches(), vec![PlayerId::One]);
    }

    #[test]
    fn test_json_uses_client_field_names() {
        let value = serde_json::to_value(BoardState::default()).unwrap();
        assert!(value.get("playerOne").is_some());
        assert!(value.get("playerTwo").is_some());
        assert!(value.get("cardMap").is_some());
        assert!(value["playerOne"].get("lostZone").is_some());
        assert!(value["playerOne"].get("prizeCards").is_some());
    }
}
