//! Starter decks shipped with the server

use serde::Deserialize;

use crate::domain::entities::BoardState;
use crate::domain::services::{setup_board, DeckError, DeckList};

const EMBEDDED_DECKS: &str = include_str!("../../../data/starter_decks.json");

/// The two decks a fresh board is dealt from
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StarterDecks {
    pub player_one: DeckList,
    pub player_two: DeckList,
}

impl StarterDecks {
    /// Decks compiled into the binary
    pub fn embedded() -> Result<Self, DeckError> {
        Self::from_json(EMBEDDED_DECKS)
    }

    pub fn from_json(json: &str) -> Result<Self, DeckError> {
        serde_json::from_str(json).map_err(|e| DeckError::Invalid(e.to_string()))
    }

    /// Deal a new board. `seed` makes the shuffle reproducible.
    pub fn deal(&self, seed: Option<u64>) -> Result<BoardState, DeckError> {
        let board = setup_board(&self.player_one, &self.player_two, seed)?;
        tracing::info!(
            "Dealt new board: '{}' vs '{}' ({} cards, seed: {:?})",
            self.player_one.name,
            self.player_two.name,
            board.card_map.len(),
            seed
        );
        Ok(board)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_decks_parse() {
        let decks = StarterDecks::embedded().unwrap();
        assert_eq!(decks.player_one.size(), 60);
        assert_eq!(decks.player_two.size(), 60);
    }

    #[test]
    fn test_embedded_decks_deal_a_valid_board() {
        let board = StarterDecks::embedded().unwrap().deal(Some(2024)).unwrap();

        assert_eq!(board.card_map.len(), 120);
        assert!(board.validate().is_ok());
        assert!(board.player_one.active.is_some());
        assert!(board.player_two.active.is_some());
        assert_eq!(board.player_one.card_count(), 60);
        assert_eq!(board.player_two.card_count(), 60);
    }

    #[test]
    fn test_invalid_json_is_reported() {
        assert!(matches!(
            StarterDecks::from_json("{\"playerOne\": 1}"),
            Err(DeckError::Invalid(_))
        ));
    }
}
