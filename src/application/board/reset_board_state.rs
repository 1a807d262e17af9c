use std::sync::Arc;

use crate::domain::entities::BoardState;
use crate::domain::services::DeckError;
use crate::infrastructure::services::BoardStore;

/// Reset board state errors
#[derive(Debug, thiserror::Error)]
pub enum ResetBoardStateError {
    #[error("Could not deal a new board: {0}")]
    Board(#[from] DeckError),
}

/// Reset board state use case
///
/// Waits for a running turn to finish, then deals a fresh board.
pub struct ResetBoardState {
    store: Arc<BoardStore>,
}

impl ResetBoardState {
    pub fn new(store: Arc<BoardStore>) -> Self {
        Self { store }
    }

    pub async fn execute(&self) -> Result<BoardState, ResetBoardStateError> {
        Ok(self.store.reset().await?)
    }
}
