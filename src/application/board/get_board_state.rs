use std::sync::Arc;

use crate::domain::entities::BoardState;
use crate::domain::services::DeckError;
use crate::infrastructure::services::BoardStore;

/// Get board state errors
#[derive(Debug, thiserror::Error)]
pub enum GetBoardStateError {
    #[error("Board unavailable: {0}")]
    Board(#[from] DeckError),
}

/// Get board state use case: the last committed board, dealt on first access
pub struct GetBoardState {
    store: Arc<BoardStore>,
}

impl GetBoardState {
    pub fn new(store: Arc<BoardStore>) -> Self {
        Self { store }
    }

    pub async fn execute(&self) -> Result<BoardState, GetBoardStateError> {
        Ok(self.store.snapshot().await?)
    }
}
