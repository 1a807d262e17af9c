use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use crate::domain::entities::BoardState;
use crate::domain::services::DeckError;
use crate::infrastructure::decks::StarterDecks;

/// Produces a fresh board (on first access and on reset)
pub type BoardFactory = Arc<dyn Fn() -> Result<BoardState, DeckError> + Send + Sync>;

/// Process-wide home of the single BoardState
///
/// Reads return the last committed snapshot and never wait for a running
/// turn. Turns and resets take the writer lock, so at most one of them runs
/// at a time and every turn starts from the board the previous one left.
pub struct BoardStore {
    board: RwLock<Option<BoardState>>,
    writer: Arc<Mutex<()>>,
    factory: BoardFactory,
}

/// Exclusive right to change the board, held for the length of a turn
pub struct TurnLease {
    _writer: OwnedMutexGuard<()>,
    pub board: BoardState,
}

impl BoardStore {
    pub fn new(factory: BoardFactory) -> Self {
        Self {
            board: RwLock::new(None),
            writer: Arc::new(Mutex::new(())),
            factory,
        }
    }

    /// Store dealing from the given decks
    pub fn from_decks(decks: StarterDecks, seed: Option<u64>) -> Self {
        Self::new(Arc::new(move || decks.deal(seed)))
    }

    /// Store starting from a fixed board (resets return to it)
    pub fn with_board(board: BoardState) -> Self {
        Self::new(Arc::new(move || Ok(board.clone())))
    }

    /// Current board, dealing one on first access
    pub async fn snapshot(&self) -> Result<BoardState, DeckError> {
        if let Some(board) = self.board.read().await.as_ref() {
            return Ok(board.clone());
        }

        let mut slot = self.board.write().await;
        if slot.is_none() {
            *slot = Some((self.factory)()?);
        }
        Ok(slot.clone().unwrap_or_default())
    }

    /// Whether a turn or reset currently holds the writer lock
    pub fn is_busy(&self) -> bool {
        self.writer.try_lock().is_err()
    }

    /// Wait for the writer lock and take a working copy of the board
    pub async fn begin_turn(&self) -> Result<TurnLease, DeckError> {
        let writer = self.writer.clone().lock_owned().await;
        let board = self.snapshot().await?;
        Ok(TurnLease {
            _writer: writer,
            board,
        })
    }

    /// Publish the lease's board and release the writer lock
    pub async fn commit(&self, lease: TurnLease) {
        let TurnLease { _writer, board } = lease;
        *self.board.write().await = Some(board);
    }

    /// Replace the board with a freshly dealt one
    pub async fn reset(&self) -> Result<BoardState, DeckError> {
        let _writer = self.writer.lock().await;
        let board = (self.factory)()?;
        *self.board.write().await = Some(board.clone());
        tracing::info!("Board reset");
        Ok(board)
    }
}
