use std::sync::Arc;

use super::{RunTurn, TurnConfig, TurnEvents};
use crate::domain::entities::PlayerId;
use crate::domain::services::DeckError;
use crate::domain::value_objects::TurnResult;
use crate::infrastructure::services::{BoardStore, LlmService};

/// Play turn input
pub struct PlayTurnInput {
    pub player: PlayerId,
}

/// Play turn errors
#[derive(Debug, thiserror::Error)]
pub enum PlayTurnError {
    #[error("Board unavailable: {0}")]
    Board(#[from] DeckError),
}

/// Play turn use case: run one turn against the shared board and publish the result
pub struct PlayTurn {
    store: Arc<BoardStore>,
    run_turn: RunTurn,
}

impl PlayTurn {
    pub fn new(store: Arc<BoardStore>, llm: Arc<dyn LlmService>, config: TurnConfig) -> Self {
        Self {
            store,
            run_turn: RunTurn::new(llm, config),
        }
    }

    pub async fn execute(
        &self,
        input: PlayTurnInput,
        events: &TurnEvents,
    ) -> Result<TurnResult, PlayTurnError> {
        if self.store.is_busy() {
            events.status("Waiting for the running turn to finish");
        }

        let mut lease = self.store.begin_turn().await?;
        let result = self
            .run_turn
            .execute(&mut lease.board, input.player, events)
            .await;
        self.store.commit(lease).await;

        Ok(result)
    }
}
