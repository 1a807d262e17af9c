use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};

use super::ErrorResponse;
use crate::api::AppState;
use crate::application::board::{GetBoardState, ResetBoardState};
use crate::domain::entities::BoardState;
use crate::infrastructure::BoardEvent;

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ErrorResponse>)>;

fn board_unavailable(err: impl std::fmt::Display) -> (StatusCode, Json<ErrorResponse>) {
    tracing::error!("Board unavailable: {}", err);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: "Board state is unavailable".to_string(),
            code: "BOARD_UNAVAILABLE".to_string(),
            details: Some(err.to_string()),
        }),
    )
}

/// GET /state - Current board, dealt on first access
pub async fn get_state(State(state): State<Arc<AppState>>) -> ApiResult<BoardState> {
    let board = GetBoardState::new(state.board_store.clone())
        .execute()
        .await
        .map_err(board_unavailable)?;
    Ok(Json(board))
}

/// GET /refresh_state - Same payload as /state, polled by clients after a turn
pub async fn refresh_state(State(state): State<Arc<AppState>>) -> ApiResult<BoardState> {
    get_state(State(state)).await
}

/// POST /reset_state - Deal a fresh board
pub async fn reset_state(State(state): State<Arc<AppState>>) -> ApiResult<BoardState> {
    let board = ResetBoardState::new(state.board_store.clone())
        .execute()
        .await
        .map_err(board_unavailable)?;

    state.broadcast_event(BoardEvent::new("boardReset", None));

    Ok(Json(board))
}
