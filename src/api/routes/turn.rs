//! Streaming turn endpoints
//!
//! The response is a server-sent event stream: one `data` event per stage
//! banner, text chunk, ruling or diagnostic line, then a `result` event with
//! the TurnResult as JSON, then `event: close` with data `end`.

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::future;
use futures::stream::{self, Stream, StreamExt};
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::api::AppState;
use crate::application::turn::{PlayTurn, PlayTurnInput, TurnEvent, TurnEvents};
use crate::domain::entities::PlayerId;
use crate::infrastructure::BoardEvent;

/// Data of the final `close` event
pub const END_OF_STREAM: &str = "end";

/// GET /player1/turn
pub async fn player_one_turn(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    stream_turn(state, PlayerId::One)
}

/// GET /player2/turn
pub async fn player_two_turn(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    stream_turn(state, PlayerId::Two)
}

fn stream_turn(
    state: Arc<AppState>,
    player: PlayerId,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (events, receiver) = TurnEvents::channel();

    // The turn runs to completion even if the client disconnects
    tokio::spawn(async move {
        let use_case = PlayTurn::new(
            state.board_store.clone(),
            state.llm_service.clone(),
            state.config.turn.clone(),
        );

        match use_case.execute(PlayTurnInput { player }, &events).await {
            Ok(result) => {
                let event = BoardEvent::new("boardUpdated", Some(player)).with_data(
                    serde_json::json!({
                        "turnId": result.turn_id,
                        "isLegal": result.is_legal,
                        "hitStepLimit": result.hit_step_limit,
                    }),
                );
                state.broadcast_event(event);
            }
            Err(e) => {
                tracing::error!("Turn for {} failed: {}", player.as_str(), e);
                events.status(format!("Turn failed: {}", e));
            }
        }
    });

    tracing::debug!("Turn stream started for {}", player.as_str());

    let stream = UnboundedReceiverStream::new(receiver)
        .filter_map(|event| future::ready(to_sse_event(event)))
        .chain(stream::once(future::ready(
            Event::default().event("close").data(END_OF_STREAM),
        )))
        .map(Ok::<_, Infallible>);

    Sse::new(stream).keep_alive(KeepAlive::default())
}

fn to_sse_event(event: TurnEvent) -> Option<Event> {
    match event {
        TurnEvent::Finished(result) => {
            let json = serde_json::to_string(&result).unwrap_or_default();
            Some(Event::default().event("result").data(json))
        }
        other => other
            .display_text()
            .map(|text| Event::default().data(sse_safe(&text))),
    }
}

/// SSE data cannot carry carriage returns; newlines become extra `data:` lines
fn sse_safe(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sse_safe_strips_carriage_returns() {
        assert_eq!(sse_safe("a\r\nb\rc\nd"), "a\nb\nc\nd");
    }
}
