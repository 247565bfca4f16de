//! Event names and broadcast helpers for the room SSE stream.

use tracing::warn;

use crate::{
    dao::models::RoomEntity,
    dto::{room::RoomStateResponse, sse::ServerEvent},
    services::ranking_service,
    state::{SharedState, epoch_ms},
};

/// Event name carrying a full room snapshot.
pub const EVENT_ROOM_STATE: &str = "room.state";
/// Event name carrying a recomputed leaderboard.
pub const EVENT_RANKING: &str = "ranking";

/// Push a room snapshot to every SSE subscriber.
pub fn broadcast_room_state(state: &SharedState, room: &RoomEntity) {
    let payload = RoomStateResponse::new(
        room.clone(),
        epoch_ms(),
        state.config().song_duration_secs,
    );
    send_event(state, EVENT_ROOM_STATE, &payload);
}

/// Recompute the leaderboard and push it to every SSE subscriber.
pub async fn broadcast_ranking(state: &SharedState) {
    match ranking_service::current_ranking(state, None).await {
        Ok(payload) => send_event(state, EVENT_RANKING, &payload),
        Err(err) => warn!(error = %err, "skipping ranking broadcast"),
    }
}

fn send_event<T: serde::Serialize>(state: &SharedState, name: &str, payload: &T) {
    match ServerEvent::json(Some(name.to_string()), payload) {
        Ok(event) => state.room_sse().broadcast(event),
        Err(err) => warn!(error = %err, event = name, "failed to serialize SSE payload"),
    }
}

/// Forward every room mutation from the store's watch channel onto the SSE
/// stream. Runs for the lifetime of the process.
pub async fn run_room_watcher(state: SharedState) {
    let mut receiver = state.store().watch_room();
    while receiver.changed().await.is_ok() {
        let snapshot = receiver.borrow_and_update().clone();
        if let Some(room) = snapshot {
            broadcast_room_state(&state, &room);
        }
    }
    warn!("room watch channel closed; snapshot broadcasts stopped");
}
