use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    dao::models::RoomEntity,
    state::room::{self},
};

/// Room snapshot served to clients, extended with the server clock so local
/// countdowns can be derived without logical divergence.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoomStateResponse {
    /// Persisted room record in its original wire shape.
    #[serde(flatten)]
    pub room: RoomEntity,
    /// Server wall-clock time at snapshot, epoch milliseconds.
    pub server_time: i64,
    /// Whole seconds left in the current song window at snapshot time.
    pub time_left: i64,
}

impl RoomStateResponse {
    /// Build a snapshot response, deriving the countdown from the room clock.
    pub fn new(room: RoomEntity, now_ms: i64, song_duration_secs: i64) -> Self {
        let time_left = room::remaining_secs(&room, now_ms, song_duration_secs);
        Self {
            room,
            server_time: now_ms,
            time_left,
        }
    }
}

/// Client request to advance past the song it was on (answer revealed or
/// countdown expired locally).
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdvanceRequest {
    /// Index the requesting client believes is current. A stale value makes
    /// the request a safe no-op.
    pub from_index: usize,
}

/// How an advance request was resolved.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AdvanceOutcome {
    /// The room moved to the next song.
    Advanced,
    /// The last song finished; the inter-round delay was scheduled.
    RoundFinished,
    /// Another actor already advanced past `from_index`; nothing changed.
    AlreadyAdvanced,
}

/// Response to an advance request.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdvanceResponse {
    /// Resolution of the request.
    pub outcome: AdvanceOutcome,
    /// Index the room is on after the request.
    pub current_index: usize,
}
