use futures::future::BoxFuture;
use tokio::sync::watch;

use crate::dao::{
    models::{PlayerEntity, RoomEntity, RoomPatch},
    storage::StorageResult,
};

/// Result of a conditional room update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomWriteOutcome {
    /// Patch merged; carries the room state after the write.
    Applied(RoomEntity),
    /// The expected version no longer matched; nothing was written.
    Conflict,
    /// The room has not been initialized yet.
    Missing,
}

/// Result of a scoring event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScoreOutcome {
    /// Points credited; carries the record after the write.
    Applied(PlayerEntity),
    /// The player already earned full credit on this song; nothing changed.
    AlreadyScored(PlayerEntity),
}

/// Abstraction over the shared store holding the room record, the player
/// collection, the round-reset lock, and the repeat-avoidance history.
pub trait RoomStore: Send + Sync {
    /// Point-in-time read of the room record.
    fn room(&self) -> BoxFuture<'static, StorageResult<Option<RoomEntity>>>;
    /// Install the initial room record; returns `false` when one already exists.
    fn init_room(&self, room: RoomEntity) -> BoxFuture<'static, StorageResult<bool>>;
    /// Merge a partial update into the room. When `expected_version` is given
    /// the write only lands if the stored version still matches.
    fn update_room(
        &self,
        patch: RoomPatch,
        expected_version: Option<u64>,
    ) -> BoxFuture<'static, StorageResult<RoomWriteOutcome>>;
    /// Push-based subscription firing on every room mutation, including the
    /// caller's own writes.
    fn watch_room(&self) -> watch::Receiver<Option<RoomEntity>>;

    /// Create or replace a player record.
    fn upsert_player(&self, player: PlayerEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Fetch a player record by identifier.
    fn find_player(
        &self,
        identifier: String,
    ) -> BoxFuture<'static, StorageResult<Option<PlayerEntity>>>;
    /// Apply a scoring event for one song: resets points when `round` is
    /// newer than the record's `round_seen`, accumulates otherwise, and
    /// refreshes activity. A song that already earned full credit reports
    /// [`ScoreOutcome::AlreadyScored`] without touching points. Returns
    /// `None` when the player is unknown.
    fn record_score(
        &self,
        identifier: String,
        round: u64,
        track_index: usize,
        points: u32,
        now_ms: i64,
    ) -> BoxFuture<'static, StorageResult<Option<ScoreOutcome>>>;
    /// Refresh a player's `last_active` heartbeat.
    fn touch_player(
        &self,
        identifier: String,
        now_ms: i64,
    ) -> BoxFuture<'static, StorageResult<bool>>;
    /// Flag a player as having reached the results screen.
    fn mark_completed(&self, identifier: String) -> BoxFuture<'static, StorageResult<bool>>;
    /// Remove a player record; returns whether one existed.
    fn remove_player(&self, identifier: String) -> BoxFuture<'static, StorageResult<bool>>;
    /// Snapshot of every player record in the room.
    fn list_players(&self) -> BoxFuture<'static, StorageResult<Vec<PlayerEntity>>>;

    /// Best-effort acquisition of the round-reset lock. Succeeds when the
    /// record is absent or older than `timeout_ms`.
    fn try_acquire_reset_lock(
        &self,
        timeout_ms: i64,
        now_ms: i64,
    ) -> BoxFuture<'static, StorageResult<bool>>;
    /// Unconditional lock release; any party may release any other's lock.
    fn release_reset_lock(&self) -> BoxFuture<'static, StorageResult<()>>;

    /// Catalog ids used in the retained history window, flattened.
    fn recent_track_ids(&self) -> BoxFuture<'static, StorageResult<Vec<u64>>>;
    /// Record a freshly installed playlist, evicting the oldest round once
    /// the history window is full.
    fn push_round_history(&self, track_ids: Vec<u64>) -> BoxFuture<'static, StorageResult<()>>;

    /// Probe the backend for liveness.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
}
