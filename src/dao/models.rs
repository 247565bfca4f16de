use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Persisted state of the single shared room.
///
/// Field names on the wire keep the shape the original frontends consume
/// (`musicaAtual`, `musicStartTimestamp`, `nextRoundStart`, `ultimaPlaylist`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct RoomEntity {
    /// Tracks selected for the current round, already shuffled.
    pub playlist: Vec<TrackEntity>,
    /// Index of the current song; `playlist.len()` means the round just ended.
    #[serde(rename = "musicaAtual")]
    pub current_index: usize,
    /// Epoch milliseconds when the current song window began, if it started.
    #[serde(rename = "musicStartTimestamp")]
    pub current_start: Option<i64>,
    /// Epoch milliseconds when the next round is scheduled to begin.
    #[serde(rename = "nextRoundStart")]
    pub next_round_start: Option<i64>,
    /// Monotonic round counter, bumped each time a fresh playlist is installed.
    pub round: u64,
    /// Catalog ids of the most recently installed playlist.
    #[serde(rename = "ultimaPlaylist")]
    pub last_playlist: Vec<u64>,
    /// Write counter used for conditional updates; bumped on every applied patch.
    pub version: u64,
}

/// Track metadata kept for the lifetime of one round.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct TrackEntity {
    /// Stable catalog id, used for repeat-avoidance across rounds.
    pub id: u64,
    /// Song title as returned by the catalog.
    pub title: String,
    /// Preview audio URL (always playable; previewless tracks are filtered out).
    pub preview: String,
    /// Performing artist.
    pub artist: ArtistEntity,
}

/// Artist record nested inside a track, mirroring the catalog payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct ArtistEntity {
    /// Artist display name.
    pub name: String,
}

/// Player record persisted per participant, keyed by their identifier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct PlayerEntity {
    /// Stable client token (nickname plus random suffix), survives reloads.
    pub identifier: String,
    /// Resolved nickname value.
    pub nickname: NicknameEntity,
    /// Points accumulated within the current round.
    pub points: u32,
    /// Epoch milliseconds when the record was created.
    #[serde(rename = "createdAt")]
    pub created_at: i64,
    /// Epoch milliseconds of the last scoring event or heartbeat.
    #[serde(rename = "lastActive")]
    pub last_active: i64,
    /// Last round id a scoring event was processed for; points reset when a
    /// score lands in a newer round.
    #[serde(rename = "roundSeen")]
    pub round_seen: u64,
    /// Song index within `round_seen` that already earned full credit, if
    /// any. Locks out repeat scoring on the same song.
    #[serde(rename = "answeredIndex")]
    pub answered_index: Option<usize>,
    /// Set when the player reached the results screen; suppresses TTL cleanup.
    pub completed: bool,
}

/// Single tagged nickname value, resolved at the boundary where player
/// input is accepted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct NicknameEntity {
    /// Mandatory display name.
    pub name: String,
    /// Optional avatar glyph chosen by the player.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl NicknameEntity {
    /// Display name shown on leaderboards; also the deduplication key.
    pub fn display(&self) -> &str {
        &self.name
    }
}

/// Advisory lock record stored at a fixed slot.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct LockEntity {
    /// Epoch milliseconds when the lock was taken; older than the timeout
    /// means stale and free to overwrite.
    pub timestamp: i64,
}

/// Partial room update merged field-by-field into the stored record.
///
/// `current_start` and `next_round_start` are doubly optional so a patch can
/// distinguish "leave untouched" from "clear to null".
#[derive(Debug, Clone, Default)]
pub struct RoomPatch {
    /// Replacement playlist; presence marks the patch as a reshuffle.
    pub playlist: Option<Vec<TrackEntity>>,
    /// New current song index.
    pub current_index: Option<usize>,
    /// New song clock value, or `Some(None)` to clear it.
    pub current_start: Option<Option<i64>>,
    /// New restart schedule, or `Some(None)` to clear it (reshuffle only).
    pub next_round_start: Option<Option<i64>>,
    /// New round counter value.
    pub round: Option<u64>,
    /// Catalog ids of the playlist being installed.
    pub last_playlist: Option<Vec<u64>>,
}

impl RoomEntity {
    /// Merge a patch into the room and bump the write version.
    ///
    /// `next_round_start`, once set, never moves backwards and is only cleared
    /// by a patch that also installs a fresh playlist (the reshuffle hard
    /// reset).
    pub fn apply(&mut self, patch: RoomPatch) {
        let reshuffle = patch.playlist.is_some();

        if let Some(playlist) = patch.playlist {
            self.playlist = playlist;
        }
        if let Some(index) = patch.current_index {
            // Keep the sentinel invariant: 0 <= index <= playlist.len().
            self.current_index = index.min(self.playlist.len());
        }
        if let Some(start) = patch.current_start {
            self.current_start = start;
        }
        if let Some(next) = patch.next_round_start {
            self.next_round_start = match (self.next_round_start, next, reshuffle) {
                (Some(existing), Some(candidate), false) => Some(existing.max(candidate)),
                (Some(existing), None, false) => Some(existing),
                (_, value, _) => value,
            };
        }
        if let Some(round) = patch.round {
            self.round = round;
        }
        if let Some(ids) = patch.last_playlist {
            self.last_playlist = ids;
        }

        self.version += 1;
    }
}
