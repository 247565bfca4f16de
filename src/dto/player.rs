use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationErrors};

use crate::{
    dao::models::{NicknameEntity, PlayerEntity},
    dto::validation::validate_nickname,
};

/// Nickname as submitted by clients: either a bare string or a structured
/// value with an avatar glyph. Resolved to one tagged type at this boundary.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum NicknameInput {
    /// Plain display name.
    Plain(String),
    /// Display name plus avatar glyph.
    Detailed {
        /// Display name.
        name: String,
        /// Avatar glyph chosen by the player.
        #[serde(default)]
        avatar: Option<String>,
    },
}

impl NicknameInput {
    /// Resolve the duck-typed input into the canonical nickname value.
    pub fn resolve(self) -> NicknameEntity {
        match self {
            NicknameInput::Plain(name) => NicknameEntity {
                name: name.trim().to_string(),
                avatar: None,
            },
            NicknameInput::Detailed { name, avatar } => NicknameEntity {
                name: name.trim().to_string(),
                avatar,
            },
        }
    }

    fn name(&self) -> &str {
        match self {
            NicknameInput::Plain(name) => name,
            NicknameInput::Detailed { name, .. } => name,
        }
    }
}

/// Payload used to register a player in the room.
#[derive(Debug, Deserialize, ToSchema)]
pub struct JoinRequest {
    /// Nickname, plain or structured.
    pub nickname: NicknameInput,
    /// Identifier from a previous visit, so reloads keep the same record.
    #[serde(default)]
    pub identifier: Option<String>,
}

impl Validate for JoinRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Err(e) = validate_nickname(self.nickname.name()) {
            errors.add("nickname", e);
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Confirmation returned once a player record exists.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JoinResponse {
    /// Stable token the client must persist and reuse.
    pub identifier: String,
    /// Resolved nickname stored for the player.
    pub nickname: NicknameEntity,
    /// Current points (0 for a fresh record).
    pub points: u32,
    /// Round the record was last scored in.
    pub round_seen: u64,
}

impl From<PlayerEntity> for JoinResponse {
    fn from(player: PlayerEntity) -> Self {
        Self {
            identifier: player.identifier,
            nickname: player.nickname,
            points: player.points,
            round_seen: player.round_seen,
        }
    }
}

/// A guess submitted against the current song.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GuessRequest {
    /// Free-text submission typed by the player.
    #[validate(length(min = 1, max = 200))]
    pub answer: String,
    /// Song index the client was answering; rejected as stale when the room
    /// has moved on.
    pub track_index: usize,
}

/// Evaluation of a guess.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GuessResponse {
    /// Full credit: both title and artist matched.
    pub correct: bool,
    /// The room advanced before the guess arrived; nothing was scored.
    pub stale: bool,
    /// The normalized submission contained the title.
    pub title_matched: bool,
    /// The normalized submission contained the artist.
    pub artist_matched: bool,
    /// Points awarded for this guess (remaining whole seconds, 0 when wrong).
    pub awarded: u32,
    /// Whole seconds that were left on the clock when the guess landed.
    pub time_left: i64,
    /// Player's total after the guess.
    pub total_points: u32,
}

/// Query parameters for the ranking endpoint.
#[derive(Debug, Deserialize, IntoParams)]
pub struct RankingQuery {
    /// Identifier of the requesting player; includes their rank when they
    /// fall outside the exposed top entries.
    pub player: Option<String>,
}

/// One leaderboard row.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RankingEntry {
    /// 1-based position.
    pub rank: usize,
    /// Player identifier.
    pub identifier: String,
    /// Resolved nickname.
    pub nickname: NicknameEntity,
    /// Points in the current round.
    pub points: u32,
    /// Record creation time, epoch milliseconds (ascending tie-break).
    pub created_at: i64,
}

/// Deduplicated, pruned, sorted leaderboard view.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RankingResponse {
    /// Top entries, capped at the configured leaderboard size.
    pub entries: Vec<RankingEntry>,
    /// The requester's own row when ranked below the exposed top.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub own_rank: Option<RankingEntry>,
    /// RFC3339 timestamp of when the view was computed.
    pub generated_at: String,
}
