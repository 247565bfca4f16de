//! Leaderboard assembly: prune inactive records, collapse duplicate
//! nicknames, sort, and cap to the exposed size.

use indexmap::IndexMap;

use crate::{
    dao::models::PlayerEntity,
    dto::{
        format_epoch_ms,
        player::{RankingEntry, RankingResponse},
    },
    error::ServiceError,
    state::{SharedState, epoch_ms},
};

/// Compute the ranking view over the requesting player's peers.
pub async fn current_ranking(
    state: &SharedState,
    requester: Option<&str>,
) -> Result<RankingResponse, ServiceError> {
    let store = state.store();
    let players = store.list_players().await?;
    // Records that have not scored in the current round rank at zero.
    let current_round = store.room().await?.map(|room| room.round).unwrap_or(0);
    let config = state.config();
    Ok(build_ranking(
        players,
        current_round,
        epoch_ms(),
        config.inactivity_threshold_ms,
        config.ranking_size,
        requester,
    ))
}

/// Build the leaderboard from a raw player snapshot.
///
/// Records idle past the inactivity threshold are dropped, and a record
/// whose last scoring event belongs to an older round counts as zero points
/// until it scores again. When several records share a display name (reloads
/// that lost their identifier), only the best one survives: highest points,
/// then the newest record. The result is sorted by points descending with
/// creation time as the tie-break, so whoever reached a score first stays
/// ahead.
pub fn build_ranking(
    players: Vec<PlayerEntity>,
    current_round: u64,
    now_ms: i64,
    inactivity_threshold_ms: i64,
    top_n: usize,
    requester: Option<&str>,
) -> RankingResponse {
    let mut by_name: IndexMap<String, PlayerEntity> = IndexMap::new();
    for mut player in players {
        if now_ms - player.last_active > inactivity_threshold_ms {
            continue;
        }
        if player.round_seen < current_round {
            player.points = 0;
        }
        match by_name.entry(player.nickname.display().to_string()) {
            indexmap::map::Entry::Vacant(slot) => {
                slot.insert(player);
            }
            indexmap::map::Entry::Occupied(mut slot) => {
                let kept = slot.get();
                let better = player.points > kept.points
                    || (player.points == kept.points && player.created_at > kept.created_at);
                if better {
                    slot.insert(player);
                }
            }
        }
    }

    let mut survivors: Vec<PlayerEntity> = by_name.into_values().collect();
    survivors.sort_by(|a, b| {
        b.points
            .cmp(&a.points)
            .then(a.created_at.cmp(&b.created_at))
            .then(a.identifier.cmp(&b.identifier))
    });

    let ranked: Vec<RankingEntry> = survivors
        .into_iter()
        .enumerate()
        .map(|(position, player)| RankingEntry {
            rank: position + 1,
            identifier: player.identifier,
            nickname: player.nickname,
            points: player.points,
            created_at: player.created_at,
        })
        .collect();

    let own_rank = requester.and_then(|identifier| {
        ranked
            .iter()
            .find(|entry| entry.identifier == identifier)
            .filter(|entry| entry.rank > top_n)
            .cloned()
    });

    let mut entries = ranked;
    entries.truncate(top_n);

    RankingResponse {
        entries,
        own_rank,
        generated_at: format_epoch_ms(now_ms),
    }
}
