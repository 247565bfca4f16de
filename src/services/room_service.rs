//! Room lifecycle operations: lazy initialization, snapshots, player
//! registration, and the idempotent client-driven advance.

use std::collections::HashSet;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    dao::{
        models::{PlayerEntity, RoomEntity, RoomPatch},
        room_store::RoomWriteOutcome,
    },
    dto::{
        player::{JoinRequest, JoinResponse},
        room::{AdvanceOutcome, AdvanceRequest, AdvanceResponse, RoomStateResponse},
    },
    error::ServiceError,
    services::sse_events,
    state::{SharedState, epoch_ms, room},
};

/// Point-in-time room snapshot for clients.
pub async fn snapshot(state: &SharedState) -> Result<RoomStateResponse, ServiceError> {
    let room = state
        .store()
        .room()
        .await?
        .ok_or_else(|| ServiceError::NotFound("room has not been initialized yet".into()))?;
    Ok(RoomStateResponse::new(
        room,
        epoch_ms(),
        state.config().song_duration_secs,
    ))
}

/// Return the room, initializing it with a fresh playlist when absent.
///
/// Initialization runs under the reset lock so concurrent first joiners do
/// not all hit the catalog; losers of the race adopt the winner's room.
pub async fn ensure_room(state: &SharedState) -> Result<RoomEntity, ServiceError> {
    let store = state.store();
    if let Some(room) = store.room().await? {
        return Ok(room);
    }

    let config = state.config();
    if !store
        .try_acquire_reset_lock(config.lock_timeout_ms, epoch_ms())
        .await?
    {
        // Another actor is initializing right now; surface its result.
        return store.room().await?.ok_or_else(|| {
            ServiceError::InvalidState("room initialization already in progress".into())
        });
    }

    let result = initialize_room(state).await;
    if let Err(err) = store.release_reset_lock().await {
        warn!(error = %err, "failed to release reset lock after initialization");
    }
    result
}

async fn initialize_room(state: &SharedState) -> Result<RoomEntity, ServiceError> {
    let store = state.store();
    let config = state.config();

    let candidates = state.catalog().fetch_playlist(&config.playlist_id).await?;
    if candidates.is_empty() {
        return Err(ServiceError::InvalidState(
            "catalog returned no playable tracks".into(),
        ));
    }

    let recent: HashSet<u64> = store.recent_track_ids().await?.into_iter().collect();
    let picked = {
        let mut rng = rand::rng();
        room::pick_round_tracks(candidates, &recent, config.playlist_size, &mut rng)
    };
    let ids: Vec<u64> = picked.iter().map(|track| track.id).collect();

    let room = RoomEntity {
        playlist: picked,
        current_index: 0,
        current_start: None,
        next_round_start: None,
        round: 1,
        last_playlist: ids.clone(),
        version: 0,
    };

    if store.init_room(room.clone()).await? {
        store.push_round_history(ids).await?;
        info!(tracks = room.playlist.len(), "room initialized with fresh playlist");
        return Ok(room);
    }

    // Lost the init race despite the lock (a stale takeover); adopt the
    // record that won.
    store
        .room()
        .await?
        .ok_or_else(|| ServiceError::InvalidState("room initialization raced and lost".into()))
}

/// Register a player, creating the room on the first join.
pub async fn join(state: &SharedState, request: JoinRequest) -> Result<JoinResponse, ServiceError> {
    let room = ensure_room(state).await?;
    let store = state.store();
    let now = epoch_ms();

    if let Some(identifier) = &request.identifier {
        if let Some(existing) = store.find_player(identifier.clone()).await? {
            // Reload with a kept token: same record, refreshed heartbeat.
            store.touch_player(identifier.clone(), now).await?;
            let mut player = existing;
            player.last_active = now;
            debug!(identifier = %player.identifier, "player rejoined with existing record");
            return Ok(player.into());
        }
    }

    let nickname = request.nickname.resolve();
    let identifier = request
        .identifier
        .unwrap_or_else(|| synth_identifier(&nickname.name));
    let player = PlayerEntity {
        identifier,
        nickname,
        points: 0,
        created_at: now,
        last_active: now,
        round_seen: room.round,
        answered_index: None,
        completed: false,
    };
    store.upsert_player(player.clone()).await?;
    info!(identifier = %player.identifier, nickname = %player.nickname.display(), "player joined");

    sse_events::broadcast_ranking(state).await;
    Ok(player.into())
}

/// Advance past the song the client was on.
///
/// Safe to call from every client at once: the index check plus the
/// versioned write mean only the first request moves the room, and a
/// repeated request never restamps the song clock.
pub async fn advance(
    state: &SharedState,
    request: AdvanceRequest,
) -> Result<AdvanceResponse, ServiceError> {
    let store = state.store();
    let room = store
        .room()
        .await?
        .ok_or_else(|| ServiceError::NotFound("room has not been initialized yet".into()))?;

    let playlist_len = room.playlist.len();
    if room.current_index != request.from_index || request.from_index >= playlist_len {
        return Ok(AdvanceResponse {
            outcome: AdvanceOutcome::AlreadyAdvanced,
            current_index: room.current_index,
        });
    }

    let now = epoch_ms();
    let timing = state.config().timing();
    let (patch, outcome) = if request.from_index + 1 < playlist_len {
        (
            RoomPatch {
                current_index: Some(request.from_index + 1),
                current_start: Some(Some(now)),
                ..Default::default()
            },
            AdvanceOutcome::Advanced,
        )
    } else {
        (
            RoomPatch {
                current_index: Some(playlist_len),
                current_start: Some(None),
                next_round_start: Some(Some(now + timing.round_delay_ms())),
                ..Default::default()
            },
            AdvanceOutcome::RoundFinished,
        )
    };

    match store.update_room(patch, Some(room.version)).await? {
        RoomWriteOutcome::Applied(updated) => {
            info!(
                from = request.from_index,
                to = updated.current_index,
                outcome = ?outcome,
                "room advanced by client request"
            );
            Ok(AdvanceResponse {
                outcome,
                current_index: updated.current_index,
            })
        }
        RoomWriteOutcome::Conflict => {
            // Someone else advanced between our read and write.
            debug!(from = request.from_index, "advance lost the write race");
            let current_index = store
                .room()
                .await?
                .map(|current| current.current_index)
                .unwrap_or(request.from_index);
            Ok(AdvanceResponse {
                outcome: AdvanceOutcome::AlreadyAdvanced,
                current_index,
            })
        }
        RoomWriteOutcome::Missing => {
            Err(ServiceError::NotFound("room has not been initialized yet".into()))
        }
    }
}

/// Refresh a player's presence heartbeat.
pub async fn heartbeat(state: &SharedState, identifier: String) -> Result<(), ServiceError> {
    let touched = state.store().touch_player(identifier, epoch_ms()).await?;
    if !touched {
        return Err(ServiceError::NotFound("player is not registered".into()));
    }
    Ok(())
}

/// Flag a player as having reached the results screen, exempting them from
/// heartbeat cleanup until the next round.
pub async fn complete(state: &SharedState, identifier: String) -> Result<(), ServiceError> {
    let marked = state.store().mark_completed(identifier).await?;
    if !marked {
        return Err(ServiceError::NotFound("player is not registered".into()));
    }
    Ok(())
}

/// Remove a player record on explicit leave.
pub async fn leave(state: &SharedState, identifier: String) -> Result<(), ServiceError> {
    let removed = state.store().remove_player(identifier.clone()).await?;
    if !removed {
        return Err(ServiceError::NotFound("player is not registered".into()));
    }
    info!(%identifier, "player left the room");
    sse_events::broadcast_ranking(state).await;
    Ok(())
}

/// Derive a stable client token from the nickname plus a random suffix.
fn synth_identifier(name: &str) -> String {
    let slug: String = name
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_whitespace() { '-' } else { c })
        .collect();
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{slug}_{}", &suffix[..6])
}
