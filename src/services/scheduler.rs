//! Authoritative round scheduler: a 1-second tick loop that starts songs,
//! advances past expired windows, and reshuffles between rounds.

use std::collections::HashSet;
use std::time::Duration;

use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::{
    dao::{models::RoomPatch, room_store::RoomWriteOutcome},
    error::ServiceError,
    state::{SharedState, epoch_ms, room::{self, TickAction}},
};

/// Run the scheduler loop for the lifetime of the process. Tick failures are
/// logged and the loop keeps going; a transiently unavailable store must not
/// kill round progression.
pub async fn run(state: SharedState) {
    let mut interval = time::interval(Duration::from_secs(1));
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!("round scheduler started");
    loop {
        interval.tick().await;
        if let Err(err) = tick(&state).await {
            warn!(error = %err, "scheduler tick failed; continuing");
        }
    }
}

/// Evaluate one tick against the current room snapshot and commit the
/// resulting transition, if any, with a versioned write.
pub async fn tick(state: &SharedState) -> Result<(), ServiceError> {
    let store = state.store();
    let Some(current) = store.room().await? else {
        // Nothing to drive until the first join initializes the room.
        return Ok(());
    };

    let now = epoch_ms();
    let timing = state.config().timing();

    let patch = match room::plan_tick(&current, now, &timing) {
        TickAction::Idle => return Ok(()),
        TickAction::Reshuffle => return reshuffle(state, current.round).await,
        TickAction::StartSong { index } => {
            debug!(index, "starting song clock");
            RoomPatch {
                current_start: Some(Some(now)),
                ..Default::default()
            }
        }
        TickAction::AdvanceSong { from, next } => {
            info!(from, next, "song window elapsed; advancing");
            RoomPatch {
                current_index: Some(next),
                current_start: Some(Some(now)),
                ..Default::default()
            }
        }
        TickAction::FinishRound { next_round_start } => {
            info!(next_round_start, "last song finished; scheduling next round");
            RoomPatch {
                current_index: Some(current.playlist.len()),
                current_start: Some(None),
                next_round_start: Some(Some(next_round_start)),
                ..Default::default()
            }
        }
    };

    match store.update_room(patch, Some(current.version)).await? {
        RoomWriteOutcome::Applied(_) => Ok(()),
        RoomWriteOutcome::Conflict => {
            // A client advance beat us to it; the next tick re-evaluates.
            debug!("scheduler write lost the race");
            Ok(())
        }
        RoomWriteOutcome::Missing => Ok(()),
    }
}

/// Install a fresh playlist for the next round, guarded by the reset lock so
/// only one scheduler instance hits the catalog.
async fn reshuffle(state: &SharedState, finished_round: u64) -> Result<(), ServiceError> {
    let store = state.store();
    let config = state.config();
    let now = epoch_ms();

    if !store
        .try_acquire_reset_lock(config.lock_timeout_ms, now)
        .await?
    {
        debug!("reset lock held elsewhere; skipping reshuffle this tick");
        return Ok(());
    }

    let result = reshuffle_locked(state, finished_round).await;
    if let Err(err) = store.release_reset_lock().await {
        warn!(error = %err, "failed to release reset lock after reshuffle");
    }
    result
}

async fn reshuffle_locked(state: &SharedState, finished_round: u64) -> Result<(), ServiceError> {
    let store = state.store();
    let config = state.config();

    // Re-read under the lock: another holder may have reshuffled already.
    let Some(current) = store.room().await? else {
        return Ok(());
    };
    if current.round != finished_round || current.current_index < current.playlist.len() {
        debug!("room already reshuffled by another actor");
        return Ok(());
    }

    let candidates = match state.catalog().fetch_playlist(&config.playlist_id).await {
        Ok(tracks) if !tracks.is_empty() => tracks,
        Ok(_) => {
            warn!("catalog returned no playable tracks; keeping current playlist");
            return Ok(());
        }
        Err(err) => {
            // The room stays on its ended-round sentinel and the next due
            // tick retries the fetch.
            warn!(error = %err, "catalog fetch failed; retrying on a later tick");
            return Ok(());
        }
    };

    let recent: HashSet<u64> = store.recent_track_ids().await?.into_iter().collect();
    let picked = {
        let mut rng = rand::rng();
        room::pick_round_tracks(candidates, &recent, config.playlist_size, &mut rng)
    };
    let ids: Vec<u64> = picked.iter().map(|track| track.id).collect();
    let now = epoch_ms();

    let patch = RoomPatch {
        playlist: Some(picked),
        current_index: Some(0),
        current_start: Some(Some(now)),
        next_round_start: Some(None),
        round: Some(current.round + 1),
        last_playlist: Some(ids.clone()),
    };

    match store.update_room(patch, Some(current.version)).await? {
        RoomWriteOutcome::Applied(updated) => {
            store.push_round_history(ids).await?;
            info!(
                round = updated.round,
                tracks = updated.playlist.len(),
                "new round started with fresh playlist"
            );
            Ok(())
        }
        RoomWriteOutcome::Conflict => {
            debug!("reshuffle write lost the race");
            Ok(())
        }
        RoomWriteOutcome::Missing => Ok(()),
    }
}
