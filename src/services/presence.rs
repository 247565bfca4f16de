//! Presence sweeper: removes player records whose heartbeat expired.

use std::time::Duration;

use tokio::time::{self, MissedTickBehavior};
use tracing::{info, warn};

use crate::{
    error::ServiceError,
    services::sse_events,
    state::{SharedState, epoch_ms},
};

/// Run the periodic presence sweep for the lifetime of the process.
pub async fn run(state: SharedState) {
    let mut interval = time::interval(Duration::from_secs(state.config().presence_sweep_secs));
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!("presence sweeper started");
    loop {
        interval.tick().await;
        if let Err(err) = sweep(&state).await {
            warn!(error = %err, "presence sweep failed; continuing");
        }
    }
}

/// Remove players without a heartbeat inside the TTL window. Players flagged
/// as completed are left alone; they sit on the results screen without
/// heartbeating and still belong on the leaderboard.
pub async fn sweep(state: &SharedState) -> Result<(), ServiceError> {
    let store = state.store();
    let ttl = state.config().presence_ttl_ms;
    let now = epoch_ms();

    let mut removed = 0usize;
    for player in store.list_players().await? {
        if player.completed || now - player.last_active <= ttl {
            continue;
        }
        if store.remove_player(player.identifier.clone()).await? {
            removed += 1;
        }
    }

    if removed > 0 {
        info!(removed, "pruned players with expired heartbeats");
        sse_events::broadcast_ranking(state).await;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use super::*;
    use crate::{
        catalog::CatalogClient,
        config::AppConfig,
        dao::{
            memory::MemoryRoomStore,
            models::{NicknameEntity, PlayerEntity},
            room_store::RoomStore,
        },
        state::AppState,
    };

    fn harness() -> (SharedState, Arc<dyn RoomStore>) {
        let config = AppConfig::default();
        let store = MemoryRoomStore::new(config.history_rounds);
        let catalog = CatalogClient::new("http://localhost:1", Duration::from_secs(1))
            .expect("catalog client");
        let state = AppState::new(config, Arc::new(store), catalog);
        let store = state.store();
        (state, store)
    }

    fn player(identifier: &str, last_active: i64, completed: bool) -> PlayerEntity {
        PlayerEntity {
            identifier: identifier.into(),
            nickname: NicknameEntity {
                name: identifier.into(),
                avatar: None,
            },
            points: 0,
            created_at: last_active,
            last_active,
            round_seen: 1,
            answered_index: None,
            completed,
        }
    }

    #[tokio::test]
    async fn sweep_removes_only_expired_uncompleted_players() {
        let (state, store) = harness();
        let now = epoch_ms();
        let ttl = state.config().presence_ttl_ms;

        store.upsert_player(player("fresh", now, false)).await.unwrap();
        store
            .upsert_player(player("expired", now - ttl - 1_000, false))
            .await
            .unwrap();
        store
            .upsert_player(player("done", now - ttl - 1_000, true))
            .await
            .unwrap();

        sweep(&state).await.expect("sweep");

        let remaining: Vec<_> = store
            .list_players()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.identifier)
            .collect();
        assert!(remaining.contains(&"fresh".to_string()));
        assert!(remaining.contains(&"done".to_string()));
        assert!(!remaining.contains(&"expired".to_string()));
    }
}
