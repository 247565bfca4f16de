use std::{collections::VecDeque, sync::Arc};

use dashmap::DashMap;
use futures::future::BoxFuture;
use tokio::sync::{Mutex, RwLock, watch};

use crate::dao::{
    models::{LockEntity, PlayerEntity, RoomEntity, RoomPatch},
    room_store::{RoomStore, RoomWriteOutcome, ScoreOutcome},
    storage::StorageResult,
};

/// In-process store backing the room singleton.
///
/// The room record lives behind an `RwLock` with a `watch` publisher so every
/// mutation fans out to subscribers; player records sit in a `DashMap` so
/// per-record updates are atomic without a global lock.
#[derive(Clone)]
pub struct MemoryRoomStore {
    inner: Arc<Inner>,
}

struct Inner {
    room: RwLock<Option<RoomEntity>>,
    room_tx: watch::Sender<Option<RoomEntity>>,
    players: DashMap<String, PlayerEntity>,
    reset_lock: Mutex<Option<LockEntity>>,
    history: Mutex<VecDeque<Vec<u64>>>,
    history_rounds: usize,
}

impl MemoryRoomStore {
    /// Build an empty store retaining `history_rounds` rounds of catalog ids.
    pub fn new(history_rounds: usize) -> Self {
        let (room_tx, _rx) = watch::channel(None);
        Self {
            inner: Arc::new(Inner {
                room: RwLock::new(None),
                room_tx,
                players: DashMap::new(),
                reset_lock: Mutex::new(None),
                history: Mutex::new(VecDeque::with_capacity(history_rounds)),
                history_rounds,
            }),
        }
    }
}

impl RoomStore for MemoryRoomStore {
    fn room(&self) -> BoxFuture<'static, StorageResult<Option<RoomEntity>>> {
        let inner = Arc::clone(&self.inner);
        Box::pin(async move {
            let guard = inner.room.read().await;
            Ok(guard.clone())
        })
    }

    fn init_room(&self, room: RoomEntity) -> BoxFuture<'static, StorageResult<bool>> {
        let inner = Arc::clone(&self.inner);
        Box::pin(async move {
            let mut guard = inner.room.write().await;
            if guard.is_some() {
                return Ok(false);
            }
            *guard = Some(room);
            inner.room_tx.send_replace(guard.clone());
            Ok(true)
        })
    }

    fn update_room(
        &self,
        patch: RoomPatch,
        expected_version: Option<u64>,
    ) -> BoxFuture<'static, StorageResult<RoomWriteOutcome>> {
        let inner = Arc::clone(&self.inner);
        Box::pin(async move {
            let mut guard = inner.room.write().await;
            let Some(room) = guard.as_mut() else {
                return Ok(RoomWriteOutcome::Missing);
            };
            if let Some(expected) = expected_version {
                if room.version != expected {
                    return Ok(RoomWriteOutcome::Conflict);
                }
            }
            room.apply(patch);
            let updated = room.clone();
            inner.room_tx.send_replace(guard.clone());
            Ok(RoomWriteOutcome::Applied(updated))
        })
    }

    fn watch_room(&self) -> watch::Receiver<Option<RoomEntity>> {
        self.inner.room_tx.subscribe()
    }

    fn upsert_player(&self, player: PlayerEntity) -> BoxFuture<'static, StorageResult<()>> {
        let inner = Arc::clone(&self.inner);
        Box::pin(async move {
            inner.players.insert(player.identifier.clone(), player);
            Ok(())
        })
    }

    fn find_player(
        &self,
        identifier: String,
    ) -> BoxFuture<'static, StorageResult<Option<PlayerEntity>>> {
        let inner = Arc::clone(&self.inner);
        Box::pin(async move { Ok(inner.players.get(&identifier).map(|entry| entry.clone())) })
    }

    fn record_score(
        &self,
        identifier: String,
        round: u64,
        track_index: usize,
        points: u32,
        now_ms: i64,
    ) -> BoxFuture<'static, StorageResult<Option<ScoreOutcome>>> {
        let inner = Arc::clone(&self.inner);
        Box::pin(async move {
            let Some(mut entry) = inner.players.get_mut(&identifier) else {
                return Ok(None);
            };
            let player = entry.value_mut();
            if round > player.round_seen {
                // Fresh round: the score starts over instead of accumulating.
                player.points = points;
                player.round_seen = round;
                player.answered_index = Some(track_index);
            } else {
                if player.answered_index == Some(track_index) {
                    // This song already paid out; the record stays locked
                    // until the room moves on.
                    return Ok(Some(ScoreOutcome::AlreadyScored(player.clone())));
                }
                player.points += points;
                player.answered_index = Some(track_index);
            }
            player.last_active = now_ms;
            Ok(Some(ScoreOutcome::Applied(player.clone())))
        })
    }

    fn touch_player(
        &self,
        identifier: String,
        now_ms: i64,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let inner = Arc::clone(&self.inner);
        Box::pin(async move {
            let Some(mut entry) = inner.players.get_mut(&identifier) else {
                return Ok(false);
            };
            entry.value_mut().last_active = now_ms;
            Ok(true)
        })
    }

    fn mark_completed(&self, identifier: String) -> BoxFuture<'static, StorageResult<bool>> {
        let inner = Arc::clone(&self.inner);
        Box::pin(async move {
            let Some(mut entry) = inner.players.get_mut(&identifier) else {
                return Ok(false);
            };
            entry.value_mut().completed = true;
            Ok(true)
        })
    }

    fn remove_player(&self, identifier: String) -> BoxFuture<'static, StorageResult<bool>> {
        let inner = Arc::clone(&self.inner);
        Box::pin(async move { Ok(inner.players.remove(&identifier).is_some()) })
    }

    fn list_players(&self) -> BoxFuture<'static, StorageResult<Vec<PlayerEntity>>> {
        let inner = Arc::clone(&self.inner);
        Box::pin(async move {
            Ok(inner
                .players
                .iter()
                .map(|entry| entry.value().clone())
                .collect())
        })
    }

    fn try_acquire_reset_lock(
        &self,
        timeout_ms: i64,
        now_ms: i64,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let inner = Arc::clone(&self.inner);
        Box::pin(async move {
            let mut guard = inner.reset_lock.lock().await;
            match guard.as_ref() {
                Some(lock) if now_ms - lock.timestamp <= timeout_ms => Ok(false),
                _ => {
                    *guard = Some(LockEntity { timestamp: now_ms });
                    Ok(true)
                }
            }
        })
    }

    fn release_reset_lock(&self) -> BoxFuture<'static, StorageResult<()>> {
        let inner = Arc::clone(&self.inner);
        Box::pin(async move {
            let mut guard = inner.reset_lock.lock().await;
            guard.take();
            Ok(())
        })
    }

    fn recent_track_ids(&self) -> BoxFuture<'static, StorageResult<Vec<u64>>> {
        let inner = Arc::clone(&self.inner);
        Box::pin(async move {
            let guard = inner.history.lock().await;
            Ok(guard.iter().flatten().copied().collect())
        })
    }

    fn push_round_history(&self, track_ids: Vec<u64>) -> BoxFuture<'static, StorageResult<()>> {
        let inner = Arc::clone(&self.inner);
        Box::pin(async move {
            let mut guard = inner.history.lock().await;
            guard.push_front(track_ids);
            guard.truncate(inner.history_rounds);
            Ok(())
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::models::{ArtistEntity, NicknameEntity, TrackEntity};

    fn track(id: u64) -> TrackEntity {
        TrackEntity {
            id,
            title: format!("Track {id}"),
            preview: format!("https://cdn.example/{id}.mp3"),
            artist: ArtistEntity {
                name: "Artist".into(),
            },
        }
    }

    fn room() -> RoomEntity {
        RoomEntity {
            playlist: (0..2).map(track).collect(),
            current_index: 0,
            current_start: None,
            next_round_start: None,
            round: 1,
            last_playlist: vec![0, 1],
            version: 0,
        }
    }

    fn player(identifier: &str, points: u32) -> PlayerEntity {
        PlayerEntity {
            identifier: identifier.into(),
            nickname: NicknameEntity {
                name: identifier.into(),
                avatar: None,
            },
            points,
            created_at: 1_000,
            last_active: 1_000,
            round_seen: 1,
            answered_index: None,
            completed: false,
        }
    }

    #[tokio::test]
    async fn init_room_only_succeeds_once() {
        let store = MemoryRoomStore::new(3);
        assert!(store.init_room(room()).await.unwrap());
        assert!(!store.init_room(room()).await.unwrap());
    }

    #[tokio::test]
    async fn versioned_update_rejects_stale_writers() {
        let store = MemoryRoomStore::new(3);
        store.init_room(room()).await.unwrap();

        let first = store
            .update_room(
                RoomPatch {
                    current_start: Some(Some(5_000)),
                    ..Default::default()
                },
                Some(0),
            )
            .await
            .unwrap();
        assert!(matches!(first, RoomWriteOutcome::Applied(_)));

        // A second writer holding the pre-write version must lose.
        let second = store
            .update_room(
                RoomPatch {
                    current_start: Some(Some(9_000)),
                    ..Default::default()
                },
                Some(0),
            )
            .await
            .unwrap();
        assert_eq!(second, RoomWriteOutcome::Conflict);

        let current = store.room().await.unwrap().unwrap();
        assert_eq!(current.current_start, Some(5_000));
    }

    #[tokio::test]
    async fn update_without_room_reports_missing() {
        let store = MemoryRoomStore::new(3);
        let outcome = store
            .update_room(RoomPatch::default(), None)
            .await
            .unwrap();
        assert_eq!(outcome, RoomWriteOutcome::Missing);
    }

    #[tokio::test]
    async fn watch_fires_on_every_mutation() {
        let store = MemoryRoomStore::new(3);
        let mut rx = store.watch_room();
        store.init_room(room()).await.unwrap();

        rx.changed().await.unwrap();
        let seen = rx.borrow_and_update().clone();
        assert_eq!(seen.unwrap().round, 1);
    }

    fn applied(outcome: ScoreOutcome) -> PlayerEntity {
        match outcome {
            ScoreOutcome::Applied(player) => player,
            ScoreOutcome::AlreadyScored(player) => {
                panic!("expected applied score, got already-scored: {player:?}")
            }
        }
    }

    #[tokio::test]
    async fn record_score_resets_on_new_round() {
        let store = MemoryRoomStore::new(3);
        store.upsert_player(player("ana_1b2c", 12)).await.unwrap();

        let same_round = applied(
            store
                .record_score("ana_1b2c".into(), 1, 4, 5, 2_000)
                .await
                .unwrap()
                .unwrap(),
        );
        assert_eq!(same_round.points, 17);

        let new_round = applied(
            store
                .record_score("ana_1b2c".into(), 2, 0, 8, 3_000)
                .await
                .unwrap()
                .unwrap(),
        );
        assert_eq!(new_round.points, 8);
        assert_eq!(new_round.round_seen, 2);
        assert_eq!(new_round.last_active, 3_000);
    }

    #[tokio::test]
    async fn record_score_locks_a_song_after_it_pays_out() {
        let store = MemoryRoomStore::new(3);
        store.upsert_player(player("ana_1b2c", 0)).await.unwrap();

        let first = applied(
            store
                .record_score("ana_1b2c".into(), 1, 4, 15, 2_000)
                .await
                .unwrap()
                .unwrap(),
        );
        assert_eq!(first.points, 15);

        let repeat = store
            .record_score("ana_1b2c".into(), 1, 4, 14, 2_100)
            .await
            .unwrap()
            .unwrap();
        let ScoreOutcome::AlreadyScored(locked) = repeat else {
            panic!("repeat score on the same song must not pay out");
        };
        assert_eq!(locked.points, 15);

        // The next song unlocks scoring again.
        let next_song = applied(
            store
                .record_score("ana_1b2c".into(), 1, 5, 9, 3_000)
                .await
                .unwrap()
                .unwrap(),
        );
        assert_eq!(next_song.points, 24);
        assert_eq!(next_song.answered_index, Some(5));
    }

    #[tokio::test]
    async fn lock_blocks_until_stale() {
        let store = MemoryRoomStore::new(3);
        assert!(store.try_acquire_reset_lock(3_000, 10_000).await.unwrap());
        assert!(!store.try_acquire_reset_lock(3_000, 11_000).await.unwrap());
        // Past the timeout the holder is presumed dead and the lock is stolen.
        assert!(store.try_acquire_reset_lock(3_000, 14_500).await.unwrap());

        store.release_reset_lock().await.unwrap();
        assert!(store.try_acquire_reset_lock(3_000, 14_600).await.unwrap());
    }

    #[tokio::test]
    async fn history_ring_keeps_last_three_rounds() {
        let store = MemoryRoomStore::new(3);
        for round in 0..4u64 {
            store
                .push_round_history(vec![round * 10, round * 10 + 1])
                .await
                .unwrap();
        }

        let recent = store.recent_track_ids().await.unwrap();
        assert_eq!(recent.len(), 6);
        assert!(!recent.contains(&0));
        assert!(recent.contains(&30));
    }
}
