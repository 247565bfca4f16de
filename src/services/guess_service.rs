//! Guess evaluation and scoring against the current song window.

use tracing::info;

use crate::{
    dao::room_store::ScoreOutcome,
    dto::player::{GuessRequest, GuessResponse},
    error::ServiceError,
    services::sse_events,
    state::{SharedState, answer, epoch_ms, room},
};

/// Evaluate a guess and, when it earns full credit, award the remaining
/// whole seconds of the song window.
///
/// A guess aimed at an index the room already moved past is reported as
/// stale rather than rejected, so clients racing the scheduler see a normal
/// response instead of an error.
pub async fn submit_guess(
    state: &SharedState,
    identifier: String,
    request: GuessRequest,
) -> Result<GuessResponse, ServiceError> {
    let store = state.store();
    let current = store
        .room()
        .await?
        .ok_or_else(|| ServiceError::NotFound("room has not been initialized yet".into()))?;
    let player = store
        .find_player(identifier.clone())
        .await?
        .ok_or_else(|| ServiceError::NotFound("player is not registered".into()))?;

    if current.current_index >= current.playlist.len() || current.current_start.is_none() {
        return Err(ServiceError::InvalidState(
            "no song is currently playing".into(),
        ));
    }

    if request.track_index != current.current_index {
        return Ok(GuessResponse {
            correct: false,
            stale: true,
            title_matched: false,
            artist_matched: false,
            awarded: 0,
            time_left: 0,
            total_points: player.points,
        });
    }

    if player.round_seen == current.round && player.answered_index == Some(current.current_index) {
        // Already got this one right; input stays locked until the next song.
        return Ok(GuessResponse {
            correct: true,
            stale: false,
            title_matched: true,
            artist_matched: true,
            awarded: 0,
            time_left: room::remaining_secs(&current, epoch_ms(), state.config().song_duration_secs),
            total_points: player.points,
        });
    }

    let track = &current.playlist[current.current_index];
    let matched = answer::evaluate(&request.answer, &track.title, &track.artist.name);
    let now = epoch_ms();
    let time_left = room::remaining_secs(&current, now, state.config().song_duration_secs);

    if !matched.full() {
        // Partial matches report what landed but award nothing.
        store.touch_player(identifier, now).await?;
        return Ok(GuessResponse {
            correct: false,
            stale: false,
            title_matched: matched.title,
            artist_matched: matched.artist,
            awarded: 0,
            time_left,
            total_points: player.points,
        });
    }

    let awarded = time_left.max(0) as u32;
    let outcome = store
        .record_score(
            identifier.clone(),
            current.round,
            current.current_index,
            awarded,
            now,
        )
        .await?
        .ok_or_else(|| ServiceError::NotFound("player is not registered".into()))?;

    let updated = match outcome {
        ScoreOutcome::Applied(updated) => updated,
        ScoreOutcome::AlreadyScored(locked) => {
            // Concurrent duplicate lost the store-level race.
            return Ok(GuessResponse {
                correct: true,
                stale: false,
                title_matched: true,
                artist_matched: true,
                awarded: 0,
                time_left,
                total_points: locked.points,
            });
        }
    };
    info!(
        %identifier,
        track = current.current_index,
        awarded,
        total = updated.points,
        "correct guess scored"
    );

    sse_events::broadcast_ranking(state).await;
    Ok(GuessResponse {
        correct: true,
        stale: false,
        title_matched: true,
        artist_matched: true,
        awarded,
        time_left,
        total_points: updated.points,
    })
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
            models::{ArtistEntity, NicknameEntity, PlayerEntity, RoomEntity, TrackEntity},
            room_store::RoomStore,
        },
        state::AppState,
    };

    fn state_with_room() -> (SharedState, Arc<dyn RoomStore>) {
        let config = AppConfig::default();
        let store = MemoryRoomStore::new(config.history_rounds);
        let catalog = CatalogClient::new("http://localhost:1", Duration::from_secs(1))
            .expect("catalog client");
        let state = AppState::new(config, Arc::new(store), catalog);
        let store = state.store();
        (state, store)
    }

    async fn seed(store: &Arc<dyn RoomStore>, start_offset_ms: i64) {
        let room = RoomEntity {
            playlist: vec![TrackEntity {
                id: 1,
                title: "Bohemian Rhapsody".into(),
                preview: "https://cdn.example/1.mp3".into(),
                artist: ArtistEntity {
                    name: "Queen".into(),
                },
            }],
            current_index: 0,
            current_start: Some(epoch_ms() - start_offset_ms),
            next_round_start: None,
            round: 1,
            last_playlist: vec![1],
            version: 0,
        };
        assert!(store.init_room(room).await.expect("init"));

        let player = PlayerEntity {
            identifier: "ana_abc123".into(),
            nickname: NicknameEntity {
                name: "ana".into(),
                avatar: None,
            },
            points: 0,
            created_at: epoch_ms(),
            last_active: epoch_ms(),
            round_seen: 1,
            answered_index: None,
            completed: false,
        };
        store.upsert_player(player).await.expect("seed player");
    }

    #[tokio::test]
    async fn full_match_awards_remaining_seconds() {
        let (state, store) = state_with_room();
        seed(&store, 5_000).await;

        let response = submit_guess(
            &state,
            "ana_abc123".into(),
            GuessRequest {
                answer: "queen bohemian rhapsody".into(),
                track_index: 0,
            },
        )
        .await
        .expect("guess");

        assert!(response.correct);
        assert!(response.awarded >= 14 && response.awarded <= 15);
        assert_eq!(response.total_points, response.awarded);
    }

    #[tokio::test]
    async fn repeat_correct_guess_does_not_score_twice() {
        let (state, store) = state_with_room();
        seed(&store, 5_000).await;

        let first = submit_guess(
            &state,
            "ana_abc123".into(),
            GuessRequest {
                answer: "queen bohemian rhapsody".into(),
                track_index: 0,
            },
        )
        .await
        .expect("first guess");
        assert!(first.correct);
        assert!(first.awarded > 0);

        let repeat = submit_guess(
            &state,
            "ana_abc123".into(),
            GuessRequest {
                answer: "queen bohemian rhapsody".into(),
                track_index: 0,
            },
        )
        .await
        .expect("repeat guess");
        assert!(repeat.correct);
        assert_eq!(repeat.awarded, 0);
        assert_eq!(repeat.total_points, first.total_points);

        let stored = store
            .find_player("ana_abc123".into())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.points, first.awarded);
        assert_eq!(stored.answered_index, Some(0));
    }

    #[tokio::test]
    async fn partial_match_awards_nothing() {
        let (state, store) = state_with_room();
        seed(&store, 5_000).await;

        let response = submit_guess(
            &state,
            "ana_abc123".into(),
            GuessRequest {
                answer: "bohemian rhapsody".into(),
                track_index: 0,
            },
        )
        .await
        .expect("guess");

        assert!(!response.correct);
        assert!(response.title_matched);
        assert!(!response.artist_matched);
        assert_eq!(response.awarded, 0);
        assert_eq!(response.total_points, 0);
    }

    #[tokio::test]
    async fn stale_index_is_reported_not_rejected() {
        let (state, store) = state_with_room();
        seed(&store, 5_000).await;

        let response = submit_guess(
            &state,
            "ana_abc123".into(),
            GuessRequest {
                answer: "queen bohemian rhapsody".into(),
                track_index: 7,
            },
        )
        .await
        .expect("stale guess");

        assert!(response.stale);
        assert!(!response.correct);
        assert_eq!(response.awarded, 0);
    }

    #[tokio::test]
    async fn unknown_player_is_rejected() {
        let (state, store) = state_with_room();
        seed(&store, 5_000).await;

        let result = submit_guess(
            &state,
            "ghost".into(),
            GuessRequest {
                answer: "queen bohemian rhapsody".into(),
                track_index: 0,
            },
        )
        .await;
        assert!(matches!(result, Err(ServiceError::NotFound(_))));
    }
}
