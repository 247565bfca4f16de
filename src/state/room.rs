//! Pure round-progression logic for the shared room.

use std::collections::HashSet;

use rand::{Rng, seq::SliceRandom};

use crate::dao::models::{RoomEntity, TrackEntity};

/// Fixed timing parameters of a round.
#[derive(Debug, Clone, Copy)]
pub struct RoundTiming {
    /// Guessing window per song, in seconds.
    pub song_duration_secs: i64,
    /// Delay between the end of a round and the next reshuffle, in seconds.
    pub round_delay_secs: i64,
}

impl RoundTiming {
    /// Guessing window in milliseconds.
    pub fn song_duration_ms(&self) -> i64 {
        self.song_duration_secs * 1_000
    }

    /// Inter-round delay in milliseconds.
    pub fn round_delay_ms(&self) -> i64 {
        self.round_delay_secs * 1_000
    }
}

/// Decision taken by one scheduler tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickAction {
    /// The inter-round delay elapsed: fetch a fresh playlist and hard-reset.
    Reshuffle,
    /// The current song has no start timestamp yet: stamp it now.
    StartSong {
        /// Index of the song to start.
        index: usize,
    },
    /// The guessing window elapsed and more songs remain.
    AdvanceSong {
        /// Index the room is currently on.
        from: usize,
        /// Index to move to.
        next: usize,
    },
    /// The guessing window elapsed on the last song: end the round.
    FinishRound {
        /// When the next round should begin (epoch milliseconds).
        next_round_start: i64,
    },
    /// Nothing to do this tick.
    Idle,
}

/// Evaluate one scheduler tick against a room snapshot.
///
/// Mirrors the authoritative advance loop: reshuffle when the round ended and
/// the scheduled restart is due, stamp a missing start timestamp, advance
/// after the guessing window, and finish the round on the last song.
pub fn plan_tick(room: &RoomEntity, now_ms: i64, timing: &RoundTiming) -> TickAction {
    let playlist_len = room.playlist.len();

    if room.current_index >= playlist_len {
        // Round-ended sentinel: wait for the scheduled restart.
        return match room.next_round_start {
            Some(due) if now_ms >= due => TickAction::Reshuffle,
            _ => TickAction::Idle,
        };
    }

    let Some(start) = room.current_start else {
        // No song clock running. Index 0 is the normal first-song start; a
        // missing timestamp mid-round is a benign race left by a concurrent
        // advance, recovered the same way.
        return TickAction::StartSong {
            index: room.current_index,
        };
    };

    let elapsed_secs = (now_ms - start).max(0) / 1_000;
    if elapsed_secs < timing.song_duration_secs {
        return TickAction::Idle;
    }

    if room.current_index + 1 < playlist_len {
        TickAction::AdvanceSong {
            from: room.current_index,
            next: room.current_index + 1,
        }
    } else {
        TickAction::FinishRound {
            next_round_start: now_ms + timing.round_delay_ms(),
        }
    }
}

/// Whole seconds left in the current song window, clamped to `[0, duration]`.
pub fn remaining_secs(room: &RoomEntity, now_ms: i64, song_duration_secs: i64) -> i64 {
    let Some(start) = room.current_start else {
        return 0;
    };
    let elapsed_secs = (now_ms - start).max(0) / 1_000;
    (song_duration_secs - elapsed_secs).clamp(0, song_duration_secs)
}

/// Select the next round's playlist from a candidate set.
///
/// Shuffles, prefers tracks not seen in the retained history window, and
/// backfills with repeats when too few unique tracks remain.
pub fn pick_round_tracks(
    mut candidates: Vec<TrackEntity>,
    recent: &HashSet<u64>,
    size: usize,
    rng: &mut impl Rng,
) -> Vec<TrackEntity> {
    candidates.shuffle(rng);

    let (fresh, repeats): (Vec<_>, Vec<_>) = candidates
        .into_iter()
        .partition(|track| !recent.contains(&track.id));

    let mut picked = fresh;
    picked.truncate(size);
    for track in repeats {
        if picked.len() >= size {
            break;
        }
        picked.push(track);
    }
    picked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::models::ArtistEntity;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const NOW: i64 = 1_700_000_000_000;
    const TIMING: RoundTiming = RoundTiming {
        song_duration_secs: 20,
        round_delay_secs: 20,
    };

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

    fn room_with(
        len: usize,
        current_index: usize,
        current_start: Option<i64>,
        next_round_start: Option<i64>,
    ) -> RoomEntity {
        RoomEntity {
            playlist: (0..len as u64).map(track).collect(),
            current_index,
            current_start,
            next_round_start,
            round: 1,
            last_playlist: (0..len as u64).collect(),
            version: 0,
        }
    }

    #[test]
    fn fresh_room_starts_first_song() {
        let room = room_with(15, 0, None, None);
        assert_eq!(plan_tick(&room, NOW, &TIMING), TickAction::StartSong { index: 0 });
    }

    #[test]
    fn elapsed_window_advances_to_next_song() {
        let room = room_with(15, 3, Some(NOW - 21_000), None);
        assert_eq!(
            plan_tick(&room, NOW, &TIMING),
            TickAction::AdvanceSong { from: 3, next: 4 }
        );
    }

    #[test]
    fn running_song_is_left_alone() {
        let room = room_with(15, 3, Some(NOW - 12_000), None);
        assert_eq!(plan_tick(&room, NOW, &TIMING), TickAction::Idle);
    }

    #[test]
    fn last_song_finishes_the_round() {
        let room = room_with(15, 14, Some(NOW - 20_000), None);
        assert_eq!(
            plan_tick(&room, NOW, &TIMING),
            TickAction::FinishRound {
                next_round_start: NOW + 20_000
            }
        );
    }

    #[test]
    fn ended_round_waits_for_schedule() {
        let room = room_with(15, 15, None, Some(NOW + 5_000));
        assert_eq!(plan_tick(&room, NOW, &TIMING), TickAction::Idle);

        let unscheduled = room_with(15, 15, None, None);
        assert_eq!(plan_tick(&unscheduled, NOW, &TIMING), TickAction::Idle);
    }

    #[test]
    fn due_schedule_triggers_reshuffle() {
        let room = room_with(15, 15, None, Some(NOW - 100));
        assert_eq!(plan_tick(&room, NOW, &TIMING), TickAction::Reshuffle);
    }

    #[test]
    fn missing_start_mid_round_restamps_current_song() {
        let room = room_with(15, 7, None, None);
        assert_eq!(plan_tick(&room, NOW, &TIMING), TickAction::StartSong { index: 7 });
    }

    #[test]
    fn remaining_secs_matches_countdown_formula() {
        let room = room_with(15, 2, Some(NOW - 7_400), None);
        assert_eq!(remaining_secs(&room, NOW, 20), 13);

        let expired = room_with(15, 2, Some(NOW - 60_000), None);
        assert_eq!(remaining_secs(&expired, NOW, 20), 0);

        let unstarted = room_with(15, 2, None, None);
        assert_eq!(remaining_secs(&unstarted, NOW, 20), 0);

        // A start timestamp slightly in the future clamps to the full window.
        let future = room_with(15, 2, Some(NOW + 500), None);
        assert_eq!(remaining_secs(&future, NOW, 20), 20);
    }

    #[test]
    fn pick_prefers_unseen_tracks() {
        let candidates: Vec<_> = (0..20u64).map(track).collect();
        let recent: HashSet<u64> = (0..5u64).collect();
        let mut rng = StdRng::seed_from_u64(42);

        let picked = pick_round_tracks(candidates, &recent, 15, &mut rng);
        assert_eq!(picked.len(), 15);
        assert!(picked.iter().all(|t| !recent.contains(&t.id)));
    }

    #[test]
    fn pick_backfills_with_repeats_when_short() {
        let candidates: Vec<_> = (0..18u64).map(track).collect();
        let recent: HashSet<u64> = (0..10u64).collect();
        let mut rng = StdRng::seed_from_u64(7);

        let picked = pick_round_tracks(candidates, &recent, 15, &mut rng);
        assert_eq!(picked.len(), 15);

        let unique = picked.iter().filter(|t| !recent.contains(&t.id)).count();
        assert_eq!(unique, 8);
    }

    #[test]
    fn pick_truncates_to_target_size() {
        let candidates: Vec<_> = (0..40u64).map(track).collect();
        let mut rng = StdRng::seed_from_u64(3);

        let picked = pick_round_tracks(candidates, &HashSet::new(), 15, &mut rng);
        assert_eq!(picked.len(), 15);
    }
}
