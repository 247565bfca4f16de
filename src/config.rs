//! Application-level configuration loading, including round timing tunables.

use std::{env, fs, io::ErrorKind, path::PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

use crate::state::room::RoundTiming;

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "LIVE_QUIZ_BACK_CONFIG_PATH";

/// Immutable runtime configuration shared across the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Base URL of the catalog proxy (`GET {base}/playlist/{id}`).
    pub catalog_base_url: String,
    /// Catalog playlist the room draws candidate tracks from.
    pub playlist_id: String,
    /// Number of tracks installed per round.
    pub playlist_size: usize,
    /// Guessing window per song, in seconds.
    pub song_duration_secs: i64,
    /// Delay between the end of a round and the next reshuffle, in seconds.
    pub round_delay_secs: i64,
    /// How many past rounds of catalog ids are kept for repeat-avoidance.
    pub history_rounds: usize,
    /// Staleness threshold for the round-reset lock, in milliseconds.
    pub lock_timeout_ms: i64,
    /// Ranking drops players idle for longer than this, in milliseconds.
    pub inactivity_threshold_ms: i64,
    /// Players without a heartbeat for this long are removed, in milliseconds.
    pub presence_ttl_ms: i64,
    /// Interval between presence sweeps, in seconds.
    pub presence_sweep_secs: u64,
    /// Number of leaderboard entries exposed to clients.
    pub ranking_size: usize,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to baked-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let config: Self = raw.into();
                    info!(path = %path.display(), "loaded configuration from file");
                    config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Round timing parameters derived from the configuration.
    pub fn timing(&self) -> RoundTiming {
        RoundTiming {
            song_duration_secs: self.song_duration_secs,
            round_delay_secs: self.round_delay_secs,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            catalog_base_url: "http://localhost:3000".into(),
            playlist_id: "13739118261".into(),
            playlist_size: 15,
            song_duration_secs: 20,
            round_delay_secs: 20,
            history_rounds: 3,
            lock_timeout_ms: 3_000,
            inactivity_threshold_ms: 180_000,
            presence_ttl_ms: 90_000,
            presence_sweep_secs: 30,
            ranking_size: 15,
        }
    }
}

/// JSON representation of the configuration file; every field is optional and
/// falls back to the built-in default.
#[derive(Debug, Deserialize)]
struct RawConfig {
    catalog_base_url: Option<String>,
    playlist_id: Option<String>,
    playlist_size: Option<usize>,
    song_duration_secs: Option<i64>,
    round_delay_secs: Option<i64>,
    history_rounds: Option<usize>,
    lock_timeout_ms: Option<i64>,
    inactivity_threshold_ms: Option<i64>,
    presence_ttl_ms: Option<i64>,
    presence_sweep_secs: Option<u64>,
    ranking_size: Option<usize>,
}

impl From<RawConfig> for AppConfig {
    fn from(raw: RawConfig) -> Self {
        let defaults = AppConfig::default();
        Self {
            catalog_base_url: raw.catalog_base_url.unwrap_or(defaults.catalog_base_url),
            playlist_id: raw.playlist_id.unwrap_or(defaults.playlist_id),
            playlist_size: raw.playlist_size.unwrap_or(defaults.playlist_size),
            song_duration_secs: raw.song_duration_secs.unwrap_or(defaults.song_duration_secs),
            round_delay_secs: raw.round_delay_secs.unwrap_or(defaults.round_delay_secs),
            history_rounds: raw.history_rounds.unwrap_or(defaults.history_rounds),
            lock_timeout_ms: raw.lock_timeout_ms.unwrap_or(defaults.lock_timeout_ms),
            inactivity_threshold_ms: raw
                .inactivity_threshold_ms
                .unwrap_or(defaults.inactivity_threshold_ms),
            presence_ttl_ms: raw.presence_ttl_ms.unwrap_or(defaults.presence_ttl_ms),
            presence_sweep_secs: raw
                .presence_sweep_secs
                .unwrap_or(defaults.presence_sweep_secs),
            ranking_size: raw.ranking_size.unwrap_or(defaults.ranking_size),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
