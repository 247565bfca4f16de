//! Client for the external music catalog collaborator.

use std::time::Duration;

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

use crate::dao::models::{ArtistEntity, TrackEntity};

/// Errors returned by the catalog collaborator.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Transport-level failure or invalid JSON body.
    #[error("catalog request failed")]
    Request(#[from] reqwest::Error),
    /// The catalog answered with a non-success status.
    #[error("catalog returned status {0}")]
    Status(StatusCode),
    /// The response body did not contain a `tracks.data` array.
    #[error("catalog payload missing tracks data")]
    MalformedPayload,
}

/// Thin HTTP client over `GET /playlist/{id}`.
#[derive(Clone)]
pub struct CatalogClient {
    http: reqwest::Client,
    base_url: String,
}

impl CatalogClient {
    /// Build a client for the given catalog base URL.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, CatalogError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch the candidate track set for a playlist, dropping tracks without
    /// a playable preview.
    pub async fn fetch_playlist(&self, playlist_id: &str) -> Result<Vec<TrackEntity>, CatalogError> {
        let url = format!("{}/playlist/{}", self.base_url, playlist_id);
        let response = self.http.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(CatalogError::Status(response.status()));
        }

        let payload: PlaylistPayload = response.json().await?;
        let data = payload
            .tracks
            .and_then(|tracks| tracks.data)
            .ok_or(CatalogError::MalformedPayload)?;

        Ok(data
            .into_iter()
            .filter_map(|track| {
                let preview = track.preview.filter(|url| !url.is_empty())?;
                Some(TrackEntity {
                    id: track.id,
                    title: track.title,
                    preview,
                    artist: ArtistEntity {
                        name: track.artist.name,
                    },
                })
            })
            .collect())
    }
}

#[derive(Debug, Deserialize)]
struct PlaylistPayload {
    tracks: Option<TracksEnvelope>,
}

#[derive(Debug, Deserialize)]
struct TracksEnvelope {
    data: Option<Vec<CatalogTrack>>,
}

#[derive(Debug, Deserialize)]
struct CatalogTrack {
    id: u64,
    title: String,
    preview: Option<String>,
    artist: CatalogArtist,
}

#[derive(Debug, Deserialize)]
struct CatalogArtist {
    name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_parses_catalog_envelope() {
        let body = r#"{
            "tracks": {
                "data": [
                    {"id": 1, "title": "Song A", "preview": "https://cdn/a.mp3", "artist": {"name": "Band"}},
                    {"id": 2, "title": "Song B", "preview": null, "artist": {"name": "Band"}},
                    {"id": 3, "title": "Song C", "preview": "", "artist": {"name": "Band"}}
                ]
            }
        }"#;

        let payload: PlaylistPayload = serde_json::from_str(body).unwrap();
        let data = payload.tracks.unwrap().data.unwrap();
        assert_eq!(data.len(), 3);
        assert_eq!(data[0].preview.as_deref(), Some("https://cdn/a.mp3"));
        assert!(data[1].preview.is_none());
    }

    #[test]
    fn missing_tracks_data_is_detected() {
        let payload: PlaylistPayload = serde_json::from_str(r#"{"error": "oops"}"#).unwrap();
        assert!(payload.tracks.is_none());

        let payload: PlaylistPayload = serde_json::from_str(r#"{"tracks": {}}"#).unwrap();
        assert!(payload.tracks.unwrap().data.is_none());
    }
}
