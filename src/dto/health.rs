use serde::Serialize;
use utoipa::ToSchema;

/// Health status payload returned by the healthcheck endpoint.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// `ok` when the store answers, `degraded` otherwise.
    pub status: String,
    /// Whether the room singleton has been initialized.
    pub room_active: bool,
    /// Number of player records currently held.
    pub players: usize,
    /// RFC3339 timestamp of the probe.
    pub timestamp: String,
}
