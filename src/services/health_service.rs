use crate::{
    dto::{format_epoch_ms, health::HealthResponse},
    state::{SharedState, epoch_ms},
};

/// Build the healthcheck payload. Store failures degrade the status instead
/// of failing the endpoint.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    let store = state.store();
    let status = match store.health_check().await {
        Ok(()) => "ok",
        Err(_) => "degraded",
    };
    let room_active = store.room().await.ok().flatten().is_some();
    let players = store
        .list_players()
        .await
        .map(|players| players.len())
        .unwrap_or(0);

    HealthResponse {
        status: status.to_string(),
        room_active,
        players,
        timestamp: format_epoch_ms(epoch_ms()),
    }
}
