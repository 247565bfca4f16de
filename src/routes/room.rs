use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};

use crate::{
    dto::room::{AdvanceRequest, AdvanceResponse, RoomStateResponse},
    error::AppError,
    services::room_service,
    state::SharedState,
};

/// Routes exposing the shared room and its round progression.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/room", get(get_room))
        .route("/room/advance", post(advance_room))
}

/// Return the current room snapshot with the server clock attached.
#[utoipa::path(
    get,
    path = "/room",
    tag = "room",
    responses(
        (status = 200, description = "Current room state", body = RoomStateResponse),
        (status = 404, description = "Room not initialized yet")
    )
)]
pub async fn get_room(
    State(state): State<SharedState>,
) -> Result<Json<RoomStateResponse>, AppError> {
    let snapshot = room_service::snapshot(&state).await?;
    Ok(Json(snapshot))
}

/// Advance past a finished song. Idempotent: stale requests are no-ops.
#[utoipa::path(
    post,
    path = "/room/advance",
    tag = "room",
    request_body = AdvanceRequest,
    responses(
        (status = 200, description = "Advance resolution", body = AdvanceResponse),
        (status = 404, description = "Room not initialized yet")
    )
)]
pub async fn advance_room(
    State(state): State<SharedState>,
    Json(payload): Json<AdvanceRequest>,
) -> Result<Json<AdvanceResponse>, AppError> {
    let response = room_service::advance(&state, payload).await?;
    Ok(Json(response))
}
