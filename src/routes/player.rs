use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
};
use axum_valid::Valid;

use crate::{
    dto::player::{
        GuessRequest, GuessResponse, JoinRequest, JoinResponse, RankingQuery, RankingResponse,
    },
    error::AppError,
    services::{guess_service, ranking_service, room_service},
    state::SharedState,
};

/// Routes handling player registration, guessing, presence, and ranking.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/players", post(join_room))
        .route("/players/{id}/guess", post(submit_guess))
        .route("/players/{id}/heartbeat", post(heartbeat))
        .route("/players/{id}/complete", post(complete))
        .route("/players/{id}", delete(leave_room))
        .route("/ranking", get(get_ranking))
}

/// Register a player, creating the room on the first join.
#[utoipa::path(
    post,
    path = "/players",
    tag = "players",
    request_body = JoinRequest,
    responses(
        (status = 200, description = "Player registered", body = JoinResponse),
        (status = 400, description = "Invalid nickname")
    )
)]
pub async fn join_room(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<JoinRequest>>,
) -> Result<Json<JoinResponse>, AppError> {
    let response = room_service::join(&state, payload).await?;
    Ok(Json(response))
}

/// Submit a guess for the current song.
#[utoipa::path(
    post,
    path = "/players/{id}/guess",
    tag = "players",
    params(("id" = String, Path, description = "Player identifier")),
    request_body = GuessRequest,
    responses(
        (status = 200, description = "Guess evaluated", body = GuessResponse),
        (status = 404, description = "Player or room not found"),
        (status = 409, description = "No song currently playing")
    )
)]
pub async fn submit_guess(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Valid(Json(payload)): Valid<Json<GuessRequest>>,
) -> Result<Json<GuessResponse>, AppError> {
    let response = guess_service::submit_guess(&state, id, payload).await?;
    Ok(Json(response))
}

/// Refresh a player's presence heartbeat.
#[utoipa::path(
    post,
    path = "/players/{id}/heartbeat",
    tag = "players",
    params(("id" = String, Path, description = "Player identifier")),
    responses(
        (status = 204, description = "Heartbeat recorded"),
        (status = 404, description = "Player not found")
    )
)]
pub async fn heartbeat(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    room_service::heartbeat(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Flag a player as having reached the results screen.
#[utoipa::path(
    post,
    path = "/players/{id}/complete",
    tag = "players",
    params(("id" = String, Path, description = "Player identifier")),
    responses(
        (status = 204, description = "Player marked as completed"),
        (status = 404, description = "Player not found")
    )
)]
pub async fn complete(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    room_service::complete(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Remove a player record on explicit leave.
#[utoipa::path(
    delete,
    path = "/players/{id}",
    tag = "players",
    params(("id" = String, Path, description = "Player identifier")),
    responses(
        (status = 204, description = "Player removed"),
        (status = 404, description = "Player not found")
    )
)]
pub async fn leave_room(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    room_service::leave(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Return the deduplicated, pruned leaderboard.
#[utoipa::path(
    get,
    path = "/ranking",
    tag = "players",
    params(RankingQuery),
    responses((status = 200, description = "Current leaderboard", body = RankingResponse))
)]
pub async fn get_ranking(
    State(state): State<SharedState>,
    Query(query): Query<RankingQuery>,
) -> Result<Json<RankingResponse>, AppError> {
    let response = ranking_service::current_ranking(&state, query.player.as_deref()).await?;
    Ok(Json(response))
}
