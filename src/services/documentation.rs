use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Live Quiz Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::room::get_room,
        crate::routes::room::advance_room,
        crate::routes::player::join_room,
        crate::routes::player::submit_guess,
        crate::routes::player::heartbeat,
        crate::routes::player::complete,
        crate::routes::player::leave_room,
        crate::routes::player::get_ranking,
        crate::routes::sse::room_stream,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::room::RoomStateResponse,
            crate::dto::room::AdvanceRequest,
            crate::dto::room::AdvanceResponse,
            crate::dto::room::AdvanceOutcome,
            crate::dto::player::NicknameInput,
            crate::dto::player::JoinRequest,
            crate::dto::player::JoinResponse,
            crate::dto::player::GuessRequest,
            crate::dto::player::GuessResponse,
            crate::dto::player::RankingEntry,
            crate::dto::player::RankingResponse,
            crate::dao::models::RoomEntity,
            crate::dao::models::TrackEntity,
            crate::dao::models::ArtistEntity,
            crate::dao::models::NicknameEntity,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "room", description = "Shared room state and round progression"),
        (name = "players", description = "Player registration, guesses, and ranking"),
        (name = "sse", description = "Server-sent events stream"),
    )
)]
pub struct ApiDoc;
