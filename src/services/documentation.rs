use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Bloom Bell Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::room::get_room,
        crate::routes::room::get_player,
        crate::routes::sse::room_stream,
        crate::routes::websocket::ws_handler,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::room::RoomSnapshot,
            crate::dto::room::PlayerSummary,
            crate::dto::room::PlayerPresenceEvent,
            crate::dto::room::GameLifecycleEvent,
            crate::dto::room::RoomEvent,
            crate::dto::ws::ClientFrame,
            crate::dto::ws::ServerFrame,
            crate::dto::ws::RelayAck,
            crate::dto::ws::CreateRoomAck,
            crate::dto::ws::JoinRoomAck,
            crate::dto::ws::JoinRoomRequest,
            crate::dto::ws::SelectGameRequest,
            crate::dto::ws::GameOverRequest,
            crate::dto::game::CardSnapshot,
            crate::dto::game::PileSnapshot,
            crate::dto::game::CardDealtEvent,
            crate::dto::game::GameStartEvent,
            crate::dto::game::CardPlayedEvent,
            crate::dto::game::TurnChangeEvent,
            crate::dto::game::YourTurnEvent,
            crate::dto::game::TurnCountdownEvent,
            crate::dto::game::PlayerEvent,
            crate::dto::game::BellRaceEvent,
            crate::dto::game::BellResultEvent,
            crate::dto::game::CardCountEvent,
            crate::dto::game::CardsCollectedEvent,
            crate::dto::game::GameOverEvent,
            crate::dto::game::BellHitRequest,
            crate::dto::sse::Handshake,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "room", description = "Read-only room inspection"),
        (name = "sse", description = "Server-sent events streams"),
        (name = "realtime", description = "WebSocket relay for hosts and controllers"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in ["/healthcheck", "/room", "/room/players/{player_index}", "/sse/room", "/ws"] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
