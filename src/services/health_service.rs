use crate::{dto::format_system_time, dto::health::HealthResponse, state::SharedState};

/// Report liveness along with the code of the hosted room.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    let room_code = state.relay().lock().await.room().code().to_owned();
    HealthResponse::ok(room_code, format_system_time(state.started_at()))
}
