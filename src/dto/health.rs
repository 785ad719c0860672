use serde::Serialize;
use utoipa::ToSchema;

/// Simple health response returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// Health status, always "ok" while the process serves requests.
    pub status: String,
    /// Code of the room hosted by this process.
    pub room_code: String,
    /// RFC 3339 time at which the process started.
    pub started_at: String,
}

impl HealthResponse {
    /// Create a health response indicating the system is operational.
    pub fn ok(room_code: String, started_at: String) -> Self {
        Self {
            status: "ok".to_string(),
            room_code,
            started_at,
        }
    }
}
