/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Read-only room queries.
pub mod room_service;
/// Server-Sent Events message generation.
pub mod sse_events;
/// Server-Sent Events broadcasting service.
pub mod sse_service;
/// Timer task scheduling for the card table.
pub mod timer_service;
/// WebSocket connection and message handling service.
pub mod websocket_service;
