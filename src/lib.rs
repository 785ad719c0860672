//! Library crate for bloom-bell-back, exposing modules for binaries and integration tests.

/// Runtime configuration.
pub mod config;
/// Wire and REST payloads.
pub mod dto;
/// Service and HTTP error types.
pub mod error;
/// HTTP, SSE and WebSocket routes.
pub mod routes;
/// Async glue between sockets, timers and the room.
pub mod services;
/// Room, relay and card game state.
pub mod state;
