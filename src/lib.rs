//! Library crate for bracket-back, exposing modules for binaries and integration tests.

/// Bracket generation and advancement.
pub mod bracket;
/// Runtime configuration.
pub mod config;
/// Persistence.
pub mod dao;
/// HTTP request and response bodies.
pub mod dto;
/// Error layering from storage to HTTP.
pub mod error;
/// HTTP routes.
pub mod routes;
/// Business operations behind the routes.
pub mod services;
/// Shared application state.
pub mod state;
