//! Library crate for pattern-quiz-back, exposing modules for binaries and integration tests.

pub mod catalog;
pub mod config;
mod dto;
/// Service and HTTP error types.
pub mod error;
/// HTTP routes and the router composing them.
pub mod routes;
pub mod services;
pub mod state;
pub mod sync;
