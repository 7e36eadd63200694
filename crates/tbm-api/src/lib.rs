//! tbm-api: HTTP API for the Telegram Bot Manager gateway
//!
//! Maps inbound HTTP requests onto `BotRegistry` operations and serializes
//! the results as JSON. Built with axum; holds no state of its own.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod server;

pub use error::{ApiError, ErrorResponse};
pub use server::{AppState, start_server};
