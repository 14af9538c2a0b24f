//! Parley API crate - axum HTTP server for the chat proxy.
//!
//! Exposes `POST /chat`, which validates a widget message, forwards it to the
//! flow-execution service and normalizes the reply, plus a health check.

pub mod error;
pub mod handlers;
pub mod rate_limit;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::{create_router, start_server};
pub use state::AppState;
