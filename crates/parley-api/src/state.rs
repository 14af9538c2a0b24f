//! Application state shared across all route handlers.
//!
//! Passed to handlers via axum's State extractor.

use std::sync::Arc;
use std::time::Instant;

use parley_core::config::ParleyConfig;
use parley_flow::FlowRunner;

/// Shared application state.
///
/// All fields use `Arc` for cheap cloning across handler tasks.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration. Read-only after startup.
    pub config: Arc<ParleyConfig>,
    /// Client for the flow-execution service.
    pub runner: Arc<dyn FlowRunner>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    pub fn new(config: ParleyConfig, runner: Arc<dyn FlowRunner>) -> Self {
        Self {
            config: Arc::new(config),
            runner,
            start_time: Instant::now(),
        }
    }

    /// Whether the server-side flow credentials are set.
    pub fn flow_configured(&self) -> bool {
        self.config.flow.credentials().is_some()
    }
}
