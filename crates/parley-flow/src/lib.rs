//! Client for the external flow-execution service (Langflow).
//!
//! The proxy endpoint depends only on the [`FlowRunner`] trait; production
//! wiring binds it to [`LangflowClient`], tests to [`MockFlowRunner`].

pub mod client;
pub mod error;
pub mod mock;
pub mod output;

use async_trait::async_trait;

pub use client::LangflowClient;
pub use error::FlowError;
pub use mock::MockFlowRunner;
pub use output::FlowOutput;

/// Per-run options forwarded to the flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    pub input_type: String,
    pub output_type: String,
    /// Session continuity handle. `None` lets the service start its own.
    pub session_id: Option<String>,
}

impl RunOptions {
    /// Chat-formatted input and output, continuing `session_id` if given.
    pub fn chat(session_id: Option<String>) -> Self {
        Self {
            input_type: "chat".to_string(),
            output_type: "chat".to_string(),
            session_id,
        }
    }
}

/// Executes a named conversational flow.
#[async_trait]
pub trait FlowRunner: Send + Sync {
    /// Run `flow_id` with `input` and return the structured response.
    async fn run(
        &self,
        flow_id: &str,
        input: &str,
        options: &RunOptions,
    ) -> Result<FlowOutput, FlowError>;
}
