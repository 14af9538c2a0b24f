//! Route handler functions for all API endpoints.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use parley_core::types::{is_valid_flow_id, ChatProxyRequest, ChatProxyResponse};
use parley_flow::RunOptions;

use crate::error::ApiError;
use crate::state::AppState;

/// Message returned when the flow credentials are not configured.
pub const CONFIG_ERROR_MESSAGE: &str =
    "Server configuration error: Langflow API key or ID not set.";
/// Message returned when `message` or `flowId` is missing.
pub const MISSING_FIELDS_MESSAGE: &str =
    "Bad Request: Missing \"message\" or \"flowId\" in request body.";
/// Message returned when `flowId` is not a plain flow identifier.
pub const INVALID_FLOW_ID_MESSAGE: &str = "Bad Request: Invalid \"flowId\" in request body.";
/// Prefix of the message returned when the flow run fails.
pub const UPSTREAM_ERROR_PREFIX: &str = "Error processing your request with Langflow: ";
/// Detail used when the upstream error carries no message of its own.
pub const UNKNOWN_ERROR_DETAIL: &str = "An unknown error occurred.";

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub flow_configured: bool,
}

/// POST /chat - forward a widget message to the configured flow.
///
/// Checks credentials before looking at the body. A body that fails to parse
/// is treated the same as one missing its required fields.
pub async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatProxyRequest>, JsonRejection>,
) -> Result<Json<ChatProxyResponse>, ApiError> {
    if !state.flow_configured() {
        tracing::error!("Missing Langflow API key or deployment id");
        return Err(ApiError::Configuration(CONFIG_ERROR_MESSAGE.to_string()));
    }

    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Unreadable chat request body");
            ChatProxyRequest::default()
        }
    };

    if !request.is_complete() {
        return Err(ApiError::BadRequest(MISSING_FIELDS_MESSAGE.to_string()));
    }
    if !is_valid_flow_id(&request.flow_id) {
        tracing::warn!(flow_id = %request.flow_id, "Rejecting malformed flow id");
        return Err(ApiError::BadRequest(INVALID_FLOW_ID_MESSAGE.to_string()));
    }

    let options = RunOptions::chat(request.session().map(str::to_string));
    match state
        .runner
        .run(&request.flow_id, &request.message, &options)
        .await
    {
        Ok(result) => {
            let output = match result.chat_output_text() {
                Some(text) => serde_json::Value::String(text),
                None => result.outputs,
            };
            Ok(Json(ChatProxyResponse { output }))
        }
        Err(e) => {
            tracing::warn!(error = %e, flow_id = %request.flow_id, "Flow run failed");
            let detail = e.to_string();
            let detail = if detail.trim().is_empty() {
                UNKNOWN_ERROR_DETAIL.to_string()
            } else {
                detail
            };
            Err(ApiError::Upstream(format!("{}{}", UPSTREAM_ERROR_PREFIX, detail)))
        }
    }
}

/// GET /health - health check.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        flow_configured: state.flow_configured(),
    })
}
