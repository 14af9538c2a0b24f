//! HTTP client for the hosted flow-execution API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Serialize;

use parley_core::config::FlowConfig;
use parley_core::types::is_valid_flow_id;

use crate::error::FlowError;
use crate::output::FlowOutput;
use crate::{FlowRunner, RunOptions};

#[derive(Serialize)]
struct RunRequest<'a> {
    input_value: &'a str,
    input_type: &'a str,
    output_type: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    session_id: Option<&'a str>,
}

/// reqwest-backed [`FlowRunner`].
///
/// Credentials are resolved on every run so that a client built from an
/// incomplete config fails per call instead of at startup.
#[derive(Clone)]
pub struct LangflowClient {
    client: Client,
    config: FlowConfig,
}

impl LangflowClient {
    pub fn new(config: FlowConfig) -> Result<Self, FlowError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()?;
        Ok(Self { client, config })
    }

    /// Run endpoint URL for `flow_id` under this deployment.
    ///
    /// Ids are appended as single percent-encoded path segments, so they can
    /// never leave `/lf/{langflow_id}/api/v1/run/`.
    pub fn run_url(&self, langflow_id: &str, flow_id: &str) -> Result<Url, FlowError> {
        let invalid = || FlowError::InvalidUrl(self.config.base_url.clone());
        let mut url = Url::parse(&self.config.base_url).map_err(|_| invalid())?;
        url.path_segments_mut()
            .map_err(|_| invalid())?
            .pop_if_empty()
            .extend(["lf", langflow_id, "api", "v1", "run", flow_id]);
        url.set_query(Some("stream=false"));
        Ok(url)
    }
}

#[async_trait]
impl FlowRunner for LangflowClient {
    async fn run(
        &self,
        flow_id: &str,
        input: &str,
        options: &RunOptions,
    ) -> Result<FlowOutput, FlowError> {
        let (api_key, langflow_id) = self
            .config
            .credentials()
            .ok_or(FlowError::MissingCredentials)?;
        if !is_valid_flow_id(flow_id) {
            return Err(FlowError::InvalidFlowId(flow_id.to_string()));
        }
        let url = self.run_url(langflow_id, flow_id)?;

        let request = RunRequest {
            input_value: input,
            input_type: &options.input_type,
            output_type: &options.output_type,
            session_id: options.session_id.as_deref(),
        };

        tracing::debug!(
            flow_id,
            session = options.session_id.as_deref().unwrap_or("-"),
            "Running flow"
        );

        let response = self
            .client
            .post(url)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(FlowError::Status { status, body });
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| FlowError::Decode(e.to_string()))
    }
}
