//! Transport from the widget to the proxy endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use parley_core::config::ChatConfig;
use parley_core::types::{ChatProxyRequest, ChatProxyResponse};

use crate::error::ChatError;

/// Sends one chat request to the proxy and returns its reply.
#[async_trait]
pub trait ProxyTransport: Send + Sync {
    async fn send(&self, request: &ChatProxyRequest) -> Result<ChatProxyResponse, ChatError>;
}

#[derive(Deserialize)]
struct ProxyErrorBody {
    message: Option<String>,
}

/// reqwest-backed transport posting JSON to the proxy URL.
#[derive(Clone)]
pub struct HttpProxyTransport {
    client: Client,
    url: String,
}

impl HttpProxyTransport {
    pub fn new(config: &ChatConfig) -> Result<Self, ChatError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()?;
        Ok(Self {
            client,
            url: config.proxy_url.clone(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ProxyTransport for HttpProxyTransport {
    async fn send(&self, request: &ChatProxyRequest) -> Result<ChatProxyResponse, ChatError> {
        let response = self
            .client
            .post(&self.url)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ProxyErrorBody>(&text)
                .ok()
                .and_then(|b| b.message)
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| format!("HTTP error! Status: {}", status.as_u16()));
            return Err(ChatError::Proxy(message));
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| ChatError::Decode(e.to_string()))
    }
}
