use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{ParleyError, Result};

/// Top-level configuration for the Parley chat service.
///
/// Loaded from `~/.parley/config.toml` by default. Credentials are normally
/// left out of the file and supplied through the environment (see
/// [`ParleyConfig::apply_env`]).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParleyConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub flow: FlowConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub voice: VoiceConfig,
}

/// Environment variable holding the flow-execution service API key.
pub const ENV_API_KEY: &str = "LANGFLOW_API_KEY";
/// Environment variable holding the flow-execution deployment id.
pub const ENV_LANGFLOW_ID: &str = "LANGFLOW_ID";
/// Environment variable holding the conversational flow id used by the widget.
pub const ENV_CHAT_FLOW_ID: &str = "LANGFLOW_CHAT_ID";
/// Legacy name of [`ENV_CHAT_FLOW_ID`] from the site's frontend build.
pub const ENV_CHAT_FLOW_ID_PUBLIC: &str = "NEXT_PUBLIC_LANGFLOW_CHAT_ID";
/// Environment variable overriding the flow-execution service base URL.
pub const ENV_BASE_URL: &str = "LANGFLOW_BASE_URL";

impl ParleyConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ParleyConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| ParleyError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Overlay credentials and flow ids from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Overlay credentials and flow ids using `lookup` as the environment.
    ///
    /// Empty values are ignored so that an exported-but-blank variable does
    /// not clobber a value from the config file.
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get(ENV_API_KEY) {
            self.flow.api_key = Some(v);
        }
        if let Some(v) = get(ENV_LANGFLOW_ID) {
            self.flow.langflow_id = Some(v);
        }
        if let Some(v) = get(ENV_BASE_URL) {
            self.flow.base_url = v;
        }
        if let Some(v) = get(ENV_CHAT_FLOW_ID).or_else(|| get(ENV_CHAT_FLOW_ID_PUBLIC)) {
            self.chat.flow_id = Some(v);
        }
    }
}

/// General server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Address the proxy server binds to.
    pub host: String,
    /// Port the proxy server binds to.
    pub port: u16,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
    /// Extra origins (besides localhost on `port` and `port + 1`) allowed by CORS.
    pub allowed_origins: Vec<String>,
    /// Requests per second accepted on `/chat` before answering 429.
    pub rate_limit_per_sec: u64,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3030,
            log_level: "info".to_string(),
            allowed_origins: Vec::new(),
            rate_limit_per_sec: 20,
        }
    }
}

/// Outbound flow-execution service settings (server side).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowConfig {
    /// Base URL of the hosted flow-execution API.
    pub base_url: String,
    /// API key. Required for the proxy to accept requests.
    pub api_key: Option<String>,
    /// Deployment id. Required for the proxy to accept requests.
    pub langflow_id: Option<String>,
    /// Outbound request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.langflow.astra.datastax.com".to_string(),
            api_key: None,
            langflow_id: None,
            timeout_secs: 30,
        }
    }
}

impl FlowConfig {
    /// Both credentials, if both are configured and non-empty.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        let key = self.api_key.as_deref().filter(|s| !s.is_empty())?;
        let id = self.langflow_id.as_deref().filter(|s| !s.is_empty())?;
        Some((key, id))
    }
}

/// Chat widget settings (client side).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Conversational flow the widget talks to.
    pub flow_id: Option<String>,
    /// Full URL of the proxy endpoint.
    pub proxy_url: String,
    /// Request timeout in seconds for calls to the proxy.
    pub timeout_secs: u64,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            flow_id: None,
            proxy_url: "http://127.0.0.1:3030/chat".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Speech recognition and synthesis settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    /// BCP-47 language requested from the recognizer.
    pub recognition_lang: String,
    /// BCP-47 language used for synthesis and voice matching (prefix match).
    pub synthesis_lang: String,
    /// Voice name preferred when it matches `synthesis_lang`.
    pub preferred_voice: String,
    /// Speech rate, 0.1 to 10.
    pub rate: f32,
    /// Speech pitch, 0 to 2.
    pub pitch: f32,
    /// Speech volume, 0 to 1.
    pub volume: f32,
    /// Quiet period after the last transcript change before it is sent.
    pub debounce_ms: u64,
    /// Read assistant replies aloud.
    pub auto_speak: bool,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            recognition_lang: "en-IN".to_string(),
            synthesis_lang: "en-US".to_string(),
            preferred_voice: "Google US English".to_string(),
            rate: 1.0,
            pitch: 1.0,
            volume: 1.0,
            debounce_ms: 1000,
            auto_speak: false,
        }
    }
}
