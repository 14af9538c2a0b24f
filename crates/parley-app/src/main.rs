//! Parley binary - composition root.
//!
//! 1. Parse CLI arguments and load configuration from TOML
//! 2. Apply environment overrides for the flow credentials
//! 3. Either serve the chat proxy or send a one-off message through it

mod cli;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, reload, EnvFilter};

use parley_api::{start_server, AppState};
use parley_chat::{ConversationManager, HttpProxyTransport, SendOutcome};
use parley_core::config::ParleyConfig;
use parley_flow::LangflowClient;

use crate::cli::{CliArgs, Command};

async fn serve(config: ParleyConfig) -> Result<(), Box<dyn std::error::Error>> {
    if config.flow.credentials().is_none() {
        tracing::warn!(
            "LANGFLOW_API_KEY or LANGFLOW_ID is not set; chat requests will fail with a configuration error"
        );
    }

    let client = LangflowClient::new(config.flow.clone())?;
    tracing::info!(base_url = %config.flow.base_url, "Flow client ready");

    let state = AppState::new(config.clone(), Arc::new(client));
    start_server(&config, state).await?;
    Ok(())
}

async fn ask(
    mut config: ParleyConfig,
    message: &str,
    url: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(url) = url {
        config.chat.proxy_url = url;
    }
    let transport = HttpProxyTransport::new(&config.chat)?;
    tracing::debug!(url = transport.url(), "Sending through the chat proxy");
    let manager = ConversationManager::new(config.chat.flow_id.clone(), Arc::new(transport));

    match manager.send_message(message).await? {
        SendOutcome::Replied => {
            if let Some(reply) = manager.snapshot().messages.last() {
                println!("{}", reply.text);
            }
        }
        SendOutcome::Failed(e) => return Err(e.into()),
        SendOutcome::Ignored | SendOutcome::Discarded => {
            tracing::info!("Nothing sent");
        }
    }
    Ok(())
}

/// Config file, then environment, then CLI overrides.
fn load_config(args: &CliArgs) -> (PathBuf, ParleyConfig) {
    let config_file = args.resolve_config_path();
    let mut config = ParleyConfig::load_or_default(&config_file);
    config.apply_env();
    config.general.port = args.resolve_port(config.general.port);
    if let Some(host) = &args.host {
        config.general.host = host.clone();
    }
    (config_file, config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Tracing first, so config load failures are reported. Without RUST_LOG
    // the filter starts at the CLI level (or `info`) and is swapped for the
    // resolved level once the file is read.
    let from_env = EnvFilter::try_from_default_env().ok();
    let env_set = from_env.is_some();
    let initial = from_env.unwrap_or_else(|| EnvFilter::new(args.resolve_log_level("info")));
    let (filter, filter_handle) = reload::Layer::new(initial);
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .init();

    tracing::info!("Starting Parley v{}", env!("CARGO_PKG_VERSION"));

    let (config_file, config) = load_config(&args);

    if !env_set {
        let level = args.resolve_log_level(&config.general.log_level);
        if let Err(e) = filter_handle.reload(EnvFilter::new(&level)) {
            tracing::warn!(error = %e, level = %level, "Could not apply configured log level");
        }
    }
    tracing::info!(path = %config_file.display(), "Configuration ready");

    match args.command() {
        Command::Serve => serve(config).await,
        Command::Ask { message, url } => ask(config, &message, url).await,
    }
}
