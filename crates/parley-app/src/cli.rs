//! Command-line arguments for the `parley` binary.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub const ENV_CONFIG: &str = "PARLEY_CONFIG";
pub const ENV_PORT: &str = "PARLEY_PORT";

/// Parley: chat proxy for the site's assistant widget.
#[derive(Parser, Debug)]
#[command(name = "parley", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Proxy server port.
    #[arg(short = 'p', long = "port", global = true)]
    pub port: Option<u16>,

    /// Proxy bind address.
    #[arg(long = "host", global = true)]
    pub host: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run the chat proxy server (default).
    Serve,
    /// Send one message through a running proxy and print the reply.
    Ask {
        message: String,
        /// Proxy URL; defaults to `chat.proxy_url`.
        #[arg(long = "url")]
        url: Option<String>,
    },
}

impl CliArgs {
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Serve)
    }

    /// Priority: --config flag > PARLEY_CONFIG > ~/.parley/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var(ENV_CONFIG) {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Priority: --port flag > PARLEY_PORT > config file value.
    pub fn resolve_port(&self, config_port: u16) -> u16 {
        pick_port(self.port, std::env::var(ENV_PORT).ok(), config_port)
    }

    pub fn resolve_log_level(&self, config_level: &str) -> String {
        self.log_level
            .clone()
            .unwrap_or_else(|| config_level.to_string())
    }
}

fn pick_port(flag: Option<u16>, env: Option<String>, config_port: u16) -> u16 {
    if let Some(p) = flag {
        return p;
    }
    if let Some(p) = env.and_then(|v| v.trim().parse::<u16>().ok()) {
        return p;
    }
    if config_port != 0 {
        return config_port;
    }
    3030
}

fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    let home = std::env::var("USERPROFILE");
    #[cfg(not(target_os = "windows"))]
    let home = std::env::var("HOME");

    match home {
        Ok(home) => PathBuf::from(home).join(".parley").join("config.toml"),
        Err(_) => PathBuf::from("config.toml"),
    }
}
