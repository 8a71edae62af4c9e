//! Server and client configuration
//!
//! Values come from, lowest precedence first: built-in defaults, an optional
//! TOML file, then command-line flags (the moderator secret may also come
//! from `CHATROOM_MODERATOR_PASSWORD`).

use std::path::{Path, PathBuf};

use clap::Parser;
use serde::Deserialize;

use crate::codec::DEFAULT_MAX_LINE_LENGTH;
use crate::error::AppError;

/// Default server port
pub const DEFAULT_PORT: u16 = 9001;

/// Default server address
pub const DEFAULT_ADDR: &str = "0.0.0.0:9001";

/// Default concurrency ceiling
pub const DEFAULT_MAX_CLIENTS: usize = 10;

/// Default moderator secret
pub const DEFAULT_MODERATOR_PASSWORD: &str = "iAmModerator";

/// Default maximum display name length in bytes
pub const DEFAULT_MAX_NAME_LENGTH: usize = 20;

/// Maximum line length on the client side
pub const CLIENT_MAX_LINE_LENGTH: usize = 140;

/// Server settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to listen on
    pub bind_addr: String,
    /// Connections admitted at once; extra connections are closed
    pub max_clients: usize,
    /// Shared moderator secret
    pub moderator_password: String,
    /// Reject a wrong moderator password instead of only logging it
    pub strict_moderator_auth: bool,
    /// Longest accepted display name
    pub max_name_length: usize,
    /// Longest line kept; longer lines are truncated
    pub max_line_length: usize,
    /// Per-connection outbound queue size
    pub outbound_buffer: usize,
    /// Registry actor mailbox size
    pub command_buffer: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_ADDR.to_string(),
            max_clients: DEFAULT_MAX_CLIENTS,
            moderator_password: DEFAULT_MODERATOR_PASSWORD.to_string(),
            strict_moderator_auth: false,
            max_name_length: DEFAULT_MAX_NAME_LENGTH,
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
            outbound_buffer: 32,
            command_buffer: 256,
        }
    }
}

impl ServerConfig {
    /// Load settings from a TOML file, missing keys take their defaults
    pub fn from_file(path: &Path) -> Result<Self, AppError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self, AppError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<(), AppError> {
        let checks = [
            (self.max_clients, "max_clients"),
            (self.max_name_length, "max_name_length"),
            (self.max_line_length, "max_line_length"),
            (self.outbound_buffer, "outbound_buffer"),
            (self.command_buffer, "command_buffer"),
        ];
        for (value, field) in checks {
            if value == 0 {
                return Err(AppError::InvalidConfig(format!("{} must be at least 1", field)));
            }
        }
        Ok(())
    }
}

/// Server command line
#[derive(Debug, Parser)]
#[command(name = "chatroom", version, about = "Multi-user line-based chat server")]
pub struct ServerArgs {
    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Address to listen on (e.g. 0.0.0.0:9001)
    #[arg(short, long)]
    pub bind: Option<String>,

    /// Maximum number of connected clients
    #[arg(long)]
    pub max_clients: Option<usize>,

    /// Moderator password
    #[arg(long, env = "CHATROOM_MODERATOR_PASSWORD", hide_env_values = true)]
    pub moderator_password: Option<String>,

    /// Close moderator connections that give a wrong password
    #[arg(long)]
    pub strict_moderator_auth: bool,
}

impl ServerArgs {
    /// Merge file settings and flags into the final configuration
    pub fn into_config(self) -> Result<ServerConfig, AppError> {
        let mut config = match &self.config {
            Some(path) => ServerConfig::from_file(path)?,
            None => ServerConfig::default(),
        };

        if let Some(bind) = self.bind {
            config.bind_addr = bind;
        }
        if let Some(max_clients) = self.max_clients {
            config.max_clients = max_clients;
        }
        if let Some(password) = self.moderator_password {
            config.moderator_password = password;
        }
        if self.strict_moderator_auth {
            config.strict_moderator_auth = true;
        }

        config.validate()?;
        Ok(config)
    }
}

/// Client command line
#[derive(Debug, Parser)]
#[command(name = "chatroom_client", version, about = "Terminal client for the chat server")]
pub struct ClientArgs {
    /// Server IP address or host name
    pub host: String,

    /// Server port
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    pub port: u16,
}

impl ClientArgs {
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
