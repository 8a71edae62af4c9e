//! Error types for the chat server
//!
//! Defines application-level errors, registration rejection reasons and
//! outbound send errors. Uses thiserror for ergonomic error definitions.

use thiserror::Error;

/// Application-level errors
///
/// Covers fatal errors (the connection or the process goes away) and
/// protocol errors that are only logged while the connection stays open.
#[derive(Debug, Error)]
pub enum AppError {
    /// IO error (fatal)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be parsed
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Configuration values are out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The registry actor is gone (fatal - internal channel broken)
    #[error("Registry closed")]
    RegistryClosed,

    /// A command other than NAME or MODERATOR arrived before registration
    #[error("Expecting NAME or MODERATOR first")]
    RegistrationOutOfOrder,

    /// The requested name cannot be used
    #[error("Name '{name}' rejected: {reason}")]
    NameRejected { name: String, reason: RejectReason },

    /// Moderator password mismatch with strict authentication enabled
    #[error("Wrong moderator password")]
    WrongPassword,

    /// Unrecognized command for the current role
    #[error("Invalid command: {0:?}")]
    InvalidCommand(String),

    /// Connection accepted above the concurrency ceiling
    #[error("Too many clients connected (max {0})")]
    CapacityExceeded(usize),

    /// Session ended without EXIT: the peer hung up or the server dropped it
    #[error("Connection closed")]
    ConnectionClosed,
}

impl AppError {
    /// Whether the connection stays open after this error
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AppError::RegistrationOutOfOrder | AppError::InvalidCommand(_)
        )
    }
}

/// Reasons a `NAME` registration is refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RejectReason {
    #[error("name is empty")]
    Empty,
    #[error("name is too long")]
    TooLong,
    #[error("name is banned")]
    Banned,
    #[error("name is already taken")]
    Taken,
    /// Session was removed from the registry before it could register
    #[error("session is no longer connected")]
    Disconnected,
}

/// Message send errors
///
/// Occurs when a broadcast cannot be queued for one recipient.
#[derive(Debug, Error)]
pub enum SendError {
    /// The recipient's writer has gone away
    #[error("Channel closed")]
    ChannelClosed,
    /// The recipient is not draining its queue
    #[error("Channel full")]
    ChannelFull,
}
