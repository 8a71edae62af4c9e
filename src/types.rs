//! Basic type definitions for the chat server
//!
//! Provides:
//! - `ClientId`: random per-connection registry key
//! - `Role`: what a registered session is allowed to do

use uuid::Uuid;

/// Key of one admitted connection in the registry
///
/// Assigned at accept time, before the peer has chosen a name, and never
/// reused. Log lines refer to a connection by this id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientId(Uuid);

impl ClientId {
    pub fn new() -> Self {
        ClientId(Uuid::new_v4())
    }
}

impl Default for ClientId {
    fn default() -> Self {
        ClientId::new()
    }
}

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

/// Role of a registered session
///
/// Decides which commands the dispatcher accepts after registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Registered with `NAME`, may only send `MSG`
    RegularUser,
    /// Registered with `MODERATOR`, may `KICK`, `BAN` and set `TOPIC`
    Moderator,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::RegularUser => write!(f, "user"),
            Role::Moderator => write!(f, "moderator"),
        }
    }
}
