//! Client registry
//!
//! Holds every admitted session, the name index for registered users, the
//! ban list and the current topic. The registry itself is plain data; it is
//! owned by the `ChatServer` actor, which serializes all access to it.

use std::collections::{HashMap, HashSet};

use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use crate::command::ServerMessage;
use crate::error::{AppError, RejectReason, SendError};
use crate::types::ClientId;

/// Registry entry for one connection
#[derive(Debug)]
pub struct Entry {
    /// Registered display name (None for unregistered and moderator sessions)
    pub name: Option<String>,
    /// Server → Client message channel, drained by the writer task
    sender: mpsc::Sender<ServerMessage>,
    /// Fired when the session is kicked
    kick: Option<oneshot::Sender<()>>,
}

fn try_send(sender: &mpsc::Sender<ServerMessage>, msg: ServerMessage) -> Result<(), SendError> {
    sender.try_send(msg).map_err(|e| match e {
        mpsc::error::TrySendError::Full(_) => SendError::ChannelFull,
        mpsc::error::TrySendError::Closed(_) => SendError::ChannelClosed,
    })
}

/// Snapshot of one broadcast recipient
#[derive(Debug, Clone)]
pub struct Recipient {
    pub id: ClientId,
    sender: mpsc::Sender<ServerMessage>,
}

impl Recipient {
    pub fn try_send(&self, msg: ServerMessage) -> Result<(), SendError> {
        try_send(&self.sender, msg)
    }
}

/// Active sessions, name index and ban list
#[derive(Debug)]
pub struct ClientRegistry {
    /// All admitted sessions: ClientId -> Entry
    sessions: HashMap<ClientId, Entry>,
    /// Registered names: name -> ClientId
    names: HashMap<String, ClientId>,
    /// Banned names, append-only
    banned: HashSet<String>,
    /// Last topic announced by a moderator
    topic: Option<String>,
    max_clients: usize,
    max_name_length: usize,
}

impl ClientRegistry {
    pub fn new(max_clients: usize, max_name_length: usize) -> Self {
        Self {
            sessions: HashMap::new(),
            names: HashMap::new(),
            banned: HashSet::new(),
            topic: None,
            max_clients,
            max_name_length,
        }
    }

    /// Admit a new unregistered session
    ///
    /// Fails with `CapacityExceeded` once `max_clients` sessions are present.
    /// Returns the number of sessions after admission.
    pub fn admit(
        &mut self,
        id: ClientId,
        sender: mpsc::Sender<ServerMessage>,
        kick: oneshot::Sender<()>,
    ) -> Result<usize, AppError> {
        if self.sessions.len() >= self.max_clients {
            return Err(AppError::CapacityExceeded(self.max_clients));
        }
        self.sessions.insert(
            id,
            Entry {
                name: None,
                sender,
                kick: Some(kick),
            },
        );
        Ok(self.sessions.len())
    }

    /// Check and claim `name` for session `id` in one step
    pub fn try_register(&mut self, id: ClientId, name: &str) -> Result<(), RejectReason> {
        if name.is_empty() {
            return Err(RejectReason::Empty);
        }
        if name.len() > self.max_name_length {
            return Err(RejectReason::TooLong);
        }
        if self.is_banned(name) {
            return Err(RejectReason::Banned);
        }
        if self.names.contains_key(name) {
            return Err(RejectReason::Taken);
        }
        let Some(entry) = self.sessions.get_mut(&id) else {
            return Err(RejectReason::Disconnected);
        };

        entry.name = Some(name.to_string());
        self.names.insert(name.to_string(), id);
        Ok(())
    }

    /// Remove a session; removing an absent session is a no-op
    pub fn remove(&mut self, id: ClientId) -> Option<Entry> {
        let entry = self.sessions.remove(&id)?;
        if let Some(name) = &entry.name {
            self.names.remove(name);
        }
        debug!("Session {} removed, {} remaining", id, self.sessions.len());
        Some(entry)
    }

    /// Exact-match lookup of a registered name
    pub fn find_by_name(&self, name: &str) -> Option<ClientId> {
        self.names.get(name).copied()
    }

    /// Remove a session and tell its handler to close the connection
    pub fn disconnect(&mut self, id: ClientId) -> bool {
        let Some(mut entry) = self.remove(id) else {
            return false;
        };
        if let Some(kick) = entry.kick.take() {
            let _ = kick.send(());
        }
        true
    }

    /// Disconnect the session registered as `name`
    pub fn kick(&mut self, name: &str) -> Option<ClientId> {
        let id = self.find_by_name(name)?;
        self.disconnect(id);
        Some(id)
    }

    /// Ban a name from future registration
    ///
    /// Returns false if it was already banned. A connected user with that
    /// name stays connected.
    pub fn ban(&mut self, name: &str) -> bool {
        self.banned.insert(name.to_string())
    }

    pub fn is_banned(&self, name: &str) -> bool {
        self.banned.contains(name)
    }

    pub fn set_topic(&mut self, text: &str) {
        self.topic = Some(text.to_string());
    }

    pub fn topic(&self) -> Option<&str> {
        self.topic.as_deref()
    }

    /// Snapshot of every session except `exclude`
    pub fn recipients(&self, exclude: Option<ClientId>) -> Vec<Recipient> {
        self.sessions
            .iter()
            .filter(|(id, _)| Some(**id) != exclude)
            .map(|(id, entry)| Recipient {
                id: *id,
                sender: entry.sender.clone(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
