//! ChatServer Actor implementation
//!
//! The central actor that owns the `ClientRegistry`. Connection handlers never
//! touch the registry directly; they send `ServerCommand`s through a
//! `ServerHandle` and await the reply. Because the actor processes one command
//! at a time, name check-and-insert is atomic and a broadcast snapshot can
//! never observe a half-applied join or leave.
//!
//! Socket writes do not happen here: a broadcast only queues `ServerMessage`s
//! on each recipient's channel, and every connection's writer task does the
//! actual network write.

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::command::ServerMessage;
use crate::config::ServerConfig;
use crate::error::{AppError, RejectReason};
use crate::registry::ClientRegistry;
use crate::types::ClientId;

/// Commands sent from handlers to the ChatServer actor
#[derive(Debug)]
pub enum ServerCommand {
    /// New connection, reply carries the session count or `CapacityExceeded`
    Admit {
        client_id: ClientId,
        sender: mpsc::Sender<ServerMessage>,
        kick: oneshot::Sender<()>,
        reply: oneshot::Sender<Result<usize, AppError>>,
    },
    /// Claim a display name
    Register {
        client_id: ClientId,
        name: String,
        reply: oneshot::Sender<Result<(), RejectReason>>,
    },
    /// Connection finished (idempotent)
    Remove {
        client_id: ClientId,
        reply: oneshot::Sender<bool>,
    },
    /// Disconnect a registered user by name
    Kick {
        name: String,
        reply: oneshot::Sender<Option<ClientId>>,
    },
    /// Ban a name from future registration
    Ban {
        name: String,
        reply: oneshot::Sender<bool>,
    },
    /// Store the topic and announce it
    SetTopic {
        client_id: ClientId,
        text: String,
        reply: oneshot::Sender<usize>,
    },
    /// Send a message to every session except `exclude`
    Broadcast {
        message: ServerMessage,
        exclude: Option<ClientId>,
        reply: oneshot::Sender<usize>,
    },
    /// Look up a registered name
    FindByName {
        name: String,
        reply: oneshot::Sender<Option<ClientId>>,
    },
    /// Current state summary
    Stats {
        reply: oneshot::Sender<RegistryStats>,
    },
}

/// Summary of registry state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryStats {
    /// Admitted sessions, registered or not
    pub active: usize,
    pub topic: Option<String>,
}

/// The main ChatServer actor
pub struct ChatServer {
    registry: ClientRegistry,
    /// Command receiver channel
    receiver: mpsc::Receiver<ServerCommand>,
}

impl ChatServer {
    /// Create a new ChatServer with the given command receiver
    pub fn new(receiver: mpsc::Receiver<ServerCommand>, config: &ServerConfig) -> Self {
        Self {
            registry: ClientRegistry::new(config.max_clients, config.max_name_length),
            receiver,
        }
    }

    /// Run the ChatServer event loop
    ///
    /// Continuously receives and processes commands until all handles are dropped.
    pub async fn run(mut self) {
        info!("ChatServer started");

        while let Some(cmd) = self.receiver.recv().await {
            self.handle_command(cmd);
        }

        info!("ChatServer shutting down");
    }

    /// Process a single command
    fn handle_command(&mut self, cmd: ServerCommand) {
        match cmd {
            ServerCommand::Admit {
                client_id,
                sender,
                kick,
                reply,
            } => {
                let result = self.registry.admit(client_id, sender, kick);
                if let Ok(count) = &result {
                    debug!("Client {} admitted, clients connected: {}", client_id, count);
                }
                let _ = reply.send(result);
            }
            ServerCommand::Register {
                client_id,
                name,
                reply,
            } => {
                let result = self.registry.try_register(client_id, &name);
                match &result {
                    Ok(()) => info!("Client {} registered as '{}'", client_id, name),
                    Err(reason) => warn!("Client {} cannot use '{}': {}", client_id, name, reason),
                }
                let _ = reply.send(result);
            }
            ServerCommand::Remove { client_id, reply } => {
                let removed = self.registry.remove(client_id).is_some();
                let _ = reply.send(removed);
            }
            ServerCommand::Kick { name, reply } => {
                let kicked = self.registry.kick(&name);
                match kicked {
                    Some(id) => info!("{} ({}) is kicked out of the chatroom!", name, id),
                    None => info!("{} is not found", name),
                }
                let _ = reply.send(kicked);
            }
            ServerCommand::Ban { name, reply } => {
                let added = self.registry.ban(&name);
                info!("Username {} has been banned by the moderator", name);
                let _ = reply.send(added);
            }
            ServerCommand::SetTopic {
                client_id,
                text,
                reply,
            } => {
                self.registry.set_topic(&text);
                info!("A topic '{}' is set by the moderator!", text);
                let delivered = self.broadcast(ServerMessage::Topic { text }, Some(client_id));
                let _ = reply.send(delivered);
            }
            ServerCommand::Broadcast {
                message,
                exclude,
                reply,
            } => {
                let delivered = self.broadcast(message, exclude);
                let _ = reply.send(delivered);
            }
            ServerCommand::FindByName { name, reply } => {
                let _ = reply.send(self.registry.find_by_name(&name));
            }
            ServerCommand::Stats { reply } => {
                let _ = reply.send(RegistryStats {
                    active: self.registry.len(),
                    topic: self.registry.topic().map(str::to_string),
                });
            }
        }
    }

    /// Queue `message` for every session except `exclude`
    ///
    /// A recipient whose queue is full or whose writer is gone is
    /// disconnected once the fan-out is done.
    fn broadcast(&mut self, message: ServerMessage, exclude: Option<ClientId>) -> usize {
        let recipients = self.registry.recipients(exclude);
        let mut delivered = 0;
        let mut dead = Vec::new();

        for recipient in &recipients {
            match recipient.try_send(message.clone()) {
                Ok(()) => delivered += 1,
                Err(e) => {
                    warn!("Couldn't write to client {}: {}", recipient.id, e);
                    dead.push(recipient.id);
                }
            }
        }

        for id in dead {
            if self.registry.disconnect(id) {
                info!("Client {} dropped after a failed write", id);
            }
        }

        debug!("Broadcast '{}' delivered to {} clients", message, delivered);
        delivered
    }
}

/// Cloneable handle used by connection handlers to reach the actor
#[derive(Debug, Clone)]
pub struct ServerHandle {
    sender: mpsc::Sender<ServerCommand>,
}

impl ServerHandle {
    /// Start a ChatServer actor and return a handle to it
    pub fn spawn(config: &ServerConfig) -> Self {
        let (sender, receiver) = mpsc::channel(config.command_buffer);
        tokio::spawn(ChatServer::new(receiver, config).run());
        Self { sender }
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> ServerCommand,
    ) -> Result<T, AppError> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(make(reply))
            .await
            .map_err(|_| AppError::RegistryClosed)?;
        response.await.map_err(|_| AppError::RegistryClosed)
    }

    /// Admit a new connection; fails with `CapacityExceeded` when full
    pub async fn admit(
        &self,
        client_id: ClientId,
        sender: mpsc::Sender<ServerMessage>,
        kick: oneshot::Sender<()>,
    ) -> Result<usize, AppError> {
        self.request(|reply| ServerCommand::Admit {
            client_id,
            sender,
            kick,
            reply,
        })
        .await?
    }

    /// Atomically check and claim `name` for `client_id`
    pub async fn try_register(&self, client_id: ClientId, name: &str) -> Result<(), AppError> {
        let claimed = name.to_string();
        let result = self
            .request(|reply| ServerCommand::Register {
                client_id,
                name: claimed,
                reply,
            })
            .await?;
        result.map_err(|reason| AppError::NameRejected {
            name: name.to_string(),
            reason,
        })
    }

    /// Remove a session; returns false if it was already gone
    pub async fn remove(&self, client_id: ClientId) -> Result<bool, AppError> {
        self.request(|reply| ServerCommand::Remove { client_id, reply })
            .await
    }

    /// Kick the user registered as `name`
    pub async fn kick(&self, name: &str) -> Result<Option<ClientId>, AppError> {
        let name = name.to_string();
        self.request(|reply| ServerCommand::Kick { name, reply }).await
    }

    /// Ban `name`; returns false if it was already banned
    pub async fn ban(&self, name: &str) -> Result<bool, AppError> {
        let name = name.to_string();
        self.request(|reply| ServerCommand::Ban { name, reply }).await
    }

    /// Set the topic and announce it to everyone but `client_id`
    pub async fn set_topic(&self, client_id: ClientId, text: &str) -> Result<usize, AppError> {
        let text = text.to_string();
        self.request(|reply| ServerCommand::SetTopic {
            client_id,
            text,
            reply,
        })
        .await
    }

    /// Broadcast `message` to every session except `exclude`
    pub async fn broadcast(
        &self,
        message: ServerMessage,
        exclude: Option<ClientId>,
    ) -> Result<usize, AppError> {
        self.request(|reply| ServerCommand::Broadcast {
            message,
            exclude,
            reply,
        })
        .await
    }

    pub async fn find_by_name(&self, name: &str) -> Result<Option<ClientId>, AppError> {
        let name = name.to_string();
        self.request(|reply| ServerCommand::FindByName { name, reply })
            .await
    }

    pub async fn stats(&self) -> Result<RegistryStats, AppError> {
        self.request(|reply| ServerCommand::Stats { reply }).await
    }
}
