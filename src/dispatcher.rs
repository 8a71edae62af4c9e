//! Protocol dispatcher
//!
//! Turns one received line into a `Command`, checks it against the session's
//! registration state and role, and executes it through the `ServerHandle`.
//!
//! | State        | Accepted                 |
//! |--------------|--------------------------|
//! | Unregistered | NAME, MODERATOR          |
//! | RegularUser  | MSG                      |
//! | Moderator    | KICK, BAN, TOPIC         |
//!
//! `EXIT` closes the session in every state. Anything else is reported as
//! `RegistrationOutOfOrder` or `InvalidCommand`, which the handler only logs.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::command::{Command, ServerMessage};
use crate::config::ServerConfig;
use crate::error::AppError;
use crate::server::ServerHandle;
use crate::session::{Session, SessionState, MODERATOR_NAME};
use crate::types::Role;

/// What the handler should do after a line was dispatched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Keep reading lines
    Continue,
    /// Tear the connection down
    Close,
}

/// Executes commands for one session against the shared registry
#[derive(Debug, Clone)]
pub struct Dispatcher {
    server: ServerHandle,
    config: Arc<ServerConfig>,
}

impl Dispatcher {
    pub fn new(server: ServerHandle, config: Arc<ServerConfig>) -> Self {
        Self { server, config }
    }

    /// Dispatch one received line for `session`
    pub async fn dispatch(
        &self,
        session: &mut Session,
        line: &str,
    ) -> Result<Disposition, AppError> {
        let command = Command::parse(line);

        if command == Command::Exit {
            info!("Client {} sent EXIT", session.id);
            session.close();
            return Ok(Disposition::Close);
        }

        match session.state().clone() {
            SessionState::Unregistered => self.register(session, command).await,
            SessionState::Active {
                role: Role::RegularUser,
                name,
            } => self.dispatch_user(&name, session, command).await,
            SessionState::Active {
                role: Role::Moderator,
                ..
            } => self.dispatch_moderator(session, command).await,
            SessionState::Closed => Ok(Disposition::Close),
        }
    }

    /// Handle the first accepted line of a session
    async fn register(
        &self,
        session: &mut Session,
        command: Command,
    ) -> Result<Disposition, AppError> {
        if !command.is_registration() {
            debug!("Client {} sent {:?} before registering", session.id, command);
            return Err(AppError::RegistrationOutOfOrder);
        }

        match command {
            Command::Moderator { password } => {
                if password != self.config.moderator_password {
                    warn!("Wrong moderator password from client {}", session.id);
                    if self.config.strict_moderator_auth {
                        session.close();
                        return Err(AppError::WrongPassword);
                    }
                }

                session.register(Role::Moderator, MODERATOR_NAME.to_string());
                info!("Moderator entered the chatroom! ({})", session.id);
                self.server
                    .broadcast(ServerMessage::ModeratorEntered, Some(session.id))
                    .await?;
                Ok(Disposition::Continue)
            }
            Command::Name { name } => {
                if let Err(e) = self.server.try_register(session.id, &name).await {
                    session.close();
                    return Err(e);
                }

                session.register(Role::RegularUser, name.clone());
                info!("{} entered the chatroom!", name);
                self.server
                    .broadcast(ServerMessage::Entered { name }, Some(session.id))
                    .await?;
                Ok(Disposition::Continue)
            }
            _ => Err(AppError::RegistrationOutOfOrder),
        }
    }

    async fn dispatch_user(
        &self,
        name: &str,
        session: &Session,
        command: Command,
    ) -> Result<Disposition, AppError> {
        match command {
            Command::Msg { text } => {
                info!("{}: {}", name, text);
                let message = ServerMessage::Chat {
                    from: name.to_string(),
                    text,
                };
                self.server.broadcast(message, Some(session.id)).await?;
                Ok(Disposition::Continue)
            }
            other => Err(invalid(other)),
        }
    }

    async fn dispatch_moderator(
        &self,
        session: &Session,
        command: Command,
    ) -> Result<Disposition, AppError> {
        match command {
            Command::Kick { name } => {
                // Logged by the registry actor, nothing is broadcast
                self.server.kick(&name).await?;
            }
            Command::Ban { name } => {
                self.server.ban(&name).await?;
            }
            Command::Topic { text } => {
                self.server.set_topic(session.id, &text).await?;
            }
            other => return Err(invalid(other)),
        }
        Ok(Disposition::Continue)
    }
}

fn invalid(command: Command) -> AppError {
    let line = match command {
        Command::Invalid(line) => line,
        other => format!("{:?}", other),
    };
    AppError::InvalidCommand(line)
}
