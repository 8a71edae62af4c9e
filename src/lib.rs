//! Multi-user Line Chat Server Library
//!
//! A small chat service over plain TCP: clients register with `NAME` or
//! `MODERATOR`, then exchange newline-terminated lines that are broadcast
//! to every other connected client.
//!
//! # Features
//! - Per-connection registration state machine
//! - Unique display names, checked atomically
//! - Chat relay to all other clients
//! - Moderator commands: KICK, BAN, TOPIC
//! - Connection ceiling enforced at accept time
//!
//! # Architecture
//! Uses the Actor pattern with `mpsc` channels:
//! - `ChatServer` is the actor that owns the `ClientRegistry`
//! - Each connection has a `handler` task holding its own `Session`
//! - Each connection has a writer task draining its outbound queue
//! - Registry state is only mutated inside the actor, so handlers share no mutex
//!
//! # Example
//! ```ignore
//! use std::sync::Arc;
//! use tokio::net::TcpListener;
//! use chatroom::{serve, ServerConfig, ServerHandle};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = Arc::new(ServerConfig::default());
//!     let listener = TcpListener::bind(&config.bind_addr).await.unwrap();
//!     let server = ServerHandle::spawn(&config);
//!     serve(listener, server, config).await;
//! }
//! ```

pub mod acceptor;
pub mod client;
pub mod codec;
pub mod command;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod handler;
pub mod logger;
pub mod registry;
pub mod server;
pub mod session;
pub mod types;

// Re-export main types for convenience
pub use acceptor::serve;
pub use client::{run_client, Presenter};
pub use codec::LineCodec;
pub use command::{Command, ServerMessage};
pub use config::{ClientArgs, ServerArgs, ServerConfig};
pub use dispatcher::{Dispatcher, Disposition};
pub use error::{AppError, RejectReason, SendError};
pub use handler::handle_connection;
pub use registry::ClientRegistry;
pub use server::{ChatServer, RegistryStats, ServerCommand, ServerHandle};
pub use session::{Session, SessionState};
pub use types::{ClientId, Role};
