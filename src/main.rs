//! Chat Server - Entry Point
//!
//! Starts the TCP listener and the registry actor, then accepts
//! connections until Ctrl-C.

use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;

use chatroom::{logger, serve, ServerArgs, ServerHandle};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logger::init("chatroom=info");

    let config = Arc::new(ServerArgs::parse().into_config()?);

    // Bind failure terminates the process
    let listener = TcpListener::bind(&config.bind_addr).await?;
    info!(
        "Chat server listening on {} (max {} clients)",
        listener.local_addr()?,
        config.max_clients
    );

    let server = ServerHandle::spawn(&config);

    tokio::select! {
        _ = serve(listener, server, config.clone()) => {}
        result = tokio::signal::ctrl_c() => {
            result?;
            info!("Shutting down server...");
        }
    }

    Ok(())
}
