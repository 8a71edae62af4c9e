//! Connection accept loop

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use crate::config::ServerConfig;
use crate::error::AppError;
use crate::handler::handle_connection;
use crate::server::ServerHandle;

/// Accept connections forever, spawning one handler task per connection
pub async fn serve(listener: TcpListener, server: ServerHandle, config: Arc<ServerConfig>) {
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                info!("New connection from {}", addr);
                let server = server.clone();
                let config = config.clone();

                tokio::spawn(async move {
                    match handle_connection(stream, server, config).await {
                        Ok(()) => {}
                        Err(AppError::ConnectionClosed) => {
                            debug!("Connection from {} closed", addr);
                        }
                        Err(e @ AppError::CapacityExceeded(_)) => {
                            warn!("{}, closing connection from {}", e, addr);
                        }
                        Err(e) => error!("Connection handler error: {}", e),
                    }
                });
            }
            Err(e) => {
                error!("Failed to accept connection: {}", e);
            }
        }
    }
}
