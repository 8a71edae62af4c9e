//! TCP connection handler
//!
//! Handles one client connection end to end: admission, line framing,
//! the read-dispatch loop and teardown. Outbound lines are written by a
//! separate task so that a slow peer never blocks the registry actor.

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio_util::codec::Framed;
use tracing::{debug, info, warn};

use crate::codec::LineCodec;
use crate::command::ServerMessage;
use crate::config::ServerConfig;
use crate::dispatcher::{Disposition, Dispatcher};
use crate::error::AppError;
use crate::server::ServerHandle;
use crate::session::Session;
use crate::types::ClientId;

/// Handle a new TCP connection
///
/// Returns `CapacityExceeded` without reading anything if the server is
/// full; the stream is dropped, which closes the connection. A session that
/// ends without `EXIT` (peer hung up, kicked, dropped after a failed write)
/// returns `ConnectionClosed`.
pub async fn handle_connection(
    stream: TcpStream,
    server: ServerHandle,
    config: Arc<ServerConfig>,
) -> Result<(), AppError> {
    let peer_addr = stream
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    let client_id = ClientId::new();

    // Channel for server -> client messages
    let (msg_tx, mut msg_rx) = mpsc::channel::<ServerMessage>(config.outbound_buffer);
    let (kick_tx, mut kick_rx) = oneshot::channel();

    server.admit(client_id, msg_tx, kick_tx).await?;
    info!("Client {} connected from {}", client_id, peer_addr);

    let framed = Framed::new(stream, LineCodec::new(config.max_line_length));
    let (mut line_sender, mut line_receiver) = framed.split();

    // Write task (ServerMessage -> socket). Ends when the registry drops
    // this session's sender or the socket write fails.
    tokio::spawn(async move {
        while let Some(msg) = msg_rx.recv().await {
            if let Err(e) = line_sender.send(msg.to_string()).await {
                warn!("Couldn't write to client {}: {}", client_id, e);
                break;
            }
        }
        let _ = line_sender.close().await;
        debug!("Write task ended for {}", client_id);
    });

    let dispatcher = Dispatcher::new(server.clone(), config);
    let mut session = Session::new(client_id);

    let result = loop {
        tokio::select! {
            _ = &mut kick_rx => {
                info!("Client {} removed from the chatroom", client_id);
                break Err(AppError::ConnectionClosed);
            }
            line = line_receiver.next() => {
                match line {
                    Some(Ok(line)) => match dispatcher.dispatch(&mut session, &line).await {
                        Ok(Disposition::Continue) => {}
                        Ok(Disposition::Close) => break Ok(()),
                        Err(e) if e.is_recoverable() => {
                            warn!("Client {}: {}", client_id, e);
                        }
                        Err(e @ (AppError::NameRejected { .. } | AppError::WrongPassword)) => {
                            warn!("Client {}: {}, closing", client_id, e);
                            break Ok(());
                        }
                        Err(e) => break Err(e),
                    },
                    Some(Err(e)) => {
                        debug!("Read error from {}: {}", client_id, e);
                        break Err(e.into());
                    }
                    None => {
                        debug!("Client {} closed the connection", client_id);
                        break Err(AppError::ConnectionClosed);
                    }
                }
            }
        }
    };

    session.close();
    // May already be gone after a kick or a failed write
    server.remove(client_id).await?;

    info!("Client {} disconnected", client_id);

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;
    use tokio::time::timeout;

    async fn accept_one(
        server: &ServerHandle,
    ) -> (Framed<TcpStream, LineCodec>, JoinHandle<Result<(), AppError>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let client = TcpStream::connect(addr).await.unwrap();
        let (stream, _) = listener.accept().await.unwrap();

        let config = Arc::new(ServerConfig::default());
        let task = tokio::spawn(handle_connection(stream, server.clone(), config));
        (Framed::new(client, LineCodec::default()), task)
    }

    async fn finish(task: JoinHandle<Result<(), AppError>>) -> Result<(), AppError> {
        timeout(Duration::from_secs(2), task)
            .await
            .expect("handler did not finish")
            .unwrap()
    }

    #[tokio::test]
    async fn test_peer_hangup_reports_connection_closed() {
        let server = ServerHandle::spawn(&ServerConfig::default());
        let (client, task) = accept_one(&server).await;

        drop(client);

        assert!(matches!(finish(task).await, Err(AppError::ConnectionClosed)));
        assert_eq!(server.stats().await.unwrap().active, 0);
    }

    #[tokio::test]
    async fn test_kick_reports_connection_closed() {
        let server = ServerHandle::spawn(&ServerConfig::default());
        let (mut client, task) = accept_one(&server).await;

        client.send("NAME alice".to_string()).await.unwrap();
        for _ in 0..200 {
            if server.find_by_name("alice").await.unwrap().is_some() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(server.kick("alice").await.unwrap().is_some());

        assert!(matches!(finish(task).await, Err(AppError::ConnectionClosed)));
        assert!(!matches!(client.next().await, Some(Ok(_))));
    }

    #[tokio::test]
    async fn test_exit_is_a_clean_close() {
        let server = ServerHandle::spawn(&ServerConfig::default());
        let (mut client, task) = accept_one(&server).await;

        client.send("EXIT".to_string()).await.unwrap();

        assert!(finish(task).await.is_ok());
    }
}
