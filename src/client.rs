//! Line-oriented chat client
//!
//! The client owns no protocol logic: it forwards every typed line to the
//! server and hands both typed and received lines to a `Presenter`, so the
//! transcript shows the user's own messages too. Any typed line starting
//! with `EXIT` sends a plain `EXIT` to the server and ends the session.

use futures_util::{SinkExt, Stream, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::Framed;
use tracing::{debug, info};

use crate::codec::LineCodec;
use crate::config::CLIENT_MAX_LINE_LENGTH;
use crate::error::AppError;

const EXIT: &str = "EXIT";

/// Presentation layer for the chat transcript
pub trait Presenter {
    /// Show one line, typed locally or received from the server
    fn display(&mut self, line: &str);
}

/// Run a client session over `stream`
///
/// Returns when the user types `EXIT`, the input ends, or the server
/// closes the connection.
pub async fn run_client<S, I, P>(stream: S, mut input: I, presenter: &mut P) -> Result<(), AppError>
where
    S: AsyncRead + AsyncWrite + Unpin,
    I: Stream<Item = Result<String, std::io::Error>> + Unpin,
    P: Presenter,
{
    let mut framed = Framed::new(stream, LineCodec::new(CLIENT_MAX_LINE_LENGTH));

    loop {
        tokio::select! {
            typed = input.next() => {
                match typed {
                    Some(Ok(line)) => {
                        presenter.display(&line);
                        if line.starts_with(EXIT) {
                            framed.send(EXIT.to_string()).await?;
                            debug!("EXIT typed, leaving");
                            return Ok(());
                        }
                        framed.send(line).await?;
                    }
                    Some(Err(e)) => return Err(e.into()),
                    None => return Ok(()),
                }
            }
            received = framed.next() => {
                match received {
                    Some(Ok(line)) => presenter.display(&line),
                    Some(Err(e)) => return Err(e.into()),
                    None => {
                        info!("Server closed the connection");
                        return Ok(());
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;

    #[derive(Default)]
    struct Recorder {
        lines: Vec<String>,
    }

    impl Presenter for Recorder {
        fn display(&mut self, line: &str) {
            self.lines.push(line.to_string());
        }
    }

    #[tokio::test]
    async fn test_typed_lines_are_sent_until_exit() {
        let (client_side, server_side) = tokio::io::duplex(1024);
        let input = stream::iter(vec![
            Ok("NAME alice".to_string()),
            Ok("MSG hi".to_string()),
            Ok("EXIT".to_string()),
            Ok("MSG never sent".to_string()),
        ]);
        let mut recorder = Recorder::default();

        run_client(client_side, input, &mut recorder).await.unwrap();

        let mut server = Framed::new(server_side, LineCodec::default());
        assert_eq!(server.next().await.unwrap().unwrap(), "NAME alice");
        assert_eq!(server.next().await.unwrap().unwrap(), "MSG hi");
        assert_eq!(server.next().await.unwrap().unwrap(), "EXIT");
        assert!(server.next().await.is_none());

        // Typed lines are echoed locally
        assert_eq!(recorder.lines, vec!["NAME alice", "MSG hi", "EXIT"]);
    }

    #[tokio::test]
    async fn test_exit_prefix_ends_session() {
        let (client_side, server_side) = tokio::io::duplex(1024);
        let input = stream::iter(vec![
            Ok("MSG bye".to_string()),
            Ok("EXITNOW".to_string()),
            Ok("MSG never sent".to_string()),
        ]);
        let mut recorder = Recorder::default();

        run_client(client_side, input, &mut recorder).await.unwrap();

        let mut server = Framed::new(server_side, LineCodec::default());
        assert_eq!(server.next().await.unwrap().unwrap(), "MSG bye");
        assert_eq!(server.next().await.unwrap().unwrap(), "EXIT");
        assert!(server.next().await.is_none());
        assert_eq!(recorder.lines, vec!["MSG bye", "EXITNOW"]);
    }

    #[tokio::test]
    async fn test_received_lines_are_displayed() {
        let (client_side, server_side) = tokio::io::duplex(1024);
        let mut server = Framed::new(server_side, LineCodec::default());
        server.send("bob entered the chatroom!".to_string()).await.unwrap();
        server.send("bob: hi".to_string()).await.unwrap();
        drop(server);

        let input = stream::pending::<Result<String, std::io::Error>>();
        let mut recorder = Recorder::default();

        run_client(client_side, input, &mut recorder).await.unwrap();

        assert_eq!(recorder.lines, vec!["bob entered the chatroom!", "bob: hi"]);
    }
}
