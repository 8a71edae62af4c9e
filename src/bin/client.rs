//! Terminal chat client
//!
//! Reads lines from stdin and sends them to the server; prints every line
//! received from the server on stdout.

use clap::Parser;
use tokio::net::TcpStream;
use tokio_util::codec::FramedRead;
use tracing::info;

use chatroom::config::CLIENT_MAX_LINE_LENGTH;
use chatroom::{logger, run_client, ClientArgs, LineCodec, Presenter};

/// Prints received lines on stdout
struct StdoutPresenter;

impl Presenter for StdoutPresenter {
    fn display(&mut self, line: &str) {
        println!("{}", line);
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logger::init("chatroom=warn");

    let args = ClientArgs::parse();
    let stream = TcpStream::connect(args.server_addr()).await?;
    info!("Connected to server {}", args.server_addr());

    let mut presenter = StdoutPresenter;
    presenter.display("WELCOME to #nonsense");

    let input = FramedRead::new(tokio::io::stdin(), LineCodec::new(CLIENT_MAX_LINE_LENGTH));
    run_client(stream, input, &mut presenter).await?;

    Ok(())
}
