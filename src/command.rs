//! Line protocol definitions
//!
//! Client lines are parsed once into a closed `Command` type using
//! fixed-prefix matching (leading keyword plus one space, no quoting).
//! Server lines are produced from `ServerMessage` through `Display`.

use std::fmt;

/// Client → Server command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `MODERATOR <password>`
    Moderator { password: String },
    /// `NAME <name>`
    Name { name: String },
    /// `MSG <text>`
    Msg { text: String },
    /// `KICK <name>`
    Kick { name: String },
    /// `BAN <name>`
    Ban { name: String },
    /// `TOPIC <text>`
    Topic { text: String },
    /// `EXIT`
    Exit,
    /// Anything without a recognized prefix (raw line kept for logging)
    Invalid(String),
}

impl Command {
    /// Parse a single line (trailing `\r`/`\n` are ignored)
    pub fn parse(line: &str) -> Self {
        let line = line.trim_end_matches(['\r', '\n']);

        if line == "EXIT" || line.starts_with("EXIT ") {
            return Command::Exit;
        }

        let (keyword, arg) = match line.split_once(' ') {
            Some(parts) => parts,
            None => return Command::Invalid(line.to_string()),
        };
        let arg = arg.to_string();

        match keyword {
            "MODERATOR" => Command::Moderator { password: arg },
            "NAME" => Command::Name { name: arg },
            "MSG" => Command::Msg { text: arg },
            "KICK" => Command::Kick { name: arg },
            "BAN" => Command::Ban { name: arg },
            "TOPIC" => Command::Topic { text: arg },
            _ => Command::Invalid(line.to_string()),
        }
    }

    /// Whether this command may be sent before registration
    pub fn is_registration(&self) -> bool {
        matches!(self, Command::Moderator { .. } | Command::Name { .. })
    }
}

/// Server → Client line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    /// A regular user registered
    Entered { name: String },
    /// A moderator registered
    ModeratorEntered,
    /// Relayed chat message
    Chat { from: String, text: String },
    /// The moderator announced a topic
    Topic { text: String },
}

impl fmt::Display for ServerMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerMessage::Entered { name } => write!(f, "{} entered the chatroom!", name),
            ServerMessage::ModeratorEntered => write!(f, "Moderator entered the chatroom!"),
            ServerMessage::Chat { from, text } => write!(f, "{}: {}", from, text),
            ServerMessage::Topic { text } => {
                write!(f, "A topic '{}' is set by the moderator!", text)
            }
        }
    }
}
