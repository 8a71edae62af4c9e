//! Per-connection session state
//!
//! A session starts `Unregistered`, becomes `Active` exactly once after a
//! successful NAME or MODERATOR line, and ends `Closed`.

use crate::types::{ClientId, Role};

/// Display name used for moderator sessions
pub const MODERATOR_NAME: &str = "Moderator";

/// Registration state of a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Connected, waiting for NAME or MODERATOR
    Unregistered,
    /// Registered with a role and a display name
    Active { role: Role, name: String },
    /// Terminal state
    Closed,
}

/// Connected session owned by its handler task
#[derive(Debug)]
pub struct Session {
    /// Unique identifier for this connection
    pub id: ClientId,
    state: SessionState,
}

impl Session {
    /// Create a new unregistered session
    pub fn new(id: ClientId) -> Self {
        Self {
            id,
            state: SessionState::Unregistered,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Role once registered
    pub fn role(&self) -> Option<Role> {
        match &self.state {
            SessionState::Active { role, .. } => Some(*role),
            _ => None,
        }
    }

    /// Display name once registered
    pub fn display_name(&self) -> Option<&str> {
        match &self.state {
            SessionState::Active { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn is_registered(&self) -> bool {
        matches!(self.state, SessionState::Active { .. })
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.state, SessionState::Closed)
    }

    /// Move from `Unregistered` to `Active`
    ///
    /// Returns false (and leaves the state untouched) if the session was
    /// already registered or closed.
    pub fn register(&mut self, role: Role, name: String) -> bool {
        if self.state != SessionState::Unregistered {
            return false;
        }
        self.state = SessionState::Active { role, name };
        true
    }

    pub fn close(&mut self) {
        self.state = SessionState::Closed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_creation() {
        let session = Session::new(ClientId::new());

        assert_eq!(session.state(), &SessionState::Unregistered);
        assert!(!session.is_registered());
        assert!(session.role().is_none());
        assert!(session.display_name().is_none());
    }

    #[test]
    fn test_session_register_once() {
        let mut session = Session::new(ClientId::new());

        assert!(session.register(Role::RegularUser, "alice".to_string()));
        assert!(session.is_registered());
        assert_eq!(session.role(), Some(Role::RegularUser));
        assert_eq!(session.display_name(), Some("alice"));

        // Role and name are set exactly once
        assert!(!session.register(Role::Moderator, MODERATOR_NAME.to_string()));
        assert_eq!(session.role(), Some(Role::RegularUser));
        assert_eq!(session.display_name(), Some("alice"));
    }

    #[test]
    fn test_session_closed_is_terminal() {
        let mut session = Session::new(ClientId::new());
        session.close();

        assert!(session.is_closed());
        assert!(!session.register(Role::RegularUser, "alice".to_string()));
        assert!(session.role().is_none());
    }
}
