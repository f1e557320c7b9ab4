//! Session management types for client connections.

use duoshell_rpc::protocol::ClientRole;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct ClientInfo {
    pub id: SessionId,
    pub role: Option<ClientRole>,
    pub registered: bool,
}

impl ClientInfo {
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: SessionId::new(),
            role: None,
            registered: false,
        }
    }

    #[must_use]
    pub fn with_id(id: SessionId) -> Self {
        Self {
            id,
            role: None,
            registered: false,
        }
    }

    pub fn register(&mut self, role: ClientRole) {
        self.role = Some(role);
        self.registered = true;
    }
}

impl Default for ClientInfo {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
pub enum Session {
    Pending(ClientInfo),
    Ui(UiSession),
    Control(ControlSession),
}

impl Session {
    #[must_use]
    pub fn id(&self) -> &SessionId {
        match self {
            Session::Pending(info) => &info.id,
            Session::Ui(s) => &s.info.id,
            Session::Control(s) => &s.info.id,
        }
    }

    #[must_use]
    pub fn is_registered(&self) -> bool {
        !matches!(self, Session::Pending(_))
    }

    #[must_use]
    pub fn is_ui(&self) -> bool {
        matches!(self, Session::Ui(_))
    }

    #[must_use]
    pub fn is_control(&self) -> bool {
        matches!(self, Session::Control(_))
    }

    #[must_use]
    pub fn ui_name(&self) -> Option<&str> {
        match self {
            Session::Ui(s) => Some(&s.name),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct UiSession {
    pub info: ClientInfo,
    pub name: String,
}

impl UiSession {
    #[must_use]
    pub fn new(info: ClientInfo, name: String) -> Self {
        Self { info, name }
    }
}

#[derive(Debug, Clone)]
pub struct ControlSession {
    pub info: ClientInfo,
}

impl ControlSession {
    #[must_use]
    pub fn new(info: ClientInfo) -> Self {
        Self { info }
    }
}
