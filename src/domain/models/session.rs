use std::fmt;

use serde_derive::Deserialize;
use serde_derive::Serialize;

/// Opaque, server-issued handle scoping one document set and conversation.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: &str) -> SessionId {
        return SessionId(id.to_string());
    }

    pub fn as_str(&self) -> &str {
        return &self.0;
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        return write!(f, "{}", self.0);
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum SessionStatus {
    Uninitialized,
    Initializing,
    Active,
    /// Creation failed. Nothing recovers from this short of restarting the client.
    Failed,
    /// Invalidated by a reset. A fresh session may be requested.
    Cleared,
}
