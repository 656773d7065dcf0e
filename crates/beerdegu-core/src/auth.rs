//! Caller identity and room membership.

use std::{fmt, sync::Arc};

/// Authentication token obtained at login.
///
/// Cheap to clone. `Debug` never prints the token.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthSession {
    token: Arc<str>,
}

impl AuthSession {
    /// Wrap a login token.
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: Arc::from(token.into()) }
    }

    /// Raw token.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Value for the REST `Authorization` header.
    pub fn authorization(&self) -> String {
        format!("Token {}", self.token)
    }
}

impl fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSession").field("token", &"<redacted>").finish()
    }
}

/// What the caller may do in a room.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Role {
    /// Ordinary participant.
    #[default]
    Participant,
    /// Room owner. May change the lifecycle stage.
    Host,
}

impl Role {
    /// Role from the membership check's host flag.
    pub fn from_host_flag(is_host: bool) -> Self {
        if is_host { Self::Host } else { Self::Participant }
    }

    /// True for [`Role::Host`].
    pub fn is_host(self) -> bool {
        self == Self::Host
    }
}

/// Outcome of a successful membership check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Membership {
    /// Caller's role in the room.
    pub role: Role,
    /// Token for the socket query string.
    ///
    /// The membership check may hand out a dedicated socket token. When it
    /// does not, the login token is used.
    pub socket_token: Option<String>,
}

impl Membership {
    /// Membership without a dedicated socket token.
    pub fn new(role: Role) -> Self {
        Self { role, socket_token: None }
    }

    /// Token to put on the socket URL.
    pub fn socket_token<'a>(&'a self, auth: &'a AuthSession) -> &'a str {
        self.socket_token.as_deref().unwrap_or_else(|| auth.token())
    }
}
