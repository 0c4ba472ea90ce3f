//! Client connection state machine.

/// The state of a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    /// No socket. Terminal once reached through `disconnect`.
    Disconnected,
    /// Socket open, never logged in.
    Connected,
    /// Socket open, logged out after a session.
    LoggedOut,
    /// Authenticated and idle.
    LoggedIn,
    /// Authenticated, a multi-page result has pages left.
    Paginating,
}

/// Client operations the state machine tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Login,
    Logout,
    Query,
    Disconnect,
}

impl ClientState {
    /// Whether `op` may go out on the wire in this state.
    pub fn accepts(&self, op: Operation) -> bool {
        match self {
            Self::Disconnected => false,
            Self::Connected | Self::LoggedOut => {
                matches!(op, Operation::Login | Operation::Disconnect)
            }
            Self::LoggedIn | Self::Paginating => true,
        }
    }

    pub fn is_connected(&self) -> bool {
        *self != Self::Disconnected
    }

    /// Next state after `op` succeeds. `has_more` only matters for queries.
    pub fn transition_success(&self, op: Operation, has_more: bool) -> Self {
        match (self, op) {
            (Self::Disconnected, _) => Self::Disconnected,
            (_, Operation::Disconnect) => Self::Disconnected,
            (_, Operation::Login) => Self::LoggedIn,
            (Self::LoggedIn | Self::Paginating, Operation::Logout) => Self::LoggedOut,
            (Self::LoggedIn | Self::Paginating, Operation::Query) => {
                if has_more {
                    Self::Paginating
                } else {
                    Self::LoggedIn
                }
            }
            // Nothing else changes state.
            _ => *self,
        }
    }

    /// Leaves pagination once the last page has been consumed.
    pub fn complete_paging(&self) -> Self {
        match self {
            Self::Paginating => Self::LoggedIn,
            other => *other,
        }
    }
}
