use serde::{Deserialize, Serialize};

/// Ingestion session states
///
/// `Error` is terminal for the session; there is no automatic reconnection.
/// `Closed` is reachable from any live state by explicit shutdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Idle,
    Discovering,
    Connecting,
    ResolvingServices,
    Subscribed,
    Closed,
    Error { message: String },
}

impl SessionState {
    /// Check if transition from current state to target state is valid
    pub fn can_transition_to(&self, target: &SessionState) -> bool {
        use SessionState::*;

        matches!(
            (self, target),
            (Idle, Discovering)
                | (Discovering, Connecting)
                | (Connecting, ResolvingServices)
                | (ResolvingServices, Subscribed)
                | (Discovering, Error { .. })
                | (Connecting, Error { .. })
                | (ResolvingServices, Error { .. })
                | (Subscribed, Error { .. })
                | (Idle, Closed)
                | (Discovering, Closed)
                | (Connecting, Closed)
                | (ResolvingServices, Closed)
                | (Subscribed, Closed)
        )
    }

    /// Get human-readable state name
    pub fn name(&self) -> &str {
        match self {
            Self::Idle => "Idle",
            Self::Discovering => "Discovering",
            Self::Connecting => "Connecting",
            Self::ResolvingServices => "ResolvingServices",
            Self::Subscribed => "Subscribed",
            Self::Closed => "Closed",
            Self::Error { .. } => "Error",
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::Idle
    }
}
