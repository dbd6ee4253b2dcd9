//! Error types for the session gateway.

use thiserror::Error;

use super::super::alert::Severity;

/// Errors from the gateway's interaction with the game server, plus the
/// local validation failures it catches before any network call.
#[derive(Clone, Debug, Error)]
pub enum GatewayError {
    /// Caller misuse: no player to query for.
    #[error("undefined player ID")]
    MissingPlayerId,
    /// Caller misuse: no game to act on.
    #[error("undefined game ID")]
    MissingGameId,
    /// The request never produced a server response.
    #[error("network failure: {message}")]
    Transport { message: String },
    /// The server answered with an error status.
    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },
}

impl GatewayError {
    pub(crate) fn transport(error: impl std::fmt::Display) -> Self {
        Self::Transport {
            message: error.to_string(),
        }
    }

    /// Validation failures are caller misuse, not server faults.
    #[must_use]
    pub const fn severity(&self) -> Severity {
        match self {
            Self::MissingPlayerId | Self::MissingGameId => Severity::Warning,
            Self::Transport { .. } | Self::Server { .. } => Severity::Error,
        }
    }

    /// What the user should see: the server-provided message when there is
    /// one, a generic notice otherwise.
    #[must_use]
    pub fn alert_message(&self) -> String {
        match self {
            Self::Server { message, .. } => message.clone(),
            Self::Transport { .. } => "network failure".to_owned(),
            Self::MissingPlayerId | Self::MissingGameId => self.to_string(),
        }
    }
}
