//! Normalised gateway errors.
//!
//! Every failure mode of a gateway call ends up here; nothing else crosses
//! the client boundary. `Display` yields the message a user should see.

use thiserror::Error;

/// Message shown when the session is gone and the user must log in again.
pub const UNAUTHORIZED_MESSAGE: &str = "Unauthorized - please login again";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// 401 that could not be recovered by a silent refresh. The session has been cleared.
    #[error("Unauthorized - please login again")]
    Unauthorized,

    /// Non-2xx reply. `message` is the body's `message` field or `HTTP <status>: <reason>`.
    #[error("{message}")]
    Http { status: u16, message: String },

    /// No response (connection refused, DNS, timeout).
    #[error("network error: {0}")]
    Network(String),

    #[error("invalid response: {0}")]
    Decode(String),

    #[error("failed to encode request: {0}")]
    Encode(String),

    #[error("failed to create HTTP client: {0}")]
    Setup(String),
}

impl GatewayError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }

    /// HTTP status, when the gateway answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized => Some(401),
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}
