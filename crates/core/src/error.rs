//! Error taxonomy shared by the HTTP client, session store and resource managers.

use thiserror::Error;

use crate::validation::FieldErrors;

/// Failures surfaced to the view layer.
///
/// Nothing here is fatal to the process: validation problems are fixed by
/// editing the form, auth failures by logging in again, stale ids by
/// reloading, and transport failures by retrying.
#[derive(Debug, Error)]
pub enum Error {
    /// Field data rejected either client-side or by the server.
    #[error("validation failed: {0}")]
    Validation(FieldErrors),
    /// Missing, invalid or expired credentials.
    #[error("authentication failed: {0}")]
    Auth(String),
    /// The addressed record no longer exists server-side.
    #[error("not found: {0}")]
    NotFound(String),
    /// The request never produced an HTTP response.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    /// Any other non-success status returned by the API.
    #[error("server responded with {status}: {message}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Detail extracted from the response body.
        message: String,
    },
    /// A token exists but no user profile could be obtained for it.
    #[error("session has no user profile")]
    ProfileIncomplete,
    /// Reading or writing the persisted session failed.
    #[error("session storage error: {0}")]
    Storage(#[from] std::io::Error),
    /// A JSON payload could not be encoded or decoded.
    #[error("invalid JSON payload: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Whether the error means the session must be discarded.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth(_))
    }

    /// Per-field errors carried by a validation failure.
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            Self::Validation(errors) => Some(errors),
            _ => None,
        }
    }

    /// Whether retrying the same request may succeed without user changes.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Server { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl From<FieldErrors> for Error {
    fn from(errors: FieldErrors) -> Self {
        Self::Validation(errors)
    }
}

/// Crate-wide result alias.
pub type Result<T, E = Error> = std::result::Result<T, E>;
