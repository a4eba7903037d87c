use reqwest::StatusCode;
use thiserror::Error;

/// Failure of a single backend call.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest_middleware::Error),

    #[error("Failed to read response: {0}")]
    Body(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("Invalid response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Failed to build HTTP client: {0}")]
    Client(String),
}

impl BackendError {
    /// The request never produced a complete response.
    pub fn is_transport(&self) -> bool {
        matches!(self, BackendError::Transport(_) | BackendError::Body(_))
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            BackendError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Errors surfaced by the session lifecycle.
///
/// A failed refresh is never reported as such: the session is signed out and
/// the caller sees `SessionExpired`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("{0}")]
    Validation(String),

    #[error("Username or password is incorrect")]
    InvalidCredentials,

    #[error("{0}")]
    Network(String),

    #[error("{0}")]
    Backend(String),

    #[error("Session expired, please sign in again")]
    SessionExpired,

    #[error("Not signed in")]
    NotAuthenticated,
}

impl SessionError {
    pub fn missing_credentials() -> Self {
        SessionError::Validation("Missing username or password".to_string())
    }

    /// The user has to go back to the sign-in page.
    pub fn requires_sign_in(&self) -> bool {
        matches!(
            self,
            SessionError::SessionExpired | SessionError::NotAuthenticated
        )
    }
}

impl From<BackendError> for SessionError {
    fn from(err: BackendError) -> Self {
        let message = err.to_string();
        let message = if message.trim().is_empty() {
            "Something went wrong".to_string()
        } else {
            message
        };

        if err.is_transport() {
            SessionError::Network(message)
        } else {
            SessionError::Backend(message)
        }
    }
}
