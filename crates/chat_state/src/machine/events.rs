//! Session events - what moves the session between phases

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionEvent {
    /// Credentials were accepted and a token pair issued.
    LoginSucceeded,

    /// The clock passed the access token expiry.
    AccessExpired,

    /// A new access token was obtained with the refresh token.
    RefreshSucceeded,

    /// The refresh call failed, or the session outlived its maximum age.
    RefreshFailed { reason: String },

    /// The local session was cleared.
    SignedOut,
}

impl std::fmt::Display for SessionEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionEvent::LoginSucceeded => f.write_str("login_succeeded"),
            SessionEvent::AccessExpired => f.write_str("access_expired"),
            SessionEvent::RefreshSucceeded => f.write_str("refresh_succeeded"),
            SessionEvent::RefreshFailed { reason } => write!(f, "refresh_failed({reason})"),
            SessionEvent::SignedOut => f.write_str("signed_out"),
        }
    }
}
