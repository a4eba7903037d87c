//! Session phases

use serde::{Deserialize, Serialize};

/// Lifecycle phase of the authenticated session.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// No session. The user must sign in.
    Unauthenticated,

    /// Signed in and the access token is within its lifetime.
    Active,

    /// Signed in but the access token is past its expiry. The next read
    /// must refresh before handing the token out.
    Stale,

    /// The refresh call failed. Transient: the manager signs out right after.
    RefreshFailed,
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SessionPhase::Unauthenticated => "unauthenticated",
            SessionPhase::Active => "active",
            SessionPhase::Stale => "stale",
            SessionPhase::RefreshFailed => "refresh_failed",
        };
        f.write_str(name)
    }
}
