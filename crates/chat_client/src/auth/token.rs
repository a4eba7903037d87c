use chrono::{Local, TimeZone};
use serde::{Deserialize, Serialize};

use crate::api::LoginResponse;

/// Credentials issued by a successful `POST /login`.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthorizedUser {
    pub access_token: String,
    pub refresh_token: String,
    pub name: String,
}

impl From<LoginResponse> for AuthorizedUser {
    fn from(resp: LoginResponse) -> Self {
        Self {
            access_token: resp.access,
            refresh_token: resp.refresh,
            name: resp.user.name,
        }
    }
}

impl std::fmt::Debug for AuthorizedUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizedUser")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("name", &self.name)
            .finish()
    }
}

/// The authenticated session's token pair.
///
/// `access_expires_at` is always the time of the last issuance or refresh
/// plus the access token lifetime. `session_expires_at` bounds the whole
/// session to the refresh token lifetime.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionToken {
    pub access_token: String,
    pub refresh_token: String,
    pub access_expires_at: u64,
    pub session_expires_at: u64,
    pub user_name: String,
}

impl SessionToken {
    pub fn issue(user: AuthorizedUser, now: u64, access_lifetime: u64, session_lifetime: u64) -> Self {
        Self {
            access_token: user.access_token,
            refresh_token: user.refresh_token,
            access_expires_at: now + access_lifetime,
            session_expires_at: now + session_lifetime,
            user_name: user.name,
        }
    }

    /// Past the access expiry; the token must be refreshed before use.
    pub fn is_stale(&self, now: u64) -> bool {
        now > self.access_expires_at
    }

    /// Past the session's maximum age; the refresh token is dead as well.
    pub fn is_past_max_age(&self, now: u64) -> bool {
        now > self.session_expires_at
    }

    /// Token after a successful refresh. A rotated refresh token restarts the
    /// session's maximum age.
    pub fn refreshed(
        &self,
        access_token: String,
        rotated_refresh: Option<String>,
        now: u64,
        access_lifetime: u64,
        session_lifetime: u64,
    ) -> Self {
        let (refresh_token, session_expires_at) = match rotated_refresh {
            Some(refresh) => (refresh, now + session_lifetime),
            None => (self.refresh_token.clone(), self.session_expires_at),
        };
        Self {
            access_token,
            refresh_token,
            access_expires_at: now + access_lifetime,
            session_expires_at,
            user_name: self.user_name.clone(),
        }
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            access_token: self.access_token.clone(),
            expires: display_time(self.access_expires_at),
            user: SessionUser {
                name: self.user_name.clone(),
            },
        }
    }
}

impl std::fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionToken")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("access_expires_at", &self.access_expires_at)
            .field("session_expires_at", &self.session_expires_at)
            .field("user_name", &self.user_name)
            .finish()
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct SessionUser {
    pub name: String,
}

/// What the rest of the application sees of the session.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct SessionView {
    pub access_token: String,
    /// Local wall-clock time at which the access token expires.
    pub expires: String,
    pub user: SessionUser,
}

fn display_time(epoch: u64) -> String {
    i64::try_from(epoch)
        .ok()
        .and_then(|secs| Local.timestamp_opt(secs, 0).single())
        .map(|time| time.format("%H:%M:%S GMT%z").to_string())
        .unwrap_or_default()
}
