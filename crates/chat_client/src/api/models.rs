//! Wire types of the backend authentication and response endpoints.

use serde::{Deserialize, Serialize};

#[derive(Serialize, Debug, Clone)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Deserialize, Debug, Clone)]
pub struct BackendUser {
    pub name: String,
}

/// `POST /login` success body.
#[derive(Deserialize, Debug, Clone)]
pub struct LoginResponse {
    pub access: String,
    pub refresh: String,
    pub user: BackendUser,
}

/// Body of `POST /refresh` and `POST /signout`.
#[derive(Serialize, Debug, Clone)]
pub struct RefreshRequest<'a> {
    pub refresh: &'a str,
}

/// `POST /refresh` success body. Backends that rotate refresh tokens also
/// return the new one.
#[derive(Deserialize, Debug, Clone)]
pub struct RefreshResponse {
    pub access: String,
    #[serde(default)]
    pub refresh: Option<String>,
}

/// Status and undecoded body of a `GET /response` call.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: reqwest::StatusCode,
    pub body: String,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}
