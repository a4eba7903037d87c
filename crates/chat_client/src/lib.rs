pub mod api;
pub mod auth;
pub mod error;

pub use api::{BackendClient, RawResponse};
pub use auth::{
    AuthorizedUser, Clock, ManualClock, SessionManager, SessionToken, SessionView, SystemClock,
    TokenSource,
};
pub use chat_state::SessionPhase;
pub use error::{BackendError, SessionError};
