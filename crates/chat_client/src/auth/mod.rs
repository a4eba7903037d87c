//! Session authentication
//!
//! Token flow:
//! 1. `POST /login` with username and password
//! 2. Keep the access token until `access_expires_at`
//! 3. Past it, `POST /refresh` with the refresh token
//! 4. On refresh failure, clear the session and `POST /signout`

pub mod clock;
pub mod session;
pub mod token;

pub use clock::{Clock, ManualClock, SystemClock};
pub use session::{SessionManager, TokenSource};
pub use token::{AuthorizedUser, SessionToken, SessionUser, SessionView};
