//! chat_view - Conversation view state synchronisation
//!
//! - `store` - shared conversation state (titles, responses, creation status, pointer)
//! - `alert` / `navigation` - channels the presentation layer listens on
//! - `pointer` - derivation of the current response pointer
//! - `view` - one mounted conversation view: one-shot fetch, pointer sync, status

pub mod alert;
pub mod context;
pub mod navigation;
pub mod pointer;
pub mod store;
pub mod view;

pub use alert::{Alert, AlertChannel, Severity};
pub use context::ViewContext;
pub use navigation::{Navigator, Route};
pub use pointer::{recompute_current_pointer, PointerUpdate};
pub use store::ConversationStore;
pub use view::{ConversationView, FetchOutcome, FetchPhase, ViewStatus, UNABLE_TO_GET_RESPONSES};
