//! A mounted conversation view.
//!
//! Each mount fetches the conversation history at most once, skips that fetch
//! when the conversation is being created locally, and keeps the current
//! response pointer in sync with the shared state until unmounted.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chat_client::{SessionError, TokenSource};
use chat_core::ResponseRecord;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::context::ViewContext;
use crate::navigation::Route;
use crate::pointer::recompute_current_pointer;

pub const UNABLE_TO_GET_RESPONSES: &str = "Unable to get responses";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchPhase {
    /// Nothing fetched yet.
    Pending,
    InFlight,
    /// History is in place (fetched, skipped, or degraded).
    Done,
    /// The request failed in transport; the user was sent back to the list.
    Abandoned,
}

/// What a call to `fetch_once` / `load` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// A fetch was already started or finished for this mount.
    AlreadyStarted,
    /// No access token yet; nothing was sent.
    AwaitingToken,
    /// The conversation is being created locally; no fetch.
    SkippedCreating,
    Loaded { count: usize },
    /// The backend answered with an error status or an unreadable body.
    /// `applied` tells whether a response list could still be used.
    Degraded { applied: bool },
    /// Transport failure; navigated back to the conversation list.
    Failed,
    /// The view was unmounted before the result arrived.
    Discarded,
    /// No usable session; navigated to the sign-in page.
    SignInRequired,
}

/// What the presentation layer should render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewStatus {
    Loading,
    Ready,
    /// History is shown and a response is being created in this conversation.
    Creating { message: String },
}

#[derive(Debug)]
pub struct ConversationView {
    conversation_id: String,
    ctx: ViewContext,
    phase: Mutex<FetchPhase>,
    title: Mutex<Option<String>>,
    alive: CancellationToken,
}

impl ConversationView {
    pub fn mount(conversation_id: impl Into<String>, ctx: ViewContext) -> Arc<Self> {
        let view = Arc::new(Self {
            conversation_id: conversation_id.into(),
            ctx,
            phase: Mutex::new(FetchPhase::Pending),
            title: Mutex::new(None),
            alive: CancellationToken::new(),
        });
        debug!("mounted conversation view {}", view.conversation_id);
        view
    }

    pub fn conversation_id(&self) -> &str {
        &self.conversation_id
    }

    pub fn fetch_phase(&self) -> FetchPhase {
        *self.phase()
    }

    pub fn is_mounted(&self) -> bool {
        !self.alive.is_cancelled()
    }

    /// Stop the pointer subscription and drop any in-flight result.
    pub fn unmount(&self) {
        self.alive.cancel();
        debug!("unmounted conversation view {}", self.conversation_id);
    }

    /// Fetch the conversation history unless this mount already did.
    ///
    /// The creation status is checked under the same lock that claims the
    /// fetch, before anything is sent.
    pub async fn fetch_once(&self, access_token: Option<&str>) -> FetchOutcome {
        let token = {
            let mut phase = self.phase();
            if let Some(outcome) = self.precheck(&mut phase) {
                return outcome;
            }
            let Some(token) = access_token else {
                return FetchOutcome::AwaitingToken;
            };
            *phase = FetchPhase::InFlight;
            token
        };

        let result = self
            .ctx
            .backend
            .fetch_responses(&self.conversation_id, token)
            .await;

        if !self.is_mounted() {
            debug!(
                "discarding responses for {}: view unmounted",
                self.conversation_id
            );
            self.set_phase(FetchPhase::Abandoned);
            return FetchOutcome::Discarded;
        }

        let raw = match result {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Fetching responses for {} failed: {e}", self.conversation_id);
                self.set_phase(FetchPhase::Abandoned);
                self.ctx.alerts.error(e.to_string());
                self.ctx.navigator.push(Route::ConversationList);
                return FetchOutcome::Failed;
            }
        };

        // Any answer from the backend completes the fetch for this mount.
        self.set_phase(FetchPhase::Done);
        let decoded = serde_json::from_str::<Vec<ResponseRecord>>(&raw.body);

        if raw.is_success() {
            match decoded {
                Ok(records) => {
                    let count = records.len();
                    self.ctx.store.set_responses(records);
                    info!("Loaded {count} responses for {}", self.conversation_id);
                    FetchOutcome::Loaded { count }
                }
                Err(e) => {
                    warn!("Unreadable responses for {}: {e}", self.conversation_id);
                    self.ctx.alerts.error(UNABLE_TO_GET_RESPONSES);
                    FetchOutcome::Degraded { applied: false }
                }
            }
        } else {
            warn!(
                "GET /response for {} returned {}",
                self.conversation_id, raw.status
            );
            self.ctx.alerts.error(UNABLE_TO_GET_RESPONSES);
            match decoded {
                Ok(records) => {
                    self.ctx.store.set_responses(records);
                    FetchOutcome::Degraded { applied: true }
                }
                Err(_) => FetchOutcome::Degraded { applied: false },
            }
        }
    }

    /// Obtain the access token from `session`, then `fetch_once`.
    ///
    /// An expired session raises an alert and sends the user to sign in.
    pub async fn load(&self, session: &dyn TokenSource) -> FetchOutcome {
        {
            let mut phase = self.phase();
            if let Some(outcome) = self.precheck(&mut phase) {
                return outcome;
            }
        }

        match session.access_token().await {
            Ok(token) => self.fetch_once(Some(&token)).await,
            Err(e) if e.requires_sign_in() => {
                if e == SessionError::SessionExpired {
                    self.ctx.alerts.error(e.to_string());
                }
                self.ctx.navigator.push(Route::Login);
                FetchOutcome::SignInRequired
            }
            Err(e) => {
                warn!("No access token for {}: {e}", self.conversation_id);
                self.ctx.alerts.error(e.to_string());
                FetchOutcome::AwaitingToken
            }
        }
    }

    /// Recompute the current response pointer from the shared state.
    /// Returns whether anything was derived.
    pub fn sync_pointer(&self) -> bool {
        let conversations = self.ctx.store.conversations();
        let responses = self.ctx.store.responses();
        let Some(update) =
            recompute_current_pointer(&conversations, &responses, &self.conversation_id)
        else {
            return false;
        };

        self.ctx.store.set_current_response(update.current);
        *self.title.lock().unwrap_or_else(PoisonError::into_inner) = Some(update.title);
        true
    }

    /// Recompute the pointer whenever the conversation list or the responses
    /// change, until the view is unmounted.
    pub fn spawn_pointer_sync(self: &Arc<Self>) -> JoinHandle<()> {
        let view = Arc::clone(self);
        let mut conversations = view.ctx.store.subscribe_conversations();
        let mut responses = view.ctx.store.subscribe_responses();

        tokio::spawn(async move {
            view.sync_pointer();
            loop {
                tokio::select! {
                    _ = view.alive.cancelled() => break,
                    changed = conversations.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                    changed = responses.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }
                view.sync_pointer();
            }
            debug!("pointer sync for {} stopped", view.conversation_id);
        })
    }

    /// Window title for the conversation, once known.
    pub fn display_title(&self) -> Option<String> {
        self.title
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn status(&self) -> ViewStatus {
        if self.fetch_phase() != FetchPhase::Done {
            return ViewStatus::Loading;
        }
        let status = self.ctx.store.create_status();
        if status.is_creating && status.targets(&self.conversation_id) {
            ViewStatus::Creating {
                message: status.message,
            }
        } else {
            ViewStatus::Ready
        }
    }

    fn precheck(&self, phase: &mut FetchPhase) -> Option<FetchOutcome> {
        if !self.is_mounted() {
            return Some(FetchOutcome::Discarded);
        }
        if *phase != FetchPhase::Pending {
            return Some(FetchOutcome::AlreadyStarted);
        }
        if self.ctx.store.is_creating(&self.conversation_id) {
            *phase = FetchPhase::Done;
            debug!(
                "conversation {} is being created, not fetching",
                self.conversation_id
            );
            return Some(FetchOutcome::SkippedCreating);
        }
        None
    }

    fn phase(&self) -> MutexGuard<'_, FetchPhase> {
        self.phase.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_phase(&self, next: FetchPhase) {
        *self.phase() = next;
    }
}

impl Drop for ConversationView {
    fn drop(&mut self) {
        self.alive.cancel();
    }
}
