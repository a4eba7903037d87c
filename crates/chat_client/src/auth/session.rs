//! Session lifecycle: login, silent refresh, forced sign-out.

use std::sync::{Arc, Mutex as StdMutex, PoisonError};

use async_trait::async_trait;
use chat_core::Config;
use chat_state::{SessionEvent, SessionMachine, SessionPhase, StateTransition};
use dashmap::DashMap;
use reqwest::StatusCode;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use super::clock::{Clock, SystemClock};
use super::token::{AuthorizedUser, SessionToken, SessionView};
use crate::api::BackendClient;
use crate::error::SessionError;

/// Outcome of the last refresh attempt for one refresh token.
#[derive(Debug)]
enum RefreshSlot {
    Idle,
    Refreshed(SessionToken),
    Expired,
}

/// Where the conversation views get their bearer token from.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn access_token(&self) -> Result<String, SessionError>;
}

/// Owns the authenticated session and keeps its access token fresh.
#[derive(Debug)]
pub struct SessionManager {
    backend: BackendClient,
    clock: Arc<dyn Clock>,
    access_lifetime: u64,
    session_lifetime: u64,
    session: RwLock<Option<SessionToken>>,
    machine: StdMutex<SessionMachine>,
    // One gate per refresh token so concurrent readers share a single refresh.
    refresh_gates: DashMap<String, Arc<Mutex<RefreshSlot>>>,
}

impl SessionManager {
    pub fn new(backend: BackendClient, config: &Config) -> Self {
        Self {
            backend,
            clock: Arc::new(SystemClock),
            access_lifetime: config.access_token_lifetime_secs,
            session_lifetime: config.refresh_token_lifetime_secs,
            session: RwLock::new(None),
            machine: StdMutex::new(SessionMachine::new()),
            refresh_gates: DashMap::new(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn backend(&self) -> &BackendClient {
        &self.backend
    }

    /// Check credentials against `POST /login`.
    ///
    /// Empty credentials are rejected before any network call.
    pub async fn authorize(
        &self,
        username: &str,
        password: &str,
    ) -> Result<AuthorizedUser, SessionError> {
        if username.is_empty() || password.is_empty() {
            return Err(SessionError::missing_credentials());
        }

        match self.backend.login(username, password).await {
            Ok(resp) => Ok(resp.into()),
            Err(e) if e.status() == Some(StatusCode::UNAUTHORIZED) => {
                Err(SessionError::InvalidCredentials)
            }
            Err(e) => {
                warn!("Login failed: {e}");
                Err(e.into())
            }
        }
    }

    /// Authorize and install the issued tokens as the managed session.
    pub async fn login(&self, username: &str, password: &str) -> Result<SessionToken, SessionError> {
        let user = self.authorize(username, password).await?;
        let token = SessionToken::issue(
            user,
            self.clock.now(),
            self.access_lifetime,
            self.session_lifetime,
        );

        *self.session.write().await = Some(token.clone());
        self.prune_refresh_gates();
        self.record(SessionEvent::LoginSucceeded);
        info!("Signed in as {}", token.user_name);
        Ok(token)
    }

    /// Return `token` if its access token is still valid, otherwise refresh it.
    ///
    /// A failed refresh signs the session out (locally and on the backend) and
    /// yields `SessionExpired`.
    pub async fn ensure_fresh_token(&self, token: &SessionToken) -> Result<SessionToken, SessionError> {
        if !token.is_stale(self.clock.now()) {
            return Ok(token.clone());
        }
        self.record(SessionEvent::AccessExpired);

        let gate = Arc::clone(
            self.refresh_gates
                .entry(token.refresh_token.clone())
                .or_insert_with(|| Arc::new(Mutex::new(RefreshSlot::Idle)))
                .value(),
        );
        let mut slot = gate.lock().await;

        let now = self.clock.now();
        match &*slot {
            RefreshSlot::Refreshed(fresh) if !fresh.is_stale(now) => {
                debug!("Reusing access token refreshed by a concurrent reader");
                return Ok(fresh.clone());
            }
            RefreshSlot::Expired => return Err(SessionError::SessionExpired),
            _ => {}
        }

        if token.is_past_max_age(now) {
            *slot = RefreshSlot::Expired;
            drop(slot);
            self.force_sign_out(token, "session reached its maximum age").await;
            return Err(SessionError::SessionExpired);
        }

        match self.backend.refresh(&token.refresh_token).await {
            Ok(resp) => {
                let fresh = token.refreshed(
                    resp.access,
                    resp.refresh,
                    self.clock.now(),
                    self.access_lifetime,
                    self.session_lifetime,
                );
                *slot = RefreshSlot::Refreshed(fresh.clone());
                drop(slot);

                self.replace_if_current(token, &fresh).await;
                self.prune_refresh_gates();
                self.record(SessionEvent::RefreshSucceeded);
                debug!("Access token refreshed for {}", fresh.user_name);
                Ok(fresh)
            }
            Err(e) => {
                warn!("Access token refresh failed: {e}");
                *slot = RefreshSlot::Expired;
                drop(slot);
                self.force_sign_out(token, &e.to_string()).await;
                Err(SessionError::SessionExpired)
            }
        }
    }

    /// Read the managed session, refreshing it first when stale.
    pub async fn current_token(&self) -> Result<SessionToken, SessionError> {
        let token = self
            .session
            .read()
            .await
            .clone()
            .ok_or(SessionError::NotAuthenticated)?;
        self.ensure_fresh_token(&token).await
    }

    pub async fn session(&self) -> Result<SessionView, SessionError> {
        Ok(self.current_token().await?.view())
    }

    /// Sign the managed session out. Always succeeds locally.
    pub async fn sign_out(&self) {
        let token = self.session.write().await.take();
        self.record(SessionEvent::SignedOut);
        if let Some(token) = token {
            self.refresh_gates.remove(&token.refresh_token);
            self.notify_sign_out(&token.refresh_token).await;
            info!("Signed out {}", token.user_name);
        }
    }

    /// Invalidate `refresh_token` on the backend, clearing the managed session
    /// too if it holds that token. Best-effort.
    pub async fn sign_out_token(&self, refresh_token: &str) {
        if self.clear_if_current(refresh_token).await {
            self.record(SessionEvent::SignedOut);
        }
        self.refresh_gates.remove(refresh_token);
        self.notify_sign_out(refresh_token).await;
    }

    /// Current lifecycle phase. Notices an expired access token without
    /// refreshing it.
    pub async fn phase(&self) -> SessionPhase {
        let stale = self
            .session
            .read()
            .await
            .as_ref()
            .is_some_and(|token| token.is_stale(self.clock.now()));

        let mut machine = self.machine();
        if stale && machine.phase() == SessionPhase::Active {
            machine.handle_event(SessionEvent::AccessExpired);
        }
        machine.phase()
    }

    pub fn transitions(&self) -> Vec<StateTransition> {
        self.machine().history().to_vec()
    }

    async fn force_sign_out(&self, token: &SessionToken, reason: &str) {
        if self.clear_if_current(&token.refresh_token).await {
            self.record(SessionEvent::RefreshFailed {
                reason: reason.to_string(),
            });
            self.record(SessionEvent::SignedOut);
        }
        info!("Session of {} expired: {reason}", token.user_name);
        self.notify_sign_out(&token.refresh_token).await;
    }

    /// Drop gates nobody is waiting on whose outcome can no longer be reused:
    /// a refreshed token that has gone stale, or a session already expired
    /// and replaced. Rotating refresh tokens keep at most the previous
    /// generation around.
    fn prune_refresh_gates(&self) {
        let now = self.clock.now();
        self.refresh_gates.retain(|_, gate| match gate.try_lock() {
            Ok(slot) => match &*slot {
                RefreshSlot::Refreshed(fresh) => !fresh.is_stale(now),
                RefreshSlot::Expired => false,
                RefreshSlot::Idle => true,
            },
            Err(_) => true,
        });
    }

    async fn notify_sign_out(&self, refresh_token: &str) {
        if let Err(e) = self.backend.sign_out(refresh_token).await {
            warn!("Backend sign-out failed, local session already cleared: {e}");
        }
    }

    async fn clear_if_current(&self, refresh_token: &str) -> bool {
        let mut session = self.session.write().await;
        if session
            .as_ref()
            .is_some_and(|current| current.refresh_token == refresh_token)
        {
            *session = None;
            true
        } else {
            false
        }
    }

    async fn replace_if_current(&self, old: &SessionToken, fresh: &SessionToken) {
        let mut session = self.session.write().await;
        if session
            .as_ref()
            .is_some_and(|current| current.refresh_token == old.refresh_token)
        {
            *session = Some(fresh.clone());
        }
    }

    fn record(&self, event: SessionEvent) {
        self.machine().handle_event(event);
    }

    fn machine(&self) -> std::sync::MutexGuard<'_, SessionMachine> {
        self.machine.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl TokenSource for SessionManager {
    async fn access_token(&self) -> Result<String, SessionError> {
        Ok(self.current_token().await?.access_token)
    }
}
