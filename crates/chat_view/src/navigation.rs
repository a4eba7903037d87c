use tokio::sync::mpsc;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Sign-in page.
    Login,
    /// Conversation list.
    ConversationList,
    Conversation(String),
}

impl Route {
    pub fn path(&self) -> String {
        match self {
            Route::Login => "/login".to_string(),
            Route::ConversationList => "/chats".to_string(),
            Route::Conversation(id) => format!("/chats/{id}"),
        }
    }

    /// Absolute page URL under the frontend's base URL (`Config::app_url`).
    pub fn url(&self, app_url: &str) -> String {
        format!("{}{}", app_url.trim_end_matches('/'), self.path())
    }
}

/// Requests navigation from the presentation layer's router.
#[derive(Debug, Clone)]
pub struct Navigator {
    tx: mpsc::UnboundedSender<Route>,
}

impl Navigator {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Route>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn push(&self, route: Route) {
        debug!("navigate to {}", route.path());
        if self.tx.send(route).is_err() {
            debug!("Navigation dropped: no router");
        }
    }
}
