use std::sync::Arc;

use chat_client::BackendClient;

use crate::alert::AlertChannel;
use crate::navigation::Navigator;
use crate::store::ConversationStore;

/// Application state shared by every mounted view.
#[derive(Debug, Clone)]
pub struct ViewContext {
    pub backend: BackendClient,
    pub store: Arc<ConversationStore>,
    pub alerts: AlertChannel,
    pub navigator: Navigator,
}

impl ViewContext {
    pub fn new(backend: BackendClient, alerts: AlertChannel, navigator: Navigator) -> Self {
        Self {
            backend,
            store: Arc::new(ConversationStore::new()),
            alerts,
            navigator,
        }
    }

    pub fn with_store(mut self, store: Arc<ConversationStore>) -> Self {
        self.store = store;
        self
    }
}
