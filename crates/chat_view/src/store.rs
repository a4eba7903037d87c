//! Shared conversation state
//!
//! Each slice lives in its own watch channel so views can subscribe to
//! exactly the slices they derive from.

use chat_core::{ConversationRef, CreationStatus, CurrentResponse, ResponseRecord};
use tokio::sync::watch;

#[derive(Debug)]
pub struct ConversationStore {
    conversations: watch::Sender<Vec<ConversationRef>>,
    responses: watch::Sender<Vec<ResponseRecord>>,
    create_status: watch::Sender<CreationStatus>,
    current_response: watch::Sender<Option<CurrentResponse>>,
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationStore {
    pub fn new() -> Self {
        Self {
            conversations: watch::channel(Vec::new()).0,
            responses: watch::channel(Vec::new()).0,
            create_status: watch::channel(CreationStatus::default()).0,
            current_response: watch::channel(None).0,
        }
    }

    // ========== Conversations ==========

    pub fn conversations(&self) -> Vec<ConversationRef> {
        self.conversations.borrow().clone()
    }

    pub fn set_conversations(&self, conversations: Vec<ConversationRef>) {
        self.conversations.send_replace(conversations);
    }

    pub fn add_conversation(&self, conversation: ConversationRef) {
        self.conversations.send_modify(|list| list.push(conversation));
    }

    pub fn subscribe_conversations(&self) -> watch::Receiver<Vec<ConversationRef>> {
        self.conversations.subscribe()
    }

    // ========== Responses ==========

    pub fn responses(&self) -> Vec<ResponseRecord> {
        self.responses.borrow().clone()
    }

    /// Replace the whole response list, as a completed fetch does.
    pub fn set_responses(&self, responses: Vec<ResponseRecord>) {
        self.responses.send_replace(responses);
    }

    pub fn push_response(&self, response: ResponseRecord) {
        self.responses.send_modify(|list| list.push(response));
    }

    pub fn subscribe_responses(&self) -> watch::Receiver<Vec<ResponseRecord>> {
        self.responses.subscribe()
    }

    // ========== Creation status ==========

    pub fn create_status(&self) -> CreationStatus {
        self.create_status.borrow().clone()
    }

    /// Whether `conversation_id` is being created right now. Reads the
    /// current value without waiting.
    pub fn is_creating(&self, conversation_id: &str) -> bool {
        self.create_status.borrow().targets(conversation_id)
    }

    pub fn set_create_status(&self, status: CreationStatus) {
        self.create_status.send_replace(status);
    }

    pub fn clear_create_status(&self) {
        self.create_status.send_replace(CreationStatus::default());
    }

    pub fn subscribe_create_status(&self) -> watch::Receiver<CreationStatus> {
        self.create_status.subscribe()
    }

    // ========== Current response pointer ==========

    pub fn current_response(&self) -> Option<CurrentResponse> {
        self.current_response.borrow().clone()
    }

    /// Returns whether the pointer moved.
    pub fn set_current_response(&self, pointer: CurrentResponse) -> bool {
        self.current_response.send_if_modified(|current| {
            if current.as_ref() == Some(&pointer) {
                false
            } else {
                *current = Some(pointer);
                true
            }
        })
    }

    pub fn subscribe_current_response(&self) -> watch::Receiver<Option<CurrentResponse>> {
        self.current_response.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_responses_replaces() {
        let store = ConversationStore::new();
        store.push_response(ResponseRecord::new("c", "r0", "x0"));
        store.set_responses(vec![
            ResponseRecord::new("c", "r1", "x1"),
            ResponseRecord::new("c", "r2", "x2"),
        ]);

        let ids: Vec<_> = store.responses().into_iter().map(|r| r.response_id).collect();
        assert_eq!(ids, ["r1", "r2"]);
    }

    #[test]
    fn subscribers_see_changes() {
        let store = ConversationStore::new();
        let mut rx = store.subscribe_conversations();
        assert!(!rx.has_changed().unwrap());

        store.add_conversation(ConversationRef::new("c", "Hello"));
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().len(), 1);
    }

    #[test]
    fn pointer_updates_only_on_change() {
        let store = ConversationStore::new();
        let pointer = CurrentResponse {
            conversation_id: "c".into(),
            response_id: "r".into(),
            choice_id: "x".into(),
        };
        assert!(store.set_current_response(pointer.clone()));
        assert!(!store.set_current_response(pointer));
    }

    #[test]
    fn creation_status_round_trip() {
        let store = ConversationStore::new();
        store.set_create_status(CreationStatus::creating("new", "Thinking..."));
        assert!(store.is_creating("new"));
        store.clear_create_status();
        assert!(!store.is_creating("new"));
    }
}
