//! Conversation data shared between the backend client and the views.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Entry of the conversation list. Insertion order is display order.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ConversationRef {
    pub conversation_id: String,
    pub title: String,
}

impl ConversationRef {
    pub fn new(conversation_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            title: title.into(),
        }
    }
}

/// One response of a conversation as returned by `GET /response`.
///
/// Only the identifying fields are typed; everything else the backend sends
/// is kept verbatim in `payload`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ResponseRecord {
    pub response_id: String,
    pub choice_id: String,
    pub conversation_id: String,
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl ResponseRecord {
    pub fn new(
        conversation_id: impl Into<String>,
        response_id: impl Into<String>,
        choice_id: impl Into<String>,
    ) -> Self {
        Self {
            response_id: response_id.into(),
            choice_id: choice_id.into(),
            conversation_id: conversation_id.into(),
            payload: Map::new(),
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.payload.insert(key.into(), value.into());
        self
    }
}

/// Pointer to the response shown as the active message of a conversation.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct CurrentResponse {
    pub conversation_id: String,
    pub response_id: String,
    pub choice_id: String,
}

/// Signals that a conversation is being created locally, so its history must
/// not be fetched from the backend.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct CreationStatus {
    pub is_creating: bool,
    pub conversation_id: Option<String>,
    pub message: String,
}

impl CreationStatus {
    pub fn creating(conversation_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            is_creating: true,
            conversation_id: Some(conversation_id.into()),
            message: message.into(),
        }
    }

    /// Whether this status concerns `conversation_id`.
    pub fn targets(&self, conversation_id: &str) -> bool {
        self.conversation_id.as_deref() == Some(conversation_id)
    }
}
