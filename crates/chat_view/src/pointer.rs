use chat_core::{ConversationRef, CurrentResponse, ResponseRecord};

/// New pointer and display title for a conversation view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointerUpdate {
    pub current: CurrentResponse,
    pub title: String,
}

/// Point at the last response of `conversation_id`.
///
/// Records belonging to other conversations are ignored. `None` when the
/// conversation is not in the list or has no responses yet; the caller then
/// leaves the pointer where it is.
pub fn recompute_current_pointer(
    conversations: &[ConversationRef],
    responses: &[ResponseRecord],
    conversation_id: &str,
) -> Option<PointerUpdate> {
    let conversation = conversations
        .iter()
        .find(|c| c.conversation_id == conversation_id)?;
    let last = responses
        .iter()
        .rev()
        .find(|r| r.conversation_id == conversation_id)?;

    Some(PointerUpdate {
        current: CurrentResponse {
            conversation_id: conversation.conversation_id.clone(),
            response_id: last.response_id.clone(),
            choice_id: last.choice_id.clone(),
        },
        title: format!("Chat: {}", conversation.title),
    })
}
