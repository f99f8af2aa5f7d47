use super::MessageRole;

/// One `{role, content}` pair of the chat-history projection handed to the
/// generation provider. Carries no storage metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTurn {
    pub role: MessageRole,
    pub content: String,
}

impl ChatTurn {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}
