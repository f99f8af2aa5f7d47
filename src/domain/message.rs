use super::{ConversationId, MessageId, MessageRole, VectorEntryId};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

#[derive(Debug, Clone)]
pub struct Message {
    pub id: MessageId,
    pub conversation_id: ConversationId,
    pub role: MessageRole,
    pub content: String,
    pub metadata: Map<String, Value>,
    pub embedding_ref: Option<VectorEntryId>,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn new(conversation_id: ConversationId, role: MessageRole, content: String) -> Self {
        Self {
            id: MessageId::new(),
            conversation_id,
            role,
            content,
            metadata: Map::new(),
            embedding_ref: None,
            created_at: Utc::now(),
        }
    }

    /// An assistant message persisted with empty content before streamed
    /// generation begins; `update_content` fills it in once the stream ends.
    pub fn placeholder(conversation_id: ConversationId) -> Self {
        Self::new(conversation_id, MessageRole::Assistant, String::new())
    }
}
