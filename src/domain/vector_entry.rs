use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::{ConversationId, Embedding, MessageId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VectorEntryId(Uuid);

impl VectorEntryId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for VectorEntryId {
    fn default() -> Self {
        Self::new()
    }
}

/// An embedding record backing semantic search. An entry without a
/// `message_id` indexes conversation-level content rather than a single
/// message. Entries reference messages and conversations, they never own
/// them.
#[derive(Debug, Clone)]
pub struct VectorEntry {
    pub id: VectorEntryId,
    pub owner_id: UserId,
    pub conversation_id: Option<ConversationId>,
    pub message_id: Option<MessageId>,
    pub content: String,
    pub embedding: Embedding,
    pub metadata: Map<String, Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VectorEntry {
    pub fn for_message(
        owner_id: UserId,
        conversation_id: ConversationId,
        message_id: MessageId,
        content: String,
        embedding: Embedding,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: VectorEntryId::new(),
            owner_id,
            conversation_id: Some(conversation_id),
            message_id: Some(message_id),
            content,
            embedding,
            metadata: Map::new(),
            created_at: now,
            updated_at: now,
        }
    }
}
