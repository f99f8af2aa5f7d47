use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::application::ports::SimilarityHit;
use crate::domain::{Conversation, Message};

#[derive(Serialize)]
pub struct ConversationDto {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Conversation> for ConversationDto {
    fn from(conversation: &Conversation) -> Self {
        Self {
            id: conversation.id.as_uuid(),
            owner_id: conversation.owner_id.as_uuid(),
            title: conversation.title.clone(),
            created_at: conversation.created_at,
            updated_at: conversation.updated_at,
        }
    }
}

#[derive(Serialize)]
pub struct MessageDto {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub role: String,
    pub content: String,
    pub metadata: Map<String, Value>,
    pub created_at: DateTime<Utc>,
}

impl From<&Message> for MessageDto {
    fn from(message: &Message) -> Self {
        Self {
            id: message.id.as_uuid(),
            conversation_id: message.conversation_id.as_uuid(),
            role: message.role.as_str().to_string(),
            content: message.content.clone(),
            metadata: message.metadata.clone(),
            created_at: message.created_at,
        }
    }
}

#[derive(Serialize)]
pub struct SimilarityHitDto {
    pub entry_id: Uuid,
    pub conversation_id: Option<Uuid>,
    pub message_id: Option<Uuid>,
    pub content: String,
    pub score: f32,
}

impl From<&SimilarityHit> for SimilarityHitDto {
    fn from(hit: &SimilarityHit) -> Self {
        Self {
            entry_id: hit.entry_id.as_uuid(),
            conversation_id: hit.conversation_id.map(|id| id.as_uuid()),
            message_id: hit.message_id.map(|id| id.as_uuid()),
            content: hit.content.clone(),
            score: hit.score,
        }
    }
}
