use super::{ConversationId, UserId};
use chrono::{DateTime, Utc};

/// A titled container of messages owned by exactly one user.
///
/// `updated_at` moves forward on every message exchange so listings can
/// order by recency.
#[derive(Debug, Clone)]
pub struct Conversation {
    pub id: ConversationId,
    pub owner_id: UserId,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    pub fn new(owner_id: UserId, title: String) -> Self {
        let now = Utc::now();
        Self {
            id: ConversationId::new(),
            owner_id,
            title,
            created_at: now,
            updated_at: now,
        }
    }
}
