use async_trait::async_trait;

use super::VectorIndexError;
use crate::domain::{ConversationId, Message, MessageId, UserId, VectorEntryId};

/// One semantic-search match. Scores are cosine similarity in `[0, 1]`.
#[derive(Debug, Clone)]
pub struct SimilarityHit {
    pub entry_id: VectorEntryId,
    pub conversation_id: Option<ConversationId>,
    pub message_id: Option<MessageId>,
    pub content: String,
    pub score: f32,
}

/// Embedding store keyed by message and conversation. Embedding happens
/// inside the implementation; callers hand over text and never see vectors
/// or their dimensionality.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Creates the backing collection and its payload indexes if missing.
    /// Returns `true` when the collection was created by this call.
    async fn ensure_collection(&self) -> Result<bool, VectorIndexError>;

    async fn upsert_for_message(
        &self,
        owner_id: UserId,
        message: &Message,
    ) -> Result<VectorEntryId, VectorIndexError>;

    async fn delete_for_message(&self, message_id: MessageId) -> Result<(), VectorIndexError>;

    async fn delete_for_conversation(
        &self,
        conversation_id: ConversationId,
    ) -> Result<(), VectorIndexError>;

    /// Owner-scoped search, optionally narrowed to one conversation. Hits
    /// below `threshold` are dropped.
    async fn similarity_search(
        &self,
        query: &str,
        owner_id: UserId,
        limit: usize,
        threshold: f32,
        conversation_id: Option<ConversationId>,
    ) -> Result<Vec<SimilarityHit>, VectorIndexError>;
}
