use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::application::ports::{
    Embedder, SimilarityHit, VectorIndex, VectorIndexError,
};
use crate::domain::{ConversationId, Message, MessageId, UserId, VectorEntry, VectorEntryId};

/// In-memory vector index with real cosine scoring. Pairs with a cheap
/// embedder for local runs and tests; behavior mirrors the Qdrant adapter.
pub struct InMemoryVectorIndex {
    embedder: Arc<dyn Embedder>,
    entries: RwLock<HashMap<Uuid, VectorEntry>>,
}

impl InMemoryVectorIndex {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            embedder,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub async fn entry_count(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[async_trait]
impl VectorIndex for InMemoryVectorIndex {
    async fn ensure_collection(&self) -> Result<bool, VectorIndexError> {
        Ok(false)
    }

    async fn upsert_for_message(
        &self,
        owner_id: UserId,
        message: &Message,
    ) -> Result<VectorEntryId, VectorIndexError> {
        let embedding = self
            .embedder
            .embed(&message.content)
            .await
            .map_err(|e| VectorIndexError::EmbeddingFailed(e.to_string()))?;

        let entry = VectorEntry::for_message(
            owner_id,
            message.conversation_id,
            message.id,
            message.content.clone(),
            embedding,
        );
        let entry_id = entry.id;

        let mut entries = self.entries.write().await;
        entries.insert(entry_id.as_uuid(), entry);

        Ok(entry_id)
    }

    async fn delete_for_message(&self, message_id: MessageId) -> Result<(), VectorIndexError> {
        let mut entries = self.entries.write().await;
        entries.retain(|_, e| e.message_id != Some(message_id));
        Ok(())
    }

    async fn delete_for_conversation(
        &self,
        conversation_id: ConversationId,
    ) -> Result<(), VectorIndexError> {
        let mut entries = self.entries.write().await;
        entries.retain(|_, e| e.conversation_id != Some(conversation_id));
        Ok(())
    }

    async fn similarity_search(
        &self,
        query: &str,
        owner_id: UserId,
        limit: usize,
        threshold: f32,
        conversation_id: Option<ConversationId>,
    ) -> Result<Vec<SimilarityHit>, VectorIndexError> {
        let query_embedding = self
            .embedder
            .embed(query)
            .await
            .map_err(|e| VectorIndexError::EmbeddingFailed(e.to_string()))?;

        let entries = self.entries.read().await;
        let mut hits: Vec<SimilarityHit> = entries
            .values()
            .filter(|e| e.owner_id == owner_id)
            .filter(|e| conversation_id.is_none() || e.conversation_id == conversation_id)
            .map(|e| SimilarityHit {
                entry_id: e.id,
                conversation_id: e.conversation_id,
                message_id: e.message_id,
                content: e.content.clone(),
                score: e.embedding.cosine_similarity(&query_embedding),
            })
            .filter(|hit| hit.score >= threshold)
            .collect();

        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(limit);

        Ok(hits)
    }
}
