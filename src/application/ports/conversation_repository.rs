use crate::domain::{Conversation, ConversationId, UserId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::RepositoryError;

/// One page of a conversation listing, newest activity first.
#[derive(Debug, Clone)]
pub struct ConversationPage {
    pub conversations: Vec<Conversation>,
    pub page: u32,
    pub limit: u32,
    pub total: u64,
}

#[async_trait]
pub trait ConversationRepository: Send + Sync {
    async fn create(&self, conversation: &Conversation) -> Result<(), RepositoryError>;

    /// Read misses are `Ok(None)`, never an error.
    async fn find_by_id(&self, id: ConversationId)
    -> Result<Option<Conversation>, RepositoryError>;

    async fn list_by_owner(
        &self,
        owner_id: UserId,
        page: u32,
        limit: u32,
    ) -> Result<ConversationPage, RepositoryError>;

    async fn update_title(
        &self,
        id: ConversationId,
        title: &str,
    ) -> Result<Option<Conversation>, RepositoryError>;

    /// Removes the conversation; messages cascade with it.
    async fn delete(&self, id: ConversationId) -> Result<(), RepositoryError>;

    /// `Ok(false)` covers both "no such conversation" and "different owner";
    /// only a failed lookup is an error.
    async fn verify_ownership(
        &self,
        id: ConversationId,
        owner_id: UserId,
    ) -> Result<bool, RepositoryError>;

    async fn touch_updated_at(
        &self,
        id: ConversationId,
        at: DateTime<Utc>,
    ) -> Result<(), RepositoryError>;
}
