use crate::domain::{ChatTurn, ConversationId, Message, MessageId, VectorEntryId};
use async_trait::async_trait;

use super::RepositoryError;

#[async_trait]
pub trait MessageRepository: Send + Sync {
    async fn create(&self, message: &Message) -> Result<(), RepositoryError>;

    /// Replaces the content of an existing message, returning the updated
    /// row. Last write wins; repeating the same write is a no-op.
    async fn update_content(
        &self,
        id: MessageId,
        content: &str,
    ) -> Result<Message, RepositoryError>;

    /// Records which vector entry indexes this message.
    async fn set_embedding_ref(
        &self,
        id: MessageId,
        entry_id: VectorEntryId,
    ) -> Result<(), RepositoryError>;

    async fn delete(&self, id: MessageId) -> Result<(), RepositoryError>;

    /// All messages of a conversation, ascending by creation time.
    async fn list_by_conversation(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Vec<Message>, RepositoryError>;

    /// The `{role, content}` projection fed to the generation provider,
    /// ascending by creation time and stripped of storage metadata.
    async fn history(&self, conversation_id: ConversationId)
    -> Result<Vec<ChatTurn>, RepositoryError>;
}
