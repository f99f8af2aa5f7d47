use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::application::ports::{
    ConversationPage, ConversationRepository, MessageRepository, RepositoryError,
};
use crate::domain::{ChatTurn, Conversation, ConversationId, Message, MessageId, UserId, VectorEntryId};

/// Stateful in-memory conversation store. Backs local runs without a
/// database and the service-level tests. Pairs with a message store so
/// deletes cascade the way the relational foreign key does.
pub struct InMemoryConversationRepository {
    conversations: RwLock<HashMap<Uuid, Conversation>>,
    messages: Arc<InMemoryMessageRepository>,
}

impl InMemoryConversationRepository {
    pub fn new(messages: Arc<InMemoryMessageRepository>) -> Self {
        Self {
            conversations: RwLock::new(HashMap::new()),
            messages,
        }
    }
}

#[async_trait]
impl ConversationRepository for InMemoryConversationRepository {
    async fn create(&self, conversation: &Conversation) -> Result<(), RepositoryError> {
        let mut conversations = self.conversations.write().await;
        conversations.insert(conversation.id.as_uuid(), conversation.clone());
        Ok(())
    }

    async fn find_by_id(
        &self,
        id: ConversationId,
    ) -> Result<Option<Conversation>, RepositoryError> {
        let conversations = self.conversations.read().await;
        Ok(conversations.get(&id.as_uuid()).cloned())
    }

    async fn list_by_owner(
        &self,
        owner_id: UserId,
        page: u32,
        limit: u32,
    ) -> Result<ConversationPage, RepositoryError> {
        let conversations = self.conversations.read().await;
        let mut owned: Vec<Conversation> = conversations
            .values()
            .filter(|c| c.owner_id == owner_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));

        let total = owned.len() as u64;
        let offset = (page as usize - 1) * limit as usize;
        let conversations = owned
            .into_iter()
            .skip(offset)
            .take(limit as usize)
            .collect();

        Ok(ConversationPage {
            conversations,
            page,
            limit,
            total,
        })
    }

    async fn update_title(
        &self,
        id: ConversationId,
        title: &str,
    ) -> Result<Option<Conversation>, RepositoryError> {
        let mut conversations = self.conversations.write().await;
        Ok(conversations.get_mut(&id.as_uuid()).map(|c| {
            c.title = title.to_string();
            c.updated_at = Utc::now();
            c.clone()
        }))
    }

    async fn delete(&self, id: ConversationId) -> Result<(), RepositoryError> {
        let mut conversations = self.conversations.write().await;
        conversations.remove(&id.as_uuid());

        // Cascade, matching ON DELETE CASCADE on the messages table.
        let mut messages = self.messages.messages.write().await;
        messages.retain(|m| m.conversation_id != id);

        Ok(())
    }

    async fn verify_ownership(
        &self,
        id: ConversationId,
        owner_id: UserId,
    ) -> Result<bool, RepositoryError> {
        let conversations = self.conversations.read().await;
        Ok(conversations
            .get(&id.as_uuid())
            .is_some_and(|c| c.owner_id == owner_id))
    }

    async fn touch_updated_at(
        &self,
        id: ConversationId,
        at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let mut conversations = self.conversations.write().await;
        if let Some(c) = conversations.get_mut(&id.as_uuid()) {
            c.updated_at = at;
        }
        Ok(())
    }
}

/// In-memory message store. Keeps insertion order so histories stay
/// stable even when timestamps collide within one test run.
#[derive(Default)]
pub struct InMemoryMessageRepository {
    messages: RwLock<Vec<Message>>,
}

impl InMemoryMessageRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessageRepository for InMemoryMessageRepository {
    async fn create(&self, message: &Message) -> Result<(), RepositoryError> {
        let mut messages = self.messages.write().await;
        messages.push(message.clone());
        Ok(())
    }

    async fn update_content(&self, id: MessageId, content: &str) -> Result<Message, RepositoryError> {
        let mut messages = self.messages.write().await;
        messages
            .iter_mut()
            .find(|m| m.id == id)
            .map(|m| {
                m.content = content.to_string();
                m.clone()
            })
            .ok_or_else(|| RepositoryError::NotFound(format!("message {}", id.as_uuid())))
    }

    async fn set_embedding_ref(
        &self,
        id: MessageId,
        entry_id: VectorEntryId,
    ) -> Result<(), RepositoryError> {
        let mut messages = self.messages.write().await;
        if let Some(m) = messages.iter_mut().find(|m| m.id == id) {
            m.embedding_ref = Some(entry_id);
        }
        Ok(())
    }

    async fn delete(&self, id: MessageId) -> Result<(), RepositoryError> {
        let mut messages = self.messages.write().await;
        messages.retain(|m| m.id != id);
        Ok(())
    }

    async fn list_by_conversation(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Vec<Message>, RepositoryError> {
        let messages = self.messages.read().await;
        Ok(messages
            .iter()
            .filter(|m| m.conversation_id == conversation_id)
            .cloned()
            .collect())
    }

    async fn history(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Vec<ChatTurn>, RepositoryError> {
        let messages = self.messages.read().await;
        Ok(messages
            .iter()
            .filter(|m| m.conversation_id == conversation_id)
            .map(|m| ChatTurn {
                role: m.role,
                content: m.content.clone(),
            })
            .collect())
    }
}
