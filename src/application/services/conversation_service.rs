use std::sync::Arc;

use crate::application::error::{ServiceError, ServiceResult};
use crate::application::ports::{
    ConversationPage, ConversationRepository, MessageRepository, SimilarityHit, VectorIndex,
};
use crate::application::services::access_gate::{ACCESS_DENIED_MESSAGE, AccessGate};
use crate::application::services::pagination;
use crate::domain::{Conversation, ConversationId, Message, UserId};

const COMPONENT: &str = "conversation_service";
const MAX_TITLE_CHARS: usize = 255;

/// A conversation together with its full message list, ascending by
/// creation time.
#[derive(Debug, Clone)]
pub struct ConversationWithMessages {
    pub conversation: Conversation,
    pub messages: Vec<Message>,
}

/// CRUD orchestration over conversations plus semantic-search delegation.
/// Every operation except `create` and `semantic_search` runs the access
/// gate first; what a failed gate looks like from the outside is decided
/// here, per operation.
pub struct ConversationService {
    access_gate: AccessGate,
    conversations: Arc<dyn ConversationRepository>,
    messages: Arc<dyn MessageRepository>,
    vector_index: Arc<dyn VectorIndex>,
}

impl ConversationService {
    pub fn new(
        access_gate: AccessGate,
        conversations: Arc<dyn ConversationRepository>,
        messages: Arc<dyn MessageRepository>,
        vector_index: Arc<dyn VectorIndex>,
    ) -> Self {
        Self {
            access_gate,
            conversations,
            messages,
            vector_index,
        }
    }

    pub async fn create(&self, owner_id: UserId, title: &str) -> ServiceResult<Conversation> {
        let title = validate_title(title)?;

        let conversation = Conversation::new(owner_id, title);
        self.conversations
            .create(&conversation)
            .await
            .map_err(|e| {
                ServiceError::internal(
                    "conversation_repository",
                    "Failed to create conversation",
                    e,
                )
            })?;

        Ok(conversation)
    }

    pub async fn list(
        &self,
        owner_id: UserId,
        page: Option<&str>,
        limit: Option<&str>,
    ) -> ServiceResult<ConversationPage> {
        let page_request = pagination::validate(page, limit)?;

        self.conversations
            .list_by_owner(owner_id, page_request.page, page_request.limit)
            .await
            .map_err(|e| {
                ServiceError::internal(
                    "conversation_repository",
                    "Failed to list conversations",
                    e,
                )
            })
    }

    /// Gate policy: a failed ownership check is `Unauthorized`. The caller
    /// already holds the id, so hiding existence buys nothing.
    pub async fn get_with_messages(
        &self,
        conversation_id: ConversationId,
        user_id: UserId,
    ) -> ServiceResult<ConversationWithMessages> {
        if !self
            .access_gate
            .verify_ownership(conversation_id, user_id)
            .await?
        {
            return Err(ServiceError::unauthorized(COMPONENT, ACCESS_DENIED_MESSAGE));
        }

        let conversation = self
            .conversations
            .find_by_id(conversation_id)
            .await
            .map_err(|e| {
                ServiceError::internal("conversation_repository", "Failed to load conversation", e)
            })?
            .ok_or_else(|| ServiceError::not_found(COMPONENT, "Conversation not found"))?;

        let messages = self
            .messages
            .list_by_conversation(conversation_id)
            .await
            .map_err(|e| {
                ServiceError::internal("message_repository", "Failed to load messages", e)
            })?;

        Ok(ConversationWithMessages {
            conversation,
            messages,
        })
    }

    /// Gate policy: a failed ownership check is `NotFound`, matching the
    /// 404 the update endpoint has always returned.
    pub async fn update_title(
        &self,
        conversation_id: ConversationId,
        user_id: UserId,
        title: &str,
    ) -> ServiceResult<Conversation> {
        let title = validate_title(title)?;

        if !self
            .access_gate
            .verify_ownership(conversation_id, user_id)
            .await?
        {
            return Err(ServiceError::not_found(COMPONENT, "Conversation not found"));
        }

        self.conversations
            .update_title(conversation_id, &title)
            .await
            .map_err(|e| {
                ServiceError::internal(
                    "conversation_repository",
                    "Failed to update conversation",
                    e,
                )
            })?
            .ok_or_else(|| ServiceError::not_found(COMPONENT, "Conversation not found"))
    }

    /// Deletes the conversation and everything hanging off it. The vector
    /// cleanup is awaited and sequenced before the row delete; unlike the
    /// send-path upserts it is a required step, so its failure aborts the
    /// delete and the conversation stays intact.
    pub async fn delete(
        &self,
        conversation_id: ConversationId,
        user_id: UserId,
    ) -> ServiceResult<()> {
        if !self
            .access_gate
            .verify_ownership(conversation_id, user_id)
            .await?
        {
            return Err(ServiceError::unauthorized(COMPONENT, ACCESS_DENIED_MESSAGE));
        }

        self.vector_index
            .delete_for_conversation(conversation_id)
            .await
            .map_err(|e| {
                ServiceError::internal(
                    "vector_index",
                    "Failed to remove conversation vector entries",
                    e,
                )
            })?;

        self.conversations
            .delete(conversation_id)
            .await
            .map_err(|e| {
                ServiceError::internal(
                    "conversation_repository",
                    "Failed to delete conversation",
                    e,
                )
            })
    }

    /// Pure delegation: the index owns relevance policy, this layer only
    /// converts its failures into the result contract.
    pub async fn semantic_search(
        &self,
        owner_id: UserId,
        query: &str,
        limit: usize,
        threshold: f32,
    ) -> ServiceResult<Vec<SimilarityHit>> {
        self.vector_index
            .similarity_search(query, owner_id, limit, threshold, None)
            .await
            .map_err(|e| ServiceError::internal("vector_index", "Semantic search failed", e))
    }
}

fn validate_title(title: &str) -> ServiceResult<String> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::validation(
            COMPONENT,
            "Title must not be empty",
        ));
    }
    if trimmed.chars().count() > MAX_TITLE_CHARS {
        return Err(ServiceError::validation(
            COMPONENT,
            "Title must be at most 255 characters",
        ));
    }
    Ok(trimmed.to_string())
}
