use std::sync::Arc;

use crate::application::error::{ServiceError, ServiceResult};
use crate::application::ports::ConversationRepository;
use crate::domain::{ConversationId, UserId};

/// Denial message shared by every operation that hides a conversation
/// behind an ownership check.
pub const ACCESS_DENIED_MESSAGE: &str = "User does not have access to this chat";

/// Ownership check in front of every conversation-reading or -mutating
/// operation. The gate only answers yes or no; what a "no" looks like to
/// the outside (not-found vs unauthorized) is the calling service's policy.
#[derive(Clone)]
pub struct AccessGate {
    conversations: Arc<dyn ConversationRepository>,
}

impl AccessGate {
    pub fn new(conversations: Arc<dyn ConversationRepository>) -> Self {
        Self { conversations }
    }

    /// `Ok(false)` for a missing conversation as well as a mismatched
    /// owner; an error only when the lookup itself fails.
    pub async fn verify_ownership(
        &self,
        conversation_id: ConversationId,
        user_id: UserId,
    ) -> ServiceResult<bool> {
        self.conversations
            .verify_ownership(conversation_id, user_id)
            .await
            .map_err(|e| {
                ServiceError::internal(
                    "conversation_repository",
                    "Failed to verify conversation ownership",
                    e,
                )
            })
    }
}
