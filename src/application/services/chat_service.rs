use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::Utc;

use crate::application::error::{ServiceError, ServiceResult};
use crate::application::ports::{
    ConversationRepository, GenerationProvider, GenerationStream, MessageRepository,
    RepositoryError, VectorIndex,
};
use crate::application::services::access_gate::{ACCESS_DENIED_MESSAGE, AccessGate};
use crate::domain::{ConversationId, Message, MessageId, MessageRole, UserId};

const COMPONENT: &str = "chat_service";
const MAX_CONTENT_CHARS: usize = 10_000;

/// Outcome of a synchronous send: both halves of the exchange, persisted.
#[derive(Debug, Clone)]
pub struct MessageExchange {
    pub user_message: Message,
    pub assistant_message: Message,
}

/// Outcome of a streaming send. `fragments` is handed to the caller
/// unconsumed; whoever drains it owes a call to
/// [`ChatService::update_message_content`] with the accumulated text on
/// every exit path, including abandonment.
pub struct StreamingExchange {
    pub user_message: Message,
    pub assistant_message_id: MessageId,
    pub fragments: GenerationStream,
}

impl fmt::Debug for StreamingExchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamingExchange")
            .field("user_message", &self.user_message)
            .field("assistant_message_id", &self.assistant_message_id)
            .finish_non_exhaustive()
    }
}

/// The message orchestrator: sequences authorization, persistence,
/// generation and indexing for one chat exchange. Required steps abort the
/// pipeline with the first error; vector-index writes are detached and
/// only ever visible in logs.
pub struct ChatService {
    access_gate: AccessGate,
    conversations: Arc<dyn ConversationRepository>,
    messages: Arc<dyn MessageRepository>,
    vector_index: Arc<dyn VectorIndex>,
    provider: Arc<dyn GenerationProvider>,
}

impl ChatService {
    pub fn new(
        access_gate: AccessGate,
        conversations: Arc<dyn ConversationRepository>,
        messages: Arc<dyn MessageRepository>,
        vector_index: Arc<dyn VectorIndex>,
        provider: Arc<dyn GenerationProvider>,
    ) -> Self {
        Self {
            access_gate,
            conversations,
            messages,
            vector_index,
            provider,
        }
    }

    /// One-shot exchange. The user message is durably persisted before the
    /// provider sees the history, and the history it sees includes that
    /// message; no reordering.
    pub async fn send_message(
        &self,
        conversation_id: ConversationId,
        user_id: UserId,
        content: &str,
        role: &str,
    ) -> ServiceResult<MessageExchange> {
        let role = validate_message(content, role)?;

        if !self
            .access_gate
            .verify_ownership(conversation_id, user_id)
            .await?
        {
            return Err(ServiceError::unauthorized(COMPONENT, ACCESS_DENIED_MESSAGE));
        }

        let user_message = Message::new(conversation_id, role, content.to_string());
        self.messages.create(&user_message).await.map_err(|e| {
            ServiceError::internal("message_repository", "Failed to persist user message", e)
        })?;

        self.spawn_index(user_id, user_message.clone());

        let history = self.messages.history(conversation_id).await.map_err(|e| {
            ServiceError::internal("message_repository", "Failed to load chat history", e)
        })?;

        let reply = self.provider.generate(&history).await.map_err(|e| {
            ServiceError::internal("generation_provider", "Failed to generate a reply", e)
        })?;

        let assistant_message = Message::new(conversation_id, MessageRole::Assistant, reply);
        self.messages.create(&assistant_message).await.map_err(|e| {
            ServiceError::internal(
                "message_repository",
                "Failed to persist assistant message",
                e,
            )
        })?;

        self.spawn_index(user_id, assistant_message.clone());

        self.touch_conversation(conversation_id).await?;

        Ok(MessageExchange {
            user_message,
            assistant_message,
        })
    }

    /// Streaming exchange. The assistant reply starts life as a persisted
    /// placeholder with empty content; the caller streams the fragments to
    /// its destination and finalizes the placeholder afterwards. Transport
    /// and persistence stay in separate failure domains: nothing here
    /// consumes the stream, and a dropped consumer cannot undo the
    /// placeholder.
    pub async fn send_message_streaming(
        &self,
        conversation_id: ConversationId,
        user_id: UserId,
        content: &str,
        role: &str,
    ) -> ServiceResult<StreamingExchange> {
        let role = validate_message(content, role)?;

        if !self
            .access_gate
            .verify_ownership(conversation_id, user_id)
            .await?
        {
            return Err(ServiceError::unauthorized(COMPONENT, ACCESS_DENIED_MESSAGE));
        }

        let user_message = Message::new(conversation_id, role, content.to_string());
        self.messages.create(&user_message).await.map_err(|e| {
            ServiceError::internal("message_repository", "Failed to persist user message", e)
        })?;

        self.spawn_index(user_id, user_message.clone());

        // Read the history before the placeholder exists so the provider
        // never sees an empty assistant turn.
        let history = self.messages.history(conversation_id).await.map_err(|e| {
            ServiceError::internal("message_repository", "Failed to load chat history", e)
        })?;

        let placeholder = Message::placeholder(conversation_id);
        self.messages.create(&placeholder).await.map_err(|e| {
            ServiceError::internal(
                "message_repository",
                "Failed to persist assistant placeholder",
                e,
            )
        })?;

        let fragments = match self.provider.generate_stream(&history).await {
            Ok(stream) => stream,
            Err(e) => {
                // The exchange never started; do not leave the placeholder
                // behind.
                if let Err(delete_err) = self.messages.delete(placeholder.id).await {
                    tracing::warn!(
                        message_id = %placeholder.id.as_uuid(),
                        error = %delete_err,
                        "Failed to remove placeholder after generation start failure"
                    );
                }
                return Err(ServiceError::internal(
                    "generation_provider",
                    "Failed to start reply generation",
                    e,
                ));
            }
        };

        Ok(StreamingExchange {
            user_message,
            assistant_message_id: placeholder.id,
            fragments,
        })
    }

    /// Phase two of the streaming exchange: fills the placeholder with the
    /// accumulated text. Last write wins, so retries and duplicate calls
    /// converge on the same stored content. Also touches the conversation,
    /// closing out the exchange the same way the one-shot path does.
    pub async fn update_message_content(
        &self,
        message_id: MessageId,
        content: &str,
    ) -> ServiceResult<Message> {
        let message = self
            .messages
            .update_content(message_id, content)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound(_) => {
                    ServiceError::not_found(COMPONENT, "Message not found")
                }
                other => ServiceError::internal(
                    "message_repository",
                    "Failed to update message content",
                    other,
                ),
            })?;

        if !message.content.is_empty() {
            self.spawn_index_resolving_owner(message.clone());
        }

        self.touch_conversation(message.conversation_id).await?;

        Ok(message)
    }

    async fn touch_conversation(&self, conversation_id: ConversationId) -> ServiceResult<()> {
        self.conversations
            .touch_updated_at(conversation_id, Utc::now())
            .await
            .map_err(|e| {
                ServiceError::internal(
                    "conversation_repository",
                    "Failed to update conversation timestamp",
                    e,
                )
            })
    }

    /// Best-effort, fire-and-forget vector indexing, detached from the
    /// request: the task may finish after the pipeline has returned and its
    /// failures are logged, never propagated.
    fn spawn_index(&self, owner_id: UserId, message: Message) {
        if message.content.is_empty() {
            tracing::debug!(
                message_id = %message.id.as_uuid(),
                "Skipping vector indexing of empty message content"
            );
            return;
        }
        let vector_index = Arc::clone(&self.vector_index);
        let messages = Arc::clone(&self.messages);
        tokio::spawn(async move {
            index_message(vector_index, messages, owner_id, message).await;
        });
    }

    /// Same as [`Self::spawn_index`] for the finalize path, where the
    /// caller identifies the message but not the owner; the owning
    /// conversation is resolved inside the detached task.
    fn spawn_index_resolving_owner(&self, message: Message) {
        let conversations = Arc::clone(&self.conversations);
        let vector_index = Arc::clone(&self.vector_index);
        let messages = Arc::clone(&self.messages);
        tokio::spawn(async move {
            let owner_id = match conversations.find_by_id(message.conversation_id).await {
                Ok(Some(conversation)) => conversation.owner_id,
                Ok(None) => {
                    tracing::warn!(
                        conversation_id = %message.conversation_id.as_uuid(),
                        "Conversation vanished before indexing; skipping"
                    );
                    return;
                }
                Err(e) => {
                    tracing::warn!(
                        conversation_id = %message.conversation_id.as_uuid(),
                        error = %e,
                        "Owner lookup for indexing failed; message remains unindexed"
                    );
                    return;
                }
            };
            index_message(vector_index, messages, owner_id, message).await;
        });
    }
}

async fn index_message(
    vector_index: Arc<dyn VectorIndex>,
    messages: Arc<dyn MessageRepository>,
    owner_id: UserId,
    message: Message,
) {
    match vector_index.upsert_for_message(owner_id, &message).await {
        Ok(entry_id) => {
            if let Err(e) = messages.set_embedding_ref(message.id, entry_id).await {
                tracing::warn!(
                    message_id = %message.id.as_uuid(),
                    error = %e,
                    "Failed to record embedding reference"
                );
            }
        }
        Err(e) => {
            tracing::warn!(
                message_id = %message.id.as_uuid(),
                error = %e,
                "Vector indexing failed; message remains unindexed"
            );
        }
    }
}

fn validate_message(content: &str, role: &str) -> ServiceResult<MessageRole> {
    if content.trim().is_empty() {
        return Err(ServiceError::validation(
            COMPONENT,
            "Message content must not be empty",
        ));
    }
    if content.chars().count() > MAX_CONTENT_CHARS {
        return Err(ServiceError::validation(
            COMPONENT,
            "Message content must be at most 10000 characters",
        ));
    }
    MessageRole::from_str(role).map_err(|e| ServiceError::validation(COMPONENT, e))
}
