use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use colloquy::application::ErrorKind;
use colloquy::application::ports::{
    ConversationPage, ConversationRepository, Embedder, EmbedderError, MessageRepository,
    RepositoryError, VectorIndex,
};
use colloquy::application::services::{AccessGate, ConversationService, pagination};
use colloquy::domain::{Conversation, ConversationId, Embedding, Message, MessageRole, UserId};
use colloquy::infrastructure::persistence::{
    InMemoryConversationRepository, InMemoryMessageRepository,
};
use colloquy::infrastructure::vector::InMemoryVectorIndex;

struct StubEmbedder;

#[async_trait]
impl Embedder for StubEmbedder {
    async fn embed(&self, text: &str) -> Result<Embedding, EmbedderError> {
        // Cheap deterministic vector so equal texts score 1.0 together.
        let seed = text.len() as f32;
        Ok(Embedding::new(vec![1.0, seed, seed * 0.5, 1.0]))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>, EmbedderError> {
        let mut embeddings = Vec::new();
        for text in texts {
            embeddings.push(self.embed(text).await?);
        }
        Ok(embeddings)
    }
}

struct FailingConversationRepository;

#[async_trait]
impl ConversationRepository for FailingConversationRepository {
    async fn create(&self, _conversation: &Conversation) -> Result<(), RepositoryError> {
        Err(RepositoryError::QueryFailed("down".to_string()))
    }

    async fn find_by_id(
        &self,
        _id: ConversationId,
    ) -> Result<Option<Conversation>, RepositoryError> {
        Err(RepositoryError::QueryFailed("down".to_string()))
    }

    async fn list_by_owner(
        &self,
        _owner_id: UserId,
        _page: u32,
        _limit: u32,
    ) -> Result<ConversationPage, RepositoryError> {
        Err(RepositoryError::QueryFailed("down".to_string()))
    }

    async fn update_title(
        &self,
        _id: ConversationId,
        _title: &str,
    ) -> Result<Option<Conversation>, RepositoryError> {
        Err(RepositoryError::QueryFailed("down".to_string()))
    }

    async fn delete(&self, _id: ConversationId) -> Result<(), RepositoryError> {
        Err(RepositoryError::QueryFailed("down".to_string()))
    }

    async fn verify_ownership(
        &self,
        _id: ConversationId,
        _owner_id: UserId,
    ) -> Result<bool, RepositoryError> {
        Err(RepositoryError::ConnectionFailed("down".to_string()))
    }

    async fn touch_updated_at(
        &self,
        _id: ConversationId,
        _at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        Err(RepositoryError::QueryFailed("down".to_string()))
    }
}

struct Harness {
    conversations: Arc<InMemoryConversationRepository>,
    messages: Arc<InMemoryMessageRepository>,
    vector_index: Arc<InMemoryVectorIndex>,
    service: ConversationService,
}

fn build_harness() -> Harness {
    let messages = Arc::new(InMemoryMessageRepository::new());
    let conversations = Arc::new(InMemoryConversationRepository::new(messages.clone()));
    let vector_index = Arc::new(InMemoryVectorIndex::new(Arc::new(StubEmbedder)));

    let service = ConversationService::new(
        AccessGate::new(conversations.clone()),
        conversations.clone(),
        messages.clone(),
        vector_index.clone(),
    );

    Harness {
        conversations,
        messages,
        vector_index,
        service,
    }
}

mod pagination_validator {
    use super::*;

    #[test]
    fn valid_pairs_pass_through_unchanged() {
        for (page, limit) in [(1, 1), (1, 100), (7, 20), (999, 50)] {
            let result =
                pagination::validate(Some(&page.to_string()), Some(&limit.to_string())).unwrap();
            assert_eq!(result.page, page);
            assert_eq!(result.limit, limit);
        }
    }

    #[test]
    fn defaults_apply_when_absent() {
        let result = pagination::validate(None, None).unwrap();
        assert_eq!(result.page, 1);
        assert_eq!(result.limit, 20);

        let result = pagination::validate(Some("3"), None).unwrap();
        assert_eq!(result.page, 3);
        assert_eq!(result.limit, 20);
    }

    #[test]
    fn non_integer_page_reported_before_out_of_range_limit() {
        let error = pagination::validate(Some("abc"), Some("101")).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Validation);
        assert!(error.message().contains("page must be an integer"));
    }

    #[test]
    fn out_of_range_values_are_rejected_not_corrected() {
        for (page, limit, expected) in [
            ("0", "20", "page must be greater than or equal to 1"),
            ("-1", "20", "page must be greater than or equal to 1"),
            ("1", "0", "limit must be between 1 and 100"),
            ("1", "101", "limit must be between 1 and 100"),
        ] {
            let error = pagination::validate(Some(page), Some(limit)).unwrap_err();
            assert_eq!(error.kind(), ErrorKind::Validation);
            assert_eq!(error.message(), expected);
        }
    }

    #[test]
    fn non_integer_limit_is_rejected() {
        let error = pagination::validate(Some("1"), Some("5.5")).unwrap_err();
        assert!(error.message().contains("limit must be an integer"));
    }
}

mod access_gate {
    use super::*;

    #[tokio::test]
    async fn absent_conversation_is_false_not_an_error() {
        let messages = Arc::new(InMemoryMessageRepository::new());
        let conversations = Arc::new(InMemoryConversationRepository::new(messages));
        let gate = AccessGate::new(conversations);

        let owned = gate
            .verify_ownership(ConversationId::new(), UserId::new())
            .await
            .unwrap();
        assert!(!owned);
    }

    #[tokio::test]
    async fn mismatched_owner_is_false() {
        let messages = Arc::new(InMemoryMessageRepository::new());
        let conversations = Arc::new(InMemoryConversationRepository::new(messages));
        let owner = UserId::new();
        let conversation = Conversation::new(owner, "Chat".to_string());
        conversations.create(&conversation).await.unwrap();

        let gate = AccessGate::new(conversations);
        assert!(!gate
            .verify_ownership(conversation.id, UserId::new())
            .await
            .unwrap());
        assert!(gate.verify_ownership(conversation.id, owner).await.unwrap());
    }

    #[tokio::test]
    async fn failed_lookup_is_internal() {
        let gate = AccessGate::new(Arc::new(FailingConversationRepository));

        let error = gate
            .verify_ownership(ConversationId::new(), UserId::new())
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Internal);
    }
}

#[tokio::test]
async fn given_valid_title_when_creating_then_conversation_is_persisted_trimmed() {
    let harness = build_harness();
    let owner = UserId::new();

    let conversation = harness.service.create(owner, "  My chat  ").await.unwrap();
    assert_eq!(conversation.title, "My chat");
    assert_eq!(conversation.owner_id, owner);

    let stored = harness
        .conversations
        .find_by_id(conversation.id)
        .await
        .unwrap();
    assert!(stored.is_some());
}

#[tokio::test]
async fn given_invalid_title_when_creating_then_validation_error() {
    let harness = build_harness();
    let owner = UserId::new();

    for title in ["", "   ", &"x".repeat(256)] {
        let error = harness.service.create(owner, title).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Validation);
    }

    assert!(harness.service.create(owner, &"x".repeat(255)).await.is_ok());
}

#[tokio::test]
async fn given_out_of_range_pagination_when_listing_then_validation_error() {
    let harness = build_harness();

    let error = harness
        .service
        .list(UserId::new(), Some("0"), Some("101"))
        .await
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn given_conversations_when_listing_then_only_the_owners_page_comes_back() {
    let harness = build_harness();
    let owner = UserId::new();
    let other = UserId::new();

    for i in 0..3 {
        harness.service.create(owner, &format!("Chat {i}")).await.unwrap();
    }
    harness.service.create(other, "Not yours").await.unwrap();

    let page = harness.service.list(owner, Some("1"), Some("2")).await.unwrap();
    assert_eq!(page.total, 3);
    assert_eq!(page.conversations.len(), 2);
    assert!(page.conversations.iter().all(|c| c.owner_id == owner));
}

#[tokio::test]
async fn given_non_owner_when_getting_with_messages_then_unauthorized() {
    let harness = build_harness();
    let owner = UserId::new();
    let conversation = harness.service.create(owner, "Chat").await.unwrap();

    let error = harness
        .service
        .get_with_messages(conversation.id, UserId::new())
        .await
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Unauthorized);
}

#[tokio::test]
async fn given_owner_when_getting_with_messages_then_messages_come_back_in_order() {
    let harness = build_harness();
    let owner = UserId::new();
    let conversation = harness.service.create(owner, "Chat").await.unwrap();

    let first = Message::new(conversation.id, MessageRole::User, "one".to_string());
    let second = Message::new(conversation.id, MessageRole::Assistant, "two".to_string());
    harness.messages.create(&first).await.unwrap();
    harness.messages.create(&second).await.unwrap();

    let result = harness
        .service
        .get_with_messages(conversation.id, owner)
        .await
        .unwrap();
    assert_eq!(result.conversation.id, conversation.id);
    assert_eq!(result.messages.len(), 2);
    assert_eq!(result.messages[0].content, "one");
    assert_eq!(result.messages[1].content, "two");
}

#[tokio::test]
async fn given_non_owner_when_updating_title_then_not_found() {
    let harness = build_harness();
    let owner = UserId::new();
    let conversation = harness.service.create(owner, "Chat").await.unwrap();

    let error = harness
        .service
        .update_title(conversation.id, UserId::new(), "New title")
        .await
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn given_owner_when_updating_title_then_title_changes() {
    let harness = build_harness();
    let owner = UserId::new();
    let conversation = harness.service.create(owner, "Chat").await.unwrap();

    let updated = harness
        .service
        .update_title(conversation.id, owner, "  Renamed  ")
        .await
        .unwrap();
    assert_eq!(updated.title, "Renamed");
}

#[tokio::test]
async fn given_owner_when_deleting_then_conversation_messages_and_vector_entries_are_gone() {
    let harness = build_harness();
    let owner = UserId::new();
    let conversation = harness.service.create(owner, "Chat").await.unwrap();

    let message = Message::new(conversation.id, MessageRole::User, "hello".to_string());
    harness.messages.create(&message).await.unwrap();
    harness
        .vector_index
        .upsert_for_message(owner, &message)
        .await
        .unwrap();
    assert_eq!(harness.vector_index.entry_count().await, 1);

    harness.service.delete(conversation.id, owner).await.unwrap();

    assert!(harness
        .conversations
        .find_by_id(conversation.id)
        .await
        .unwrap()
        .is_none());
    // Messages cascade with the conversation row.
    assert!(harness
        .messages
        .list_by_conversation(conversation.id)
        .await
        .unwrap()
        .is_empty());
    assert_eq!(harness.vector_index.entry_count().await, 0);
}

#[tokio::test]
async fn given_non_owner_when_deleting_then_unauthorized_and_nothing_is_removed() {
    let harness = build_harness();
    let owner = UserId::new();
    let conversation = harness.service.create(owner, "Chat").await.unwrap();

    let error = harness
        .service
        .delete(conversation.id, UserId::new())
        .await
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Unauthorized);

    assert!(harness
        .conversations
        .find_by_id(conversation.id)
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn given_failing_vector_cleanup_when_deleting_then_conversation_survives() {
    struct FailingDeleteIndex;

    #[async_trait]
    impl VectorIndex for FailingDeleteIndex {
        async fn ensure_collection(&self) -> Result<bool, colloquy::application::ports::VectorIndexError> {
            Ok(false)
        }

        async fn upsert_for_message(
            &self,
            _owner_id: UserId,
            _message: &Message,
        ) -> Result<colloquy::domain::VectorEntryId, colloquy::application::ports::VectorIndexError>
        {
            Ok(colloquy::domain::VectorEntryId::new())
        }

        async fn delete_for_message(
            &self,
            _message_id: colloquy::domain::MessageId,
        ) -> Result<(), colloquy::application::ports::VectorIndexError> {
            Ok(())
        }

        async fn delete_for_conversation(
            &self,
            _conversation_id: ConversationId,
        ) -> Result<(), colloquy::application::ports::VectorIndexError> {
            Err(colloquy::application::ports::VectorIndexError::DeleteFailed(
                "down".to_string(),
            ))
        }

        async fn similarity_search(
            &self,
            _query: &str,
            _owner_id: UserId,
            _limit: usize,
            _threshold: f32,
            _conversation_id: Option<ConversationId>,
        ) -> Result<
            Vec<colloquy::application::ports::SimilarityHit>,
            colloquy::application::ports::VectorIndexError,
        > {
            Ok(vec![])
        }
    }

    let messages = Arc::new(InMemoryMessageRepository::new());
    let conversations = Arc::new(InMemoryConversationRepository::new(messages.clone()));
    let service = ConversationService::new(
        AccessGate::new(conversations.clone()),
        conversations.clone(),
        messages,
        Arc::new(FailingDeleteIndex),
    );

    let owner = UserId::new();
    let conversation = service.create(owner, "Chat").await.unwrap();

    let error = service.delete(conversation.id, owner).await.unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Internal);

    // Cleanup is sequenced before the row delete, so the row is intact.
    assert!(conversations
        .find_by_id(conversation.id)
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn given_indexed_messages_when_searching_then_only_the_owners_hits_come_back() {
    let harness = build_harness();
    let owner = UserId::new();
    let other = UserId::new();
    let conversation = harness.service.create(owner, "Chat").await.unwrap();

    let mine = Message::new(conversation.id, MessageRole::User, "rust is fun".to_string());
    let theirs = Message::new(ConversationId::new(), MessageRole::User, "rust is fun".to_string());
    harness.vector_index.upsert_for_message(owner, &mine).await.unwrap();
    harness.vector_index.upsert_for_message(other, &theirs).await.unwrap();

    let hits = harness
        .service
        .semantic_search(owner, "rust is fun", 10, 0.5)
        .await
        .unwrap();

    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].message_id, Some(mine.id));
    assert!(hits[0].score > 0.99);
}
