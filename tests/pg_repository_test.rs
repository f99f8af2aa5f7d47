mod helpers;

use chrono::{Duration, Utc};
use serde_json::json;

use colloquy::application::ports::{
    ConversationRepository, MessageRepository, RepositoryError,
};
use colloquy::domain::{Conversation, Message, MessageRole, UserId, VectorEntryId};
use helpers::test_postgres::TestPostgres;

#[tokio::test]
#[ignore = "requires Docker"]
async fn given_conversation_when_created_then_round_trips_through_postgres() {
    let pg = TestPostgres::new().await;
    let owner = UserId::new();
    let conversation = Conversation::new(owner, "Weekend plans".to_string());

    pg.conversation_repository.create(&conversation).await.unwrap();

    let loaded = pg
        .conversation_repository
        .find_by_id(conversation.id)
        .await
        .unwrap()
        .expect("conversation should exist");
    assert_eq!(loaded.id, conversation.id);
    assert_eq!(loaded.owner_id, owner);
    assert_eq!(loaded.title, "Weekend plans");

    assert!(pg
        .conversation_repository
        .verify_ownership(conversation.id, owner)
        .await
        .unwrap());
    assert!(!pg
        .conversation_repository
        .verify_ownership(conversation.id, UserId::new())
        .await
        .unwrap());
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn given_many_conversations_when_listing_then_pages_order_by_recency() {
    let pg = TestPostgres::new().await;
    let owner = UserId::new();

    let mut oldest = Conversation::new(owner, "Oldest".to_string());
    oldest.updated_at = Utc::now() - Duration::hours(2);
    let mut middle = Conversation::new(owner, "Middle".to_string());
    middle.updated_at = Utc::now() - Duration::hours(1);
    let newest = Conversation::new(owner, "Newest".to_string());

    for conversation in [&oldest, &middle, &newest] {
        pg.conversation_repository.create(conversation).await.unwrap();
    }
    pg.conversation_repository
        .create(&Conversation::new(UserId::new(), "Someone else".to_string()))
        .await
        .unwrap();

    let page = pg
        .conversation_repository
        .list_by_owner(owner, 1, 2)
        .await
        .unwrap();
    assert_eq!(page.total, 3);
    assert_eq!(page.conversations.len(), 2);
    assert_eq!(page.conversations[0].title, "Newest");
    assert_eq!(page.conversations[1].title, "Middle");

    let page = pg
        .conversation_repository
        .list_by_owner(owner, 2, 2)
        .await
        .unwrap();
    assert_eq!(page.conversations.len(), 1);
    assert_eq!(page.conversations[0].title, "Oldest");
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn given_conversation_when_title_updated_then_updated_at_moves_forward() {
    let pg = TestPostgres::new().await;
    let conversation = Conversation::new(UserId::new(), "Before".to_string());
    pg.conversation_repository.create(&conversation).await.unwrap();

    let updated = pg
        .conversation_repository
        .update_title(conversation.id, "After")
        .await
        .unwrap()
        .expect("conversation should exist");
    assert_eq!(updated.title, "After");
    assert!(updated.updated_at >= conversation.updated_at);

    let missing = pg
        .conversation_repository
        .update_title(colloquy::domain::ConversationId::new(), "Nope")
        .await
        .unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn given_touch_when_applied_then_timestamp_is_stored() {
    let pg = TestPostgres::new().await;
    let conversation = Conversation::new(UserId::new(), "Chat".to_string());
    pg.conversation_repository.create(&conversation).await.unwrap();

    let later = Utc::now() + Duration::minutes(5);
    pg.conversation_repository
        .touch_updated_at(conversation.id, later)
        .await
        .unwrap();

    let loaded = pg
        .conversation_repository
        .find_by_id(conversation.id)
        .await
        .unwrap()
        .unwrap();
    assert!((loaded.updated_at - later).num_seconds().abs() < 1);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn given_messages_when_conversation_deleted_then_cascade_removes_them() {
    let pg = TestPostgres::new().await;
    let conversation = Conversation::new(UserId::new(), "Chat".to_string());
    pg.conversation_repository.create(&conversation).await.unwrap();

    let message = Message::new(conversation.id, MessageRole::User, "hello".to_string());
    pg.message_repository.create(&message).await.unwrap();

    pg.conversation_repository.delete(conversation.id).await.unwrap();

    let remaining = pg
        .message_repository
        .list_by_conversation(conversation.id)
        .await
        .unwrap();
    assert!(remaining.is_empty());
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn given_message_with_metadata_when_stored_then_round_trips() {
    let pg = TestPostgres::new().await;
    let conversation = Conversation::new(UserId::new(), "Chat".to_string());
    pg.conversation_repository.create(&conversation).await.unwrap();

    let mut message = Message::new(conversation.id, MessageRole::User, "hello".to_string());
    message
        .metadata
        .insert("client".to_string(), json!("mobile"));

    pg.message_repository.create(&message).await.unwrap();

    let loaded = pg
        .message_repository
        .list_by_conversation(conversation.id)
        .await
        .unwrap();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].id, message.id);
    assert_eq!(loaded[0].role, MessageRole::User);
    assert_eq!(loaded[0].metadata.get("client"), Some(&json!("mobile")));
    assert!(loaded[0].embedding_ref.is_none());
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn given_messages_when_reading_history_then_turns_come_back_in_creation_order() {
    let pg = TestPostgres::new().await;
    let conversation = Conversation::new(UserId::new(), "Chat".to_string());
    pg.conversation_repository.create(&conversation).await.unwrap();

    let mut first = Message::new(conversation.id, MessageRole::User, "question".to_string());
    first.created_at = Utc::now() - Duration::seconds(10);
    let second = Message::new(conversation.id, MessageRole::Assistant, "answer".to_string());

    pg.message_repository.create(&second).await.unwrap();
    pg.message_repository.create(&first).await.unwrap();

    let history = pg.message_repository.history(conversation.id).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].role, MessageRole::User);
    assert_eq!(history[0].content, "question");
    assert_eq!(history[1].role, MessageRole::Assistant);
    assert_eq!(history[1].content, "answer");
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn given_placeholder_when_content_updated_then_new_content_is_returned() {
    let pg = TestPostgres::new().await;
    let conversation = Conversation::new(UserId::new(), "Chat".to_string());
    pg.conversation_repository.create(&conversation).await.unwrap();

    let placeholder = Message::placeholder(conversation.id);
    pg.message_repository.create(&placeholder).await.unwrap();

    let updated = pg
        .message_repository
        .update_content(placeholder.id, "final reply")
        .await
        .unwrap();
    assert_eq!(updated.content, "final reply");
    assert_eq!(updated.role, MessageRole::Assistant);

    let error = pg
        .message_repository
        .update_content(colloquy::domain::MessageId::new(), "nothing")
        .await
        .unwrap_err();
    assert!(matches!(error, RepositoryError::NotFound(_)));
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn given_embedding_ref_when_set_then_it_is_persisted() {
    let pg = TestPostgres::new().await;
    let conversation = Conversation::new(UserId::new(), "Chat".to_string());
    pg.conversation_repository.create(&conversation).await.unwrap();

    let message = Message::new(conversation.id, MessageRole::User, "hello".to_string());
    pg.message_repository.create(&message).await.unwrap();

    let entry_id = VectorEntryId::new();
    pg.message_repository
        .set_embedding_ref(message.id, entry_id)
        .await
        .unwrap();

    let loaded = pg
        .message_repository
        .list_by_conversation(conversation.id)
        .await
        .unwrap();
    assert_eq!(loaded[0].embedding_ref, Some(entry_id));
}
