use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::instrument;
use uuid::Uuid;

use crate::application::ports::{MessageRepository, RepositoryError};
use crate::domain::{
    ChatTurn, ConversationId, Message, MessageId, MessageRole, VectorEntryId,
};

pub struct PgMessageRepository {
    pool: PgPool,
}

impl PgMessageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn query_failed(e: impl std::fmt::Display) -> RepositoryError {
    RepositoryError::QueryFailed(e.to_string())
}

fn map_message(row: &PgRow) -> Result<Message, RepositoryError> {
    let role: String = row.try_get("role").map_err(query_failed)?;
    let role = role.parse::<MessageRole>().map_err(RepositoryError::QueryFailed)?;

    let metadata: Value = row.try_get("metadata").map_err(query_failed)?;
    let metadata = match metadata {
        Value::Object(map) => map,
        _ => serde_json::Map::new(),
    };

    let embedding_ref: Option<Uuid> = row.try_get("embedding_ref").map_err(query_failed)?;

    Ok(Message {
        id: MessageId::from_uuid(row.try_get("id").map_err(query_failed)?),
        conversation_id: ConversationId::from_uuid(
            row.try_get("conversation_id").map_err(query_failed)?,
        ),
        role,
        content: row.try_get("content").map_err(query_failed)?,
        metadata,
        embedding_ref: embedding_ref.map(VectorEntryId::from_uuid),
        created_at: row.try_get("created_at").map_err(query_failed)?,
    })
}

#[async_trait]
impl MessageRepository for PgMessageRepository {
    #[instrument(skip(self, message), fields(message_id = %message.id.as_uuid(), conversation_id = %message.conversation_id.as_uuid()))]
    async fn create(&self, message: &Message) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO messages (id, conversation_id, role, content, metadata, embedding_ref, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(message.id.as_uuid())
        .bind(message.conversation_id.as_uuid())
        .bind(message.role.as_str())
        .bind(&message.content)
        .bind(Value::Object(message.metadata.clone()))
        .bind(message.embedding_ref.map(|id| id.as_uuid()))
        .bind(message.created_at)
        .execute(&self.pool)
        .await
        .map_err(query_failed)?;

        Ok(())
    }

    #[instrument(skip(self, content), fields(message_id = %id.as_uuid()))]
    async fn update_content(&self, id: MessageId, content: &str) -> Result<Message, RepositoryError> {
        let row = sqlx::query(
            r#"
            UPDATE messages
            SET content = $2
            WHERE id = $1
            RETURNING id, conversation_id, role, content, metadata, embedding_ref, created_at
            "#,
        )
        .bind(id.as_uuid())
        .bind(content)
        .fetch_optional(&self.pool)
        .await
        .map_err(query_failed)?;

        match row {
            Some(row) => map_message(&row),
            None => Err(RepositoryError::NotFound(format!(
                "message {}",
                id.as_uuid()
            ))),
        }
    }

    #[instrument(skip(self), fields(message_id = %id.as_uuid()))]
    async fn set_embedding_ref(
        &self,
        id: MessageId,
        entry_id: VectorEntryId,
    ) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE messages SET embedding_ref = $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(entry_id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(query_failed)?;

        Ok(())
    }

    #[instrument(skip(self), fields(message_id = %id.as_uuid()))]
    async fn delete(&self, id: MessageId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM messages WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(query_failed)?;

        Ok(())
    }

    #[instrument(skip(self), fields(conversation_id = %conversation_id.as_uuid()))]
    async fn list_by_conversation(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Vec<Message>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT id, conversation_id, role, content, metadata, embedding_ref, created_at
            FROM messages
            WHERE conversation_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(conversation_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(query_failed)?;

        rows.iter().map(map_message).collect()
    }

    #[instrument(skip(self), fields(conversation_id = %conversation_id.as_uuid()))]
    async fn history(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Vec<ChatTurn>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT role, content
            FROM messages
            WHERE conversation_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(conversation_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(query_failed)?;

        rows.into_iter()
            .map(|row| {
                let role: String = row.try_get("role").map_err(query_failed)?;
                let role = role.parse::<MessageRole>().map_err(RepositoryError::QueryFailed)?;
                let content: String = row.try_get("content").map_err(query_failed)?;
                Ok(ChatTurn { role, content })
            })
            .collect()
    }
}
