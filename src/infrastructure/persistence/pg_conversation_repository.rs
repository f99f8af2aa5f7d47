use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::instrument;

use crate::application::ports::{ConversationPage, ConversationRepository, RepositoryError};
use crate::domain::{Conversation, ConversationId, UserId};

pub struct PgConversationRepository {
    pool: PgPool,
}

impl PgConversationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_conversation(row: &PgRow) -> Result<Conversation, RepositoryError> {
    Ok(Conversation {
        id: ConversationId::from_uuid(
            row.try_get("id")
                .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?,
        ),
        owner_id: UserId::from_uuid(
            row.try_get("owner_id")
                .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?,
        ),
        title: row
            .try_get("title")
            .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?,
        created_at: row
            .try_get("created_at")
            .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?,
        updated_at: row
            .try_get("updated_at")
            .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?,
    })
}

#[async_trait]
impl ConversationRepository for PgConversationRepository {
    #[instrument(skip(self, conversation), fields(conversation_id = %conversation.id.as_uuid()))]
    async fn create(&self, conversation: &Conversation) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO conversations (id, owner_id, title, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(conversation.id.as_uuid())
        .bind(conversation.owner_id.as_uuid())
        .bind(&conversation.title)
        .bind(conversation.created_at)
        .bind(conversation.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        Ok(())
    }

    #[instrument(skip(self), fields(conversation_id = %id.as_uuid()))]
    async fn find_by_id(
        &self,
        id: ConversationId,
    ) -> Result<Option<Conversation>, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT id, owner_id, title, created_at, updated_at
            FROM conversations
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        row.as_ref().map(map_conversation).transpose()
    }

    #[instrument(skip(self), fields(owner_id = %owner_id.as_uuid(), page, limit))]
    async fn list_by_owner(
        &self,
        owner_id: UserId,
        page: u32,
        limit: u32,
    ) -> Result<ConversationPage, RepositoryError> {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM conversations WHERE owner_id = $1
            "#,
        )
        .bind(owner_id.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        let offset = i64::from(page - 1) * i64::from(limit);
        let rows = sqlx::query(
            r#"
            SELECT id, owner_id, title, created_at, updated_at
            FROM conversations
            WHERE owner_id = $1
            ORDER BY updated_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(owner_id.as_uuid())
        .bind(i64::from(limit))
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        let conversations = rows
            .iter()
            .map(map_conversation)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ConversationPage {
            conversations,
            page,
            limit,
            total: total as u64,
        })
    }

    #[instrument(skip(self, title), fields(conversation_id = %id.as_uuid()))]
    async fn update_title(
        &self,
        id: ConversationId,
        title: &str,
    ) -> Result<Option<Conversation>, RepositoryError> {
        let row = sqlx::query(
            r#"
            UPDATE conversations
            SET title = $2, updated_at = $3
            WHERE id = $1
            RETURNING id, owner_id, title, created_at, updated_at
            "#,
        )
        .bind(id.as_uuid())
        .bind(title)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        row.as_ref().map(map_conversation).transpose()
    }

    #[instrument(skip(self), fields(conversation_id = %id.as_uuid()))]
    async fn delete(&self, id: ConversationId) -> Result<(), RepositoryError> {
        // Messages go with it via ON DELETE CASCADE.
        sqlx::query("DELETE FROM conversations WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        Ok(())
    }

    #[instrument(skip(self), fields(conversation_id = %id.as_uuid(), owner_id = %owner_id.as_uuid()))]
    async fn verify_ownership(
        &self,
        id: ConversationId,
        owner_id: UserId,
    ) -> Result<bool, RepositoryError> {
        let owned: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM conversations WHERE id = $1 AND owner_id = $2
            )
            "#,
        )
        .bind(id.as_uuid())
        .bind(owner_id.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        Ok(owned)
    }

    #[instrument(skip(self), fields(conversation_id = %id.as_uuid()))]
    async fn touch_updated_at(
        &self,
        id: ConversationId,
        at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE conversations SET updated_at = $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(at)
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        Ok(())
    }
}
