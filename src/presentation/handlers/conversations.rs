use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::dto::{ConversationDto, MessageDto};
use super::error::ApiError;
use super::identity::CallerIdentity;
use crate::domain::ConversationId;
use crate::presentation::state::AppState;

#[derive(Deserialize)]
pub struct CreateConversationRequest {
    pub title: String,
}

#[derive(Deserialize)]
pub struct UpdateConversationRequest {
    pub title: String,
}

/// Raw pagination values; the application-level validator owns the
/// integer and range rules, so these stay strings here.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
}

#[derive(Serialize)]
pub struct ConversationListResponse {
    pub conversations: Vec<ConversationDto>,
    pub page: u32,
    pub limit: u32,
    pub total: u64,
}

#[derive(Serialize)]
pub struct ConversationWithMessagesResponse {
    pub conversation: ConversationDto,
    pub messages: Vec<MessageDto>,
}

#[tracing::instrument(skip(state, request), fields(user_id = %identity.0.as_uuid()))]
pub async fn create_conversation_handler(
    State(state): State<AppState>,
    identity: CallerIdentity,
    Json(request): Json<CreateConversationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let conversation = state
        .conversation_service
        .create(identity.0, &request.title)
        .await?;

    Ok((StatusCode::CREATED, Json(ConversationDto::from(&conversation))))
}

#[tracing::instrument(skip(state), fields(user_id = %identity.0.as_uuid()))]
pub async fn list_conversations_handler(
    State(state): State<AppState>,
    identity: CallerIdentity,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = state
        .conversation_service
        .list(identity.0, query.page.as_deref(), query.limit.as_deref())
        .await?;

    Ok(Json(ConversationListResponse {
        conversations: page.conversations.iter().map(ConversationDto::from).collect(),
        page: page.page,
        limit: page.limit,
        total: page.total,
    }))
}

#[tracing::instrument(skip(state), fields(conversation_id = %id, user_id = %identity.0.as_uuid()))]
pub async fn get_conversation_handler(
    State(state): State<AppState>,
    identity: CallerIdentity,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let result = state
        .conversation_service
        .get_with_messages(ConversationId::from_uuid(id), identity.0)
        .await?;

    Ok(Json(ConversationWithMessagesResponse {
        conversation: ConversationDto::from(&result.conversation),
        messages: result.messages.iter().map(MessageDto::from).collect(),
    }))
}

#[tracing::instrument(skip(state, request), fields(conversation_id = %id, user_id = %identity.0.as_uuid()))]
pub async fn update_conversation_handler(
    State(state): State<AppState>,
    identity: CallerIdentity,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateConversationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let conversation = state
        .conversation_service
        .update_title(ConversationId::from_uuid(id), identity.0, &request.title)
        .await?;

    Ok(Json(ConversationDto::from(&conversation)))
}

#[tracing::instrument(skip(state), fields(conversation_id = %id, user_id = %identity.0.as_uuid()))]
pub async fn delete_conversation_handler(
    State(state): State<AppState>,
    identity: CallerIdentity,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .conversation_service
        .delete(ConversationId::from_uuid(id), identity.0)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
