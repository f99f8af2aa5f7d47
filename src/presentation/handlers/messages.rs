use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::dto::MessageDto;
use super::error::ApiError;
use super::identity::CallerIdentity;
use crate::domain::ConversationId;
use crate::infrastructure::observability::sanitize_content;
use crate::presentation::state::AppState;

fn default_role() -> String {
    "user".to_string()
}

#[derive(Deserialize)]
pub struct SendMessageRequest {
    pub content: String,
    #[serde(default = "default_role")]
    pub role: String,
}

#[derive(Serialize)]
pub struct SendMessageResponse {
    pub user_message: MessageDto,
    pub assistant_message: MessageDto,
}

#[tracing::instrument(skip(state, request), fields(conversation_id = %id, user_id = %identity.0.as_uuid()))]
pub async fn send_message_handler(
    State(state): State<AppState>,
    identity: CallerIdentity,
    Path(id): Path<Uuid>,
    Json(request): Json<SendMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    tracing::debug!(content = %sanitize_content(&request.content), "Processing message send");

    let exchange = state
        .chat_service
        .send_message(
            ConversationId::from_uuid(id),
            identity.0,
            &request.content,
            &request.role,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SendMessageResponse {
            user_message: MessageDto::from(&exchange.user_message),
            assistant_message: MessageDto::from(&exchange.assistant_message),
        }),
    ))
}
