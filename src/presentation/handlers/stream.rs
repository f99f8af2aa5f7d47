use std::convert::Infallible;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use axum::Json;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::{Stream, StreamExt};
use serde_json::json;
use tokio::sync::mpsc;
use uuid::Uuid;

use super::error::ApiError;
use super::identity::CallerIdentity;
use super::messages::SendMessageRequest;
use crate::application::services::{ChatService, StreamingExchange};
use crate::domain::ConversationId;
use crate::infrastructure::observability::sanitize_content;
use crate::presentation::state::AppState;

/// SSE response body fed from the consumer task through a channel. The
/// channel decouples fragment delivery from the finalize write: dropping
/// this stream drops the receiver, never the task.
pub struct SseStream {
    receiver: mpsc::Receiver<Result<Event, Infallible>>,
}

impl Stream for SseStream {
    type Item = Result<Event, Infallible>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}

/// Streaming send. Phase one (authorize, persist user message, persist
/// placeholder, open the provider stream) happens before the response
/// status is committed, so its failures still map to plain error codes.
/// Phase two runs detached: a consumer task forwards fragments and always
/// finalizes the placeholder, whether the stream ends, the provider fails,
/// or the client goes away.
#[tracing::instrument(skip(state, request), fields(conversation_id = %id, user_id = %identity.0.as_uuid()))]
pub async fn stream_message_handler(
    State(state): State<AppState>,
    identity: CallerIdentity,
    Path(id): Path<Uuid>,
    Json(request): Json<SendMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    tracing::debug!(content = %sanitize_content(&request.content), "Processing streaming send");

    let exchange = state
        .chat_service
        .send_message_streaming(
            ConversationId::from_uuid(id),
            identity.0,
            &request.content,
            &request.role,
        )
        .await?;

    let (tx, rx) = mpsc::channel(64);
    let chat_service = Arc::clone(&state.chat_service);
    tokio::spawn(consume_and_finalize(chat_service, exchange, tx));

    Ok(Sse::new(SseStream { receiver: rx }).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(state.sse_keep_alive_seconds))
            .text("keep-alive"),
    ))
}

/// Drains the provider stream exactly once. Every exit path falls through
/// to the finalize call with whatever text accumulated; a partial reply
/// after a disconnect is expected, a permanent placeholder is not.
async fn consume_and_finalize(
    chat_service: Arc<ChatService>,
    exchange: StreamingExchange,
    tx: mpsc::Sender<Result<Event, Infallible>>,
) {
    let message_id = exchange.assistant_message_id;
    let user_message_id = exchange.user_message.id;
    let mut fragments = exchange.fragments;

    let mut accumulated = String::new();
    let mut client_gone = false;
    let mut provider_failed = false;

    while let Some(next) = fragments.next().await {
        match next {
            Ok(delta) => {
                accumulated.push_str(&delta);
                let event = Event::default()
                    .event("message")
                    .data(json!({ "delta": delta }).to_string());
                if tx.send(Ok(event)).await.is_err() {
                    // Client disconnected; abandon the stream and finalize
                    // with what we have.
                    tracing::debug!(
                        message_id = %message_id.as_uuid(),
                        "Client disconnected mid-stream, abandoning fragments"
                    );
                    client_gone = true;
                    break;
                }
            }
            Err(e) => {
                tracing::error!(
                    message_id = %message_id.as_uuid(),
                    error = %e,
                    "Generation stream failed mid-reply"
                );
                provider_failed = true;
                let event = Event::default()
                    .event("error")
                    .data(json!({ "message": "Reply generation failed" }).to_string());
                let _ = tx.send(Ok(event)).await;
                break;
            }
        }
    }

    match chat_service
        .update_message_content(message_id, &accumulated)
        .await
    {
        Ok(_) => {
            if !client_gone && !provider_failed {
                let event = Event::default().event("done").data(
                    json!({
                        "user_message_id": user_message_id.as_uuid(),
                        "assistant_message_id": message_id.as_uuid(),
                    })
                    .to_string(),
                );
                let _ = tx.send(Ok(event)).await;
            }
        }
        Err(e) => {
            // Internal failures were logged at the repository boundary;
            // the client still gets told the reply was not stored.
            let event = Event::default()
                .event("error")
                .data(json!({ "message": e.message() }).to_string());
            let _ = tx.send(Ok(event)).await;
        }
    }
}
