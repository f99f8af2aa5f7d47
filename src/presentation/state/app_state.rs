use std::sync::Arc;

use crate::application::services::{ChatService, ConversationService};

/// Shared handler state: the two orchestration services plus the few
/// transport knobs handlers need directly.
pub struct AppState {
    pub chat_service: Arc<ChatService>,
    pub conversation_service: Arc<ConversationService>,
    pub sse_keep_alive_seconds: u64,
}

impl Clone for AppState {
    fn clone(&self) -> Self {
        Self {
            chat_service: Arc::clone(&self.chat_service),
            conversation_service: Arc::clone(&self.conversation_service),
            sse_keep_alive_seconds: self.sse_keep_alive_seconds,
        }
    }
}
