mod access_gate;
mod chat_service;
mod conversation_service;
pub mod pagination;

pub use access_gate::{ACCESS_DENIED_MESSAGE, AccessGate};
pub use chat_service::{ChatService, MessageExchange, StreamingExchange};
pub use conversation_service::{ConversationService, ConversationWithMessages};
pub use pagination::PageRequest;
