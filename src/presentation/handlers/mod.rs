mod conversations;
mod dto;
mod error;
mod health;
mod identity;
mod messages;
mod search;
mod stream;

pub use conversations::{
    create_conversation_handler, delete_conversation_handler, get_conversation_handler,
    list_conversations_handler, update_conversation_handler,
};
pub use error::ApiError;
pub use health::health_handler;
pub use identity::{CallerIdentity, USER_ID_HEADER};
pub use messages::send_message_handler;
pub use search::semantic_search_handler;
pub use stream::stream_message_handler;
