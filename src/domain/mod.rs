mod chat_turn;
mod conversation;
mod conversation_id;
mod embedding;
mod message;
mod message_id;
mod message_role;
mod user_id;
mod vector_entry;

pub use chat_turn::ChatTurn;
pub use conversation::Conversation;
pub use conversation_id::ConversationId;
pub use embedding::Embedding;
pub use message::Message;
pub use message_id::MessageId;
pub use message_role::MessageRole;
pub use user_id::UserId;
pub use vector_entry::{VectorEntry, VectorEntryId};
