mod collection_config;
mod conversation_repository;
mod distance_metric;
mod embedder;
mod generation_provider;
mod message_repository;
mod payload_field_type;
mod payload_index;
mod repository_error;
mod vector_index;
mod vector_index_error;

pub use collection_config::CollectionConfig;
pub use conversation_repository::{ConversationPage, ConversationRepository};
pub use distance_metric::DistanceMetric;
pub use embedder::{Embedder, EmbedderError};
pub use generation_provider::{GenerationError, GenerationProvider, GenerationStream};
pub use message_repository::MessageRepository;
pub use payload_field_type::PayloadFieldType;
pub use payload_index::PayloadIndex;
pub use repository_error::RepositoryError;
pub use vector_index::{SimilarityHit, VectorIndex};
pub use vector_index_error::VectorIndexError;
