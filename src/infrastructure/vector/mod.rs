mod in_memory_vector_index;
mod qdrant_vector_index;

pub use in_memory_vector_index::InMemoryVectorIndex;
pub use qdrant_vector_index::QdrantVectorIndex;
