#[derive(Debug, thiserror::Error)]
pub enum VectorIndexError {
    #[error("connection failed: {0}")]
    ConnectionFailed(String),
    #[error("collection creation failed: {0}")]
    CollectionCreationFailed(String),
    #[error("payload index creation failed: {0}")]
    PayloadIndexFailed(String),
    #[error("embedding failed: {0}")]
    EmbeddingFailed(String),
    #[error("upsert failed: {0}")]
    UpsertFailed(String),
    #[error("search failed: {0}")]
    SearchFailed(String),
    #[error("delete failed: {0}")]
    DeleteFailed(String),
}
