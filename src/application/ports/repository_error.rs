/// Failures surfaced by the relational adapters. Read misses are `Ok(None)`
/// at the trait level; `NotFound` is reserved for writes against a row that
/// must exist, such as finalizing a streamed reply.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("connection failed: {0}")]
    ConnectionFailed(String),
    #[error("query failed: {0}")]
    QueryFailed(String),
    #[error("not found: {0}")]
    NotFound(String),
}
