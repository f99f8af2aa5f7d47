use std::pin::Pin;

use async_trait::async_trait;
use futures::stream::Stream;

use crate::domain::ChatTurn;

/// Lazy sequence of reply fragments. Single-consumer, forward-only, not
/// restartable; abandoning it mid-way is allowed and not an error.
pub type GenerationStream = Pin<Box<dyn Stream<Item = Result<String, GenerationError>> + Send>>;

#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Produces the full reply for the given history in one shot. An empty
    /// reply is a valid outcome, not an error.
    async fn generate(&self, history: &[ChatTurn]) -> Result<String, GenerationError>;

    /// Streaming variant: the returned sequence yields text fragments as
    /// the provider emits them.
    async fn generate_stream(
        &self,
        history: &[ChatTurn],
    ) -> Result<GenerationStream, GenerationError>;
}

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("api request failed: {0}")]
    ApiRequestFailed(String),
    #[error("rate limited")]
    RateLimited,
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}
