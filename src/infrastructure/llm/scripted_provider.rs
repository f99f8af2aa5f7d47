use async_trait::async_trait;

use crate::application::ports::{GenerationError, GenerationProvider, GenerationStream};
use crate::domain::ChatTurn;

/// Provider with canned output for local runs and tests: one fixed reply
/// for the one-shot path and a fixed fragment sequence for streaming.
pub struct ScriptedGenerationProvider {
    reply: String,
    fragments: Vec<String>,
}

impl ScriptedGenerationProvider {
    pub fn new(reply: impl Into<String>, fragments: Vec<String>) -> Self {
        Self {
            reply: reply.into(),
            fragments,
        }
    }
}

impl Default for ScriptedGenerationProvider {
    fn default() -> Self {
        Self::new(
            "Scripted reply",
            vec!["Scripted ".to_string(), "reply".to_string()],
        )
    }
}

#[async_trait]
impl GenerationProvider for ScriptedGenerationProvider {
    async fn generate(&self, _history: &[ChatTurn]) -> Result<String, GenerationError> {
        Ok(self.reply.clone())
    }

    async fn generate_stream(
        &self,
        _history: &[ChatTurn],
    ) -> Result<GenerationStream, GenerationError> {
        let fragments: Vec<Result<String, GenerationError>> =
            self.fragments.iter().cloned().map(Ok).collect();
        Ok(Box::pin(futures::stream::iter(fragments)))
    }
}
