mod openai_embedder;
mod openai_provider;
mod scripted_provider;

pub use openai_embedder::OpenAiEmbedder;
pub use openai_provider::{OpenAiProvider, create_generation_provider};
pub use scripted_provider::ScriptedGenerationProvider;
