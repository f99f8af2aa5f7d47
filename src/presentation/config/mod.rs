mod environment;
mod settings;

pub use environment::Environment;
pub use settings::{
    DatabaseSettings, EmbeddingsSettings, LlmSettings, LoggingSettings, QdrantSettings,
    ServerSettings, Settings,
};
