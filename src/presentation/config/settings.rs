use config::{Config, ConfigError, File};
use serde::Deserialize;

use super::Environment;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub qdrant: QdrantSettings,
    pub embeddings: EmbeddingsSettings,
    pub llm: LlmSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QdrantSettings {
    pub url: String,
    pub collection_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingsSettings {
    pub api_key: String,
    pub model: String,
    pub dimension: u64,
    /// OpenAI-compatible embeddings endpoint override, for local or proxy
    /// deployments. Defaults to the OpenAI API when absent.
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmSettings {
    pub provider: String,
    pub api_key: String,
    pub chat_model: String,
    pub max_tokens: usize,
    pub temperature: f32,
    pub base_url: Option<String>,
    pub azure_endpoint: Option<String>,
    pub sse_keep_alive_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    pub level: String,
    pub enable_json: bool,
}

impl Settings {
    /// Layers `appsettings.{environment}` (any supported format) under
    /// `APP_`-prefixed environment variables, so deployments override
    /// files without editing them.
    pub fn load(environment: Environment) -> Result<Self, ConfigError> {
        let configuration = Config::builder()
            .add_source(
                File::with_name(&format!("appsettings.{}", environment.as_str())).required(false),
            )
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .list_separator(" "),
            )
            .build()?;

        configuration.try_deserialize()
    }
}
