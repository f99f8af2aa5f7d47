use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;

use colloquy::application::ports::{CollectionConfig, VectorIndex};
use colloquy::application::services::{AccessGate, ChatService, ConversationService};
use colloquy::infrastructure::llm::{OpenAiEmbedder, create_generation_provider};
use colloquy::infrastructure::observability::{TracingConfig, init_tracing};
use colloquy::infrastructure::persistence::{
    PgConversationRepository, PgMessageRepository, create_pool,
};
use colloquy::infrastructure::vector::QdrantVectorIndex;
use colloquy::presentation::{AppState, Environment, Settings, create_router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let environment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .map_err(anyhow::Error::msg)?;

    let settings = Settings::load(environment).map_err(anyhow::Error::msg)?;

    init_tracing(
        TracingConfig {
            environment: environment.to_string(),
            json_format: settings.logging.enable_json,
        },
        settings.server.port,
    );

    let pool = create_pool(&settings.database.url, settings.database.max_connections)
        .await
        .map_err(anyhow::Error::msg)?;

    tracing::info!("Running database migrations");
    sqlx::migrate!().run(&pool).await?;

    let conversations = Arc::new(PgConversationRepository::new(pool.clone()));
    let messages = Arc::new(PgMessageRepository::new(pool.clone()));

    let mut embedder = OpenAiEmbedder::new(
        settings.embeddings.api_key.clone(),
        settings.embeddings.model.clone(),
    );
    if let Some(base_url) = &settings.embeddings.base_url {
        embedder = embedder.with_endpoint(base_url.clone());
    }
    let embedder = Arc::new(embedder);
    let vector_index = Arc::new(
        QdrantVectorIndex::new(
            &settings.qdrant.url,
            settings.qdrant.collection_name.clone(),
            embedder,
            CollectionConfig::new(settings.embeddings.dimension),
        )
        .await
        .map_err(anyhow::Error::msg)?,
    );
    vector_index
        .ensure_collection()
        .await
        .map_err(anyhow::Error::msg)?;

    let provider = Arc::new(create_generation_provider(&settings.llm).map_err(anyhow::Error::msg)?);

    let access_gate = AccessGate::new(conversations.clone());
    let chat_service = Arc::new(ChatService::new(
        access_gate.clone(),
        conversations.clone(),
        messages.clone(),
        vector_index.clone(),
        provider,
    ));
    let conversation_service = Arc::new(ConversationService::new(
        access_gate,
        conversations,
        messages,
        vector_index,
    ));

    let state = AppState {
        chat_service,
        conversation_service,
        sse_keep_alive_seconds: settings.llm.sse_keep_alive_seconds,
    };

    let router = create_router(state);

    let addr = SocketAddr::new(settings.server.host.parse()?, settings.server.port);
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
