use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use qdrant_client::Qdrant;
use qdrant_client::qdrant::{
    Condition, CreateCollectionBuilder, CreateFieldIndexCollectionBuilder, DeletePointsBuilder,
    Distance, FieldType, Filter, PointId, PointStruct, SearchPointsBuilder, UpsertPointsBuilder,
    VectorParamsBuilder, VectorsConfig,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::application::ports::{
    CollectionConfig, DistanceMetric, Embedder, PayloadFieldType, SimilarityHit, VectorIndex,
    VectorIndexError,
};
use crate::domain::{ConversationId, Message, MessageId, UserId, VectorEntry, VectorEntryId};

/// Qdrant-backed vector index. One collection holds every entry; payload
/// fields key the owner, conversation and message so deletes and searches
/// can filter without extra lookups.
pub struct QdrantVectorIndex {
    client: Arc<Qdrant>,
    collection_name: String,
    embedder: Arc<dyn Embedder>,
    config: CollectionConfig,
}

impl QdrantVectorIndex {
    pub async fn new(
        url: &str,
        collection_name: String,
        embedder: Arc<dyn Embedder>,
        config: CollectionConfig,
    ) -> Result<Self, VectorIndexError> {
        let client = Qdrant::from_url(url)
            .build()
            .map_err(|e| VectorIndexError::ConnectionFailed(e.to_string()))?;

        Ok(Self {
            client: Arc::new(client),
            collection_name,
            embedder,
            config,
        })
    }

    pub fn with_client(
        client: Arc<Qdrant>,
        collection_name: String,
        embedder: Arc<dyn Embedder>,
        config: CollectionConfig,
    ) -> Self {
        Self {
            client,
            collection_name,
            embedder,
            config,
        }
    }

    fn map_distance_metric(metric: &DistanceMetric) -> Distance {
        match metric {
            DistanceMetric::Cosine => Distance::Cosine,
            DistanceMetric::Euclidean => Distance::Euclid,
            DistanceMetric::DotProduct => Distance::Dot,
        }
    }

    fn map_field_type(field_type: &PayloadFieldType) -> FieldType {
        match field_type {
            PayloadFieldType::Keyword => FieldType::Keyword,
            PayloadFieldType::Integer => FieldType::Integer,
            PayloadFieldType::Float => FieldType::Float,
            PayloadFieldType::Text => FieldType::Text,
        }
    }

    async fn collection_exists(&self) -> Result<bool, VectorIndexError> {
        self.client
            .collection_exists(&self.collection_name)
            .await
            .map_err(|e| VectorIndexError::ConnectionFailed(e.to_string()))
    }
}

#[async_trait]
impl VectorIndex for QdrantVectorIndex {
    #[instrument(skip(self), fields(collection = %self.collection_name))]
    async fn ensure_collection(&self) -> Result<bool, VectorIndexError> {
        if self.collection_exists().await? {
            info!(collection = %self.collection_name, "collection already exists");
            return Ok(false);
        }

        let vectors_config = VectorsConfig::from(VectorParamsBuilder::new(
            self.config.vector_dimensions,
            Self::map_distance_metric(&self.config.distance_metric),
        ));

        self.client
            .create_collection(
                CreateCollectionBuilder::new(&self.collection_name).vectors_config(vectors_config),
            )
            .await
            .map_err(|e| VectorIndexError::CollectionCreationFailed(e.to_string()))?;

        info!(collection = %self.collection_name, "collection_created");

        for index in &self.config.payload_indexes {
            self.client
                .create_field_index(CreateFieldIndexCollectionBuilder::new(
                    &self.collection_name,
                    &index.field_name,
                    Self::map_field_type(&index.field_type),
                ))
                .await
                .map_err(|e| VectorIndexError::PayloadIndexFailed(e.to_string()))?;

            info!(
                collection = %self.collection_name,
                field = %index.field_name,
                "payload_index_applied"
            );
        }

        Ok(true)
    }

    #[instrument(skip(self, message), fields(collection = %self.collection_name, message_id = %message.id.as_uuid()))]
    async fn upsert_for_message(
        &self,
        owner_id: UserId,
        message: &Message,
    ) -> Result<VectorEntryId, VectorIndexError> {
        let embedding = self
            .embedder
            .embed(&message.content)
            .await
            .map_err(|e| VectorIndexError::EmbeddingFailed(e.to_string()))?;

        let entry = VectorEntry::for_message(
            owner_id,
            message.conversation_id,
            message.id,
            message.content.clone(),
            embedding,
        );

        let mut payload: HashMap<String, serde_json::Value> = HashMap::new();
        payload.insert(
            "owner_id".to_string(),
            serde_json::Value::String(entry.owner_id.as_uuid().to_string()),
        );
        payload.insert(
            "conversation_id".to_string(),
            serde_json::Value::String(message.conversation_id.as_uuid().to_string()),
        );
        payload.insert(
            "message_id".to_string(),
            serde_json::Value::String(message.id.as_uuid().to_string()),
        );
        payload.insert(
            "content".to_string(),
            serde_json::Value::String(entry.content.clone()),
        );

        let point = PointStruct::new(
            PointId::from(entry.id.as_uuid().to_string()),
            entry.embedding.values.clone(),
            payload,
        );

        self.client
            .upsert_points(UpsertPointsBuilder::new(&self.collection_name, vec![point]))
            .await
            .map_err(|e| VectorIndexError::UpsertFailed(e.to_string()))?;

        info!(collection = %self.collection_name, entry_id = %entry.id.as_uuid(), "point_upserted");
        Ok(entry.id)
    }

    #[instrument(skip(self), fields(collection = %self.collection_name, message_id = %message_id.as_uuid()))]
    async fn delete_for_message(&self, message_id: MessageId) -> Result<(), VectorIndexError> {
        self.client
            .delete_points(
                DeletePointsBuilder::new(&self.collection_name).points(Filter::must([
                    Condition::matches("message_id", message_id.as_uuid().to_string()),
                ])),
            )
            .await
            .map_err(|e| VectorIndexError::DeleteFailed(e.to_string()))?;

        Ok(())
    }

    #[instrument(skip(self), fields(collection = %self.collection_name, conversation_id = %conversation_id.as_uuid()))]
    async fn delete_for_conversation(
        &self,
        conversation_id: ConversationId,
    ) -> Result<(), VectorIndexError> {
        self.client
            .delete_points(
                DeletePointsBuilder::new(&self.collection_name).points(Filter::must([
                    Condition::matches("conversation_id", conversation_id.as_uuid().to_string()),
                ])),
            )
            .await
            .map_err(|e| VectorIndexError::DeleteFailed(e.to_string()))?;

        info!(collection = %self.collection_name, "conversation_points_deleted");
        Ok(())
    }

    #[instrument(skip(self, query), fields(collection = %self.collection_name, limit, threshold))]
    async fn similarity_search(
        &self,
        query: &str,
        owner_id: UserId,
        limit: usize,
        threshold: f32,
        conversation_id: Option<ConversationId>,
    ) -> Result<Vec<SimilarityHit>, VectorIndexError> {
        let embedding = self
            .embedder
            .embed(query)
            .await
            .map_err(|e| VectorIndexError::EmbeddingFailed(e.to_string()))?;

        let mut conditions = vec![Condition::matches(
            "owner_id",
            owner_id.as_uuid().to_string(),
        )];
        if let Some(conversation_id) = conversation_id {
            conditions.push(Condition::matches(
                "conversation_id",
                conversation_id.as_uuid().to_string(),
            ));
        }

        let search_result = self
            .client
            .search_points(
                SearchPointsBuilder::new(
                    &self.collection_name,
                    embedding.values.clone(),
                    limit as u64,
                )
                .filter(Filter::must(conditions))
                .score_threshold(threshold)
                .with_payload(true),
            )
            .await
            .map_err(|e| VectorIndexError::SearchFailed(e.to_string()))?;

        let hits: Vec<SimilarityHit> = search_result
            .result
            .into_iter()
            .filter_map(|point| {
                let payload = point.payload;

                let entry_id = match point.id?.point_id_options? {
                    qdrant_client::qdrant::point_id::PointIdOptions::Uuid(uuid) => {
                        Uuid::parse_str(&uuid).ok()?
                    }
                    qdrant_client::qdrant::point_id::PointIdOptions::Num(_) => return None,
                };

                let conversation_id = payload
                    .get("conversation_id")
                    .and_then(|v| v.as_str())
                    .and_then(|s| Uuid::parse_str(s).ok())
                    .map(ConversationId::from_uuid);
                let message_id = payload
                    .get("message_id")
                    .and_then(|v| v.as_str())
                    .and_then(|s| Uuid::parse_str(s).ok())
                    .map(MessageId::from_uuid);
                let content = payload.get("content")?.as_str()?.to_string();

                Some(SimilarityHit {
                    entry_id: VectorEntryId::from_uuid(entry_id),
                    conversation_id,
                    message_id,
                    content,
                    score: point.score,
                })
            })
            .collect();

        Ok(hits)
    }
}
