use axum::Json;
use axum::extract::State;
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};

use super::dto::SimilarityHitDto;
use super::error::ApiError;
use super::identity::CallerIdentity;
use crate::presentation::state::AppState;

const DEFAULT_LIMIT: usize = 10;
const DEFAULT_THRESHOLD: f32 = 0.7;

fn default_limit() -> usize {
    DEFAULT_LIMIT
}

fn default_threshold() -> f32 {
    DEFAULT_THRESHOLD
}

#[derive(Deserialize)]
pub struct SearchRequest {
    pub query: String,
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default = "default_threshold")]
    pub threshold: f32,
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub hits: Vec<SimilarityHitDto>,
}

#[tracing::instrument(skip(state, request), fields(user_id = %identity.0.as_uuid()))]
pub async fn semantic_search_handler(
    State(state): State<AppState>,
    identity: CallerIdentity,
    Json(request): Json<SearchRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let hits = state
        .conversation_service
        .semantic_search(identity.0, &request.query, request.limit, request.threshold)
        .await?;

    Ok(Json(SearchResponse {
        hits: hits.iter().map(SimilarityHitDto::from).collect(),
    }))
}
