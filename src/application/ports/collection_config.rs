use super::{DistanceMetric, PayloadIndex};

#[derive(Debug, Clone)]
pub struct CollectionConfig {
    pub vector_dimensions: u64,
    pub distance_metric: DistanceMetric,
    pub payload_indexes: Vec<PayloadIndex>,
}

impl CollectionConfig {
    /// Every search is owner-scoped and deletes are keyed by message or
    /// conversation, so those three payload fields get keyword indexes.
    pub fn new(vector_dimensions: u64) -> Self {
        Self {
            vector_dimensions,
            distance_metric: DistanceMetric::Cosine,
            payload_indexes: vec![
                PayloadIndex::keyword("owner_id"),
                PayloadIndex::keyword("conversation_id"),
                PayloadIndex::keyword("message_id"),
            ],
        }
    }
}
