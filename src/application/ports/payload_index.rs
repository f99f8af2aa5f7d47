use super::PayloadFieldType;

/// A payload field the vector collection indexes for filtered deletes and
/// owner-scoped searches.
#[derive(Debug, Clone)]
pub struct PayloadIndex {
    pub field_name: String,
    pub field_type: PayloadFieldType,
}

impl PayloadIndex {
    pub fn keyword(field_name: impl Into<String>) -> Self {
        Self {
            field_name: field_name.into(),
            field_type: PayloadFieldType::Keyword,
        }
    }
}
