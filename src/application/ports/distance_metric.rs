/// Similarity metric of the vector collection. Cosine is the default and
/// the only metric the search threshold semantics are tuned for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DistanceMetric {
    #[default]
    Cosine,
    Euclidean,
    DotProduct,
}
