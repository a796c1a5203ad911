//! Vector similarity functions.

use crate::error::EmbeddingError;
use crate::model::Similarity;

/// Cosine similarity clamped to [0.0, 1.0].
///
/// Opposite or orthogonal directions both read as unrelated (0.0).
#[derive(Debug, Clone, Copy, Default)]
pub struct CosineSimilarity;

impl CosineSimilarity {
    pub fn new() -> Self {
        Self
    }
}

impl Similarity for CosineSimilarity {
    fn name(&self) -> &str {
        "cosine"
    }

    fn similarity(&self, a: &[f32], b: &[f32]) -> Result<f32, EmbeddingError> {
        Ok(cosine_similarity(a, b)?.clamp(0.0, 1.0))
    }
}

/// Raw cosine similarity between two vectors.
///
/// Returns value in [-1.0, 1.0] where 1.0 = identical direction, and 0.0
/// when either vector has zero length.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32, EmbeddingError> {
    if a.len() != b.len() {
        return Err(EmbeddingError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }

    Ok(dot_product / (norm_a * norm_b))
}
