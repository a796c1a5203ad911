//! Centroid computation.

use crate::error::TopicsError;

/// Calculate the arithmetic mean of multiple representations.
///
/// All inputs must share one dimension; a mismatch is a configuration error
/// rather than a partial mean. Returns an empty vector for empty input.
pub fn calculate_centroid(embeddings: &[&[f32]]) -> Result<Vec<f32>, TopicsError> {
    let Some(first) = embeddings.first() else {
        return Ok(Vec::new());
    };

    let dim = first.len();
    let n = embeddings.len() as f32;
    let mut centroid = vec![0.0f32; dim];

    for embedding in embeddings {
        if embedding.len() != dim {
            return Err(TopicsError::DimensionMismatch {
                expected: dim,
                actual: embedding.len(),
            });
        }
        for (acc, &val) in centroid.iter_mut().zip(embedding.iter()) {
            *acc += val;
        }
    }

    for val in centroid.iter_mut() {
        *val /= n;
    }

    Ok(centroid)
}
