//! Deterministic hashed word vectors.
//!
//! Every token maps to a pseudo-random vector seeded by SHA-256 of the
//! token, and a text is represented by the mean of its token vectors. No
//! model files are needed, so this is the offline default and the fallback
//! for words missing from a loaded vocabulary.

use sha2::{Digest, Sha256};

use crate::error::EmbeddingError;
use crate::model::Representation;

/// Default vector length.
pub const DEFAULT_DIMENSION: usize = 64;

/// Bag-of-words representation over hashed token vectors.
#[derive(Debug, Clone)]
pub struct HashedWordVectors {
    dimension: usize,
    name: String,
}

impl Default for HashedWordVectors {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSION)
    }
}

impl HashedWordVectors {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            name: format!("hashed{}", dimension),
        }
    }

    /// Vector for a single token; components lie in [-1.0, 1.0].
    pub fn token_vector(&self, token: &str) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.dimension);
        let mut block: u32 = 0;
        while out.len() < self.dimension {
            let mut hasher = Sha256::new();
            hasher.update(token.as_bytes());
            hasher.update(block.to_le_bytes());
            let digest = hasher.finalize();
            for byte in digest.iter() {
                if out.len() == self.dimension {
                    break;
                }
                out.push(f32::from(*byte) / 127.5 - 1.0);
            }
            block += 1;
        }
        out
    }
}

impl Representation for HashedWordVectors {
    fn name(&self) -> &str {
        &self.name
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn represent(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        mean_vector(
            text.split_whitespace().map(|t| self.token_vector(t)),
            self.dimension,
        )
    }
}

/// Arithmetic mean of token vectors.
///
/// An empty iterator is [`EmbeddingError::EmptyInput`] rather than a NaN
/// vector.
pub(crate) fn mean_vector(
    vectors: impl Iterator<Item = Vec<f32>>,
    dimension: usize,
) -> Result<Vec<f32>, EmbeddingError> {
    let mut sum = vec![0.0f32; dimension];
    let mut count = 0usize;
    for vector in vectors {
        if vector.len() != dimension {
            return Err(EmbeddingError::DimensionMismatch {
                expected: dimension,
                actual: vector.len(),
            });
        }
        for (acc, v) in sum.iter_mut().zip(vector.iter()) {
            *acc += v;
        }
        count += 1;
    }
    if count == 0 {
        return Err(EmbeddingError::EmptyInput);
    }
    let n = count as f32;
    for val in sum.iter_mut() {
        *val /= n;
    }
    Ok(sum)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::similarity::cosine_similarity;

    #[test]
    fn test_token_vector_deterministic() {
        let repr = HashedWordVectors::new(16);
        assert_eq!(repr.token_vector("deploy"), repr.token_vector("deploy"));
        assert_ne!(repr.token_vector("deploy"), repr.token_vector("lunch"));
    }

    #[test]
    fn test_token_vector_dimension_spans_blocks() {
        // 100 > 32 bytes per digest, so several hash blocks are used
        let repr = HashedWordVectors::new(100);
        let v = repr.token_vector("x");
        assert_eq!(v.len(), 100);
        assert!(v.iter().all(|c| (-1.0..=1.0).contains(c)));
    }

    #[test]
    fn test_represent_is_mean_of_tokens() {
        let repr = HashedWordVectors::new(8);
        let a = repr.token_vector("alpha");
        let b = repr.token_vector("beta");
        let mean = repr.represent("alpha beta").unwrap();
        for i in 0..8 {
            assert!((mean[i] - (a[i] + b[i]) / 2.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_represent_empty_is_error() {
        let repr = HashedWordVectors::default();
        assert!(matches!(
            repr.represent("   "),
            Err(EmbeddingError::EmptyInput)
        ));
    }

    #[test]
    fn test_shared_words_more_similar() {
        let repr = HashedWordVectors::new(64);
        let a = repr.represent("database migration failed").unwrap();
        let b = repr.represent("database migration retry").unwrap();
        let c = repr.represent("pizza friday").unwrap();
        let ab = cosine_similarity(&a, &b).unwrap();
        let ac = cosine_similarity(&a, &c).unwrap();
        assert!(ab > ac);
    }

    #[test]
    fn test_name_includes_dimension() {
        assert_eq!(HashedWordVectors::new(32).name(), "hashed32");
    }
}
