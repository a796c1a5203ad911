//! Pretrained word vectors loaded from a GloVe-style text file.
//!
//! Each line is `word v1 v2 ... vN`. An optional word2vec header line
//! (`<count> <dimension>`) is skipped. Words outside the vocabulary fall back
//! to [`HashedWordVectors`] of the same dimension so every token contributes.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::{debug, info};

use crate::error::EmbeddingError;
use crate::hashed::{mean_vector, HashedWordVectors};
use crate::model::Representation;

/// Vocabulary-backed representation with hashed out-of-vocabulary fallback.
#[derive(Debug, Clone)]
pub struct WordVectors {
    name: String,
    dimension: usize,
    vocabulary: HashMap<String, Vec<f32>>,
    fallback: HashedWordVectors,
}

impl WordVectors {
    /// Build from an in-memory vocabulary.
    pub fn new(
        name: impl Into<String>,
        dimension: usize,
        vocabulary: HashMap<String, Vec<f32>>,
    ) -> Result<Self, EmbeddingError> {
        if dimension == 0 {
            return Err(EmbeddingError::InvalidInput(
                "dimension must be > 0".to_string(),
            ));
        }
        if let Some(bad) = vocabulary.values().find(|v| v.len() != dimension) {
            return Err(EmbeddingError::DimensionMismatch {
                expected: dimension,
                actual: bad.len(),
            });
        }
        Ok(Self {
            name: format!("vectors:{}", name.into()),
            dimension,
            vocabulary,
            fallback: HashedWordVectors::new(dimension),
        })
    }

    /// Load a vocabulary file from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, EmbeddingError> {
        let path = path.as_ref();
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "custom".to_string());
        info!(path = ?path, "Loading word vectors");
        let file = File::open(path)?;
        Self::from_reader(name, BufReader::new(file))
    }

    /// Parse a vocabulary from any buffered reader.
    pub fn from_reader(name: impl Into<String>, reader: impl BufRead) -> Result<Self, EmbeddingError> {
        let mut vocabulary = HashMap::new();
        let mut dimension: Option<usize> = None;

        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            let mut fields = line.split_whitespace();
            let Some(word) = fields.next() else {
                continue;
            };
            let rest: Vec<&str> = fields.collect();

            if index == 0 && rest.len() == 1 && is_word2vec_header(word, rest[0]) {
                debug!("Skipping word2vec header line");
                continue;
            }

            let vector = rest
                .iter()
                .map(|f| f.parse::<f32>())
                .collect::<Result<Vec<f32>, _>>()
                .map_err(|e| {
                    EmbeddingError::InvalidInput(format!("line {}: {}", index + 1, e))
                })?;

            match dimension {
                None => dimension = Some(vector.len()),
                Some(expected) if expected != vector.len() => {
                    return Err(EmbeddingError::DimensionMismatch {
                        expected,
                        actual: vector.len(),
                    });
                }
                Some(_) => {}
            }
            vocabulary.insert(word.to_string(), vector);
        }

        let dimension = dimension
            .ok_or_else(|| EmbeddingError::InvalidInput("no vectors found".to_string()))?;
        info!(words = vocabulary.len(), dimension, "Loaded word vectors");
        Self::new(name, dimension, vocabulary)
    }

    /// Number of words in the vocabulary.
    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn contains(&self, word: &str) -> bool {
        self.vocabulary.contains_key(word)
    }

    /// Vector for one word, falling back to the hashed vector when unknown.
    pub fn word_vector(&self, word: &str) -> Vec<f32> {
        match self.vocabulary.get(word) {
            Some(v) => v.clone(),
            None => self.fallback.token_vector(word),
        }
    }
}

fn is_word2vec_header(first: &str, second: &str) -> bool {
    first.parse::<usize>().is_ok() && second.parse::<usize>().is_ok()
}

impl Representation for WordVectors {
    fn name(&self) -> &str {
        &self.name
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn represent(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        mean_vector(
            text.split_whitespace().map(|w| self.word_vector(w)),
            self.dimension,
        )
    }
}
