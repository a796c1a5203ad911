//! # threadline-embeddings
//!
//! Pluggable capabilities the topic classifier consumes:
//!
//! - [`Representation`]: text to fixed-length vector
//! - [`Similarity`]: pair of vectors to a score in [0, 1]
//! - [`Tokenizer`]: text cleaning applied ahead of the representation
//! - [`Processor`]: tokenizer + representation composed into one function,
//!   whose id keys the per-message representation cache
//!
//! Concrete strategies are provided for offline use: a mention-aware
//! tokenizer, deterministic hashed word vectors, GloVe-format vocabularies
//! with hashed fallback for unknown words, and clamped cosine similarity.

pub mod error;
pub mod hashed;
pub mod model;
pub mod similarity;
pub mod tokenizer;
pub mod vectors;

pub use error::EmbeddingError;
pub use hashed::HashedWordVectors;
pub use model::{Processor, Representation, Similarity, Tokenizer};
pub use similarity::CosineSimilarity;
pub use tokenizer::MessageTokenizer;
pub use vectors::WordVectors;
