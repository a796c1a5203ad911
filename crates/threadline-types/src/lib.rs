//! # threadline-types
//!
//! Shared domain types for the threadline topic segmenter.
//!
//! - Messages: immutable chat records with a lazily computed vector
//!   representation tagged by the processor that produced it
//! - Errors: validation failures for message construction
//!
//! ## Usage
//!
//! ```rust
//! use threadline_types::Message;
//!
//! let msg = Message::new(1, "alice", "deploy is green");
//! assert!(msg.representation_for("any").is_none());
//! ```

pub mod error;
pub mod message;

pub use error::TypesError;
pub use message::{Message, MessageId};
