//! Chat message type.
//!
//! Messages are the unit of classification. Identity fields are fixed at
//! construction; the vector representation is computed lazily and cached
//! together with the id of the processor that produced it, so a change of
//! processor forces recomputation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TypesError;

/// Monotonic (or timestamp-derived) message identifier.
pub type MessageId = u64;

/// Cached vector representation of a message.
#[derive(Debug, Clone, PartialEq)]
struct CachedRepresentation {
    repr_id: String,
    vector: Vec<f32>,
}

/// A single chat message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    id: MessageId,
    author: String,
    text: String,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    team: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    channel: Option<String>,
    #[serde(skip)]
    representation: Option<CachedRepresentation>,
}

impl Message {
    /// Create a message without validation.
    pub fn new(id: MessageId, author: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id,
            author: author.into(),
            text: text.into(),
            timestamp: None,
            url: None,
            team: None,
            channel: None,
            representation: None,
        }
    }

    /// Create a message, rejecting blank text or author.
    pub fn try_new(
        id: MessageId,
        author: impl Into<String>,
        text: impl Into<String>,
    ) -> Result<Self, TypesError> {
        let msg = Self::new(id, author, text);
        msg.validate()?;
        Ok(msg)
    }

    /// Attach the source timestamp.
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Attach a permalink to the message.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Attach the owning team.
    pub fn with_team(mut self, team: impl Into<String>) -> Self {
        self.team = Some(team.into());
        self
    }

    /// Attach the channel the message was posted in.
    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = Some(channel.into());
        self
    }

    /// Check that required fields are present.
    pub fn validate(&self) -> Result<(), TypesError> {
        if self.text.trim().is_empty() {
            return Err(TypesError::MissingField("text"));
        }
        if self.author.trim().is_empty() {
            return Err(TypesError::MissingField("author"));
        }
        Ok(())
    }

    pub fn id(&self) -> MessageId {
        self.id
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamp
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn team(&self) -> Option<&str> {
        self.team.as_deref()
    }

    pub fn channel(&self) -> Option<&str> {
        self.channel.as_deref()
    }

    /// Number of whitespace-separated words in the text.
    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }

    /// Id of the processor that produced the cached representation, if any.
    pub fn repr_id(&self) -> Option<&str> {
        self.representation.as_ref().map(|r| r.repr_id.as_str())
    }

    /// Whether the cached representation was produced by `repr_id`.
    pub fn is_processed_by(&self, repr_id: &str) -> bool {
        self.repr_id() == Some(repr_id)
    }

    /// Cached representation, only if it was produced by `repr_id`.
    ///
    /// A stale cache (different processor) reads as `None`.
    pub fn representation_for(&self, repr_id: &str) -> Option<&[f32]> {
        self.representation
            .as_ref()
            .filter(|r| r.repr_id == repr_id)
            .map(|r| r.vector.as_slice())
    }

    /// Store a freshly computed representation, replacing any previous one.
    pub fn set_representation(&mut self, repr_id: impl Into<String>, vector: Vec<f32>) {
        self.representation = Some(CachedRepresentation {
            repr_id: repr_id.into(),
            vector,
        });
    }

    /// Drop the cached representation.
    pub fn clear_representation(&mut self) {
        self.representation = None;
    }
}
