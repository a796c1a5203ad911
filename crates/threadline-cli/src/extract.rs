//! JSON-lines message extraction.
//!
//! One chat message per line:
//!
//! ```json
//! {"id": 7, "user": "U024BE7LH", "text": "deploy is red", "ts": "1476312442.000002", "channel": "ops"}
//! ```
//!
//! `anon_text` is preferred over `text` when both are present, `author` is
//! accepted for `user`, and `ts` may be a string or a number of seconds.
//! Lines without an `id` take their 1-based line number. Malformed lines are
//! logged and dropped here so the classifier only sees valid messages.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use threadline_types::{Message, MessageId, TypesError};

/// Why a line was dropped.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid message: {0}")]
    Message(#[from] TypesError),

    #[error("Invalid timestamp: {0}")]
    Timestamp(String),
}

#[derive(Debug, Deserialize)]
struct RawRecord {
    #[serde(default)]
    id: Option<MessageId>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    anon_text: Option<String>,
    #[serde(default)]
    user: Option<String>,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    ts: Option<Value>,
    #[serde(default)]
    channel: Option<String>,
    #[serde(default)]
    team: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

/// Parse a Slack-style `ts` ("1476312442.000002" or 1476312442.5).
pub fn parse_timestamp(value: &Value) -> Result<DateTime<Utc>, ExtractError> {
    let secs = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|s| s.is_finite() && *s >= 0.0)
    .ok_or_else(|| ExtractError::Timestamp(value.to_string()))?;

    let micros = (secs * 1_000_000.0).round() as i64;
    DateTime::from_timestamp_micros(micros).ok_or_else(|| ExtractError::Timestamp(value.to_string()))
}

/// Parse one line into a message; `line_no` is the fallback id.
pub fn parse_line(line: &str, line_no: u64) -> Result<Message, ExtractError> {
    let raw: RawRecord = serde_json::from_str(line)?;

    let text = raw.anon_text.or(raw.text).unwrap_or_default();
    let author = raw.user.or(raw.author).unwrap_or_default();
    let mut message = Message::try_new(raw.id.unwrap_or(line_no), author, text)?;

    if let Some(ts) = raw.ts.as_ref().filter(|v| !v.is_null()) {
        message = message.with_timestamp(parse_timestamp(ts)?);
    }
    if let Some(channel) = raw.channel {
        message = message.with_channel(channel);
    }
    if let Some(team) = raw.team {
        message = message.with_team(team);
    }
    if let Some(url) = raw.url {
        message = message.with_url(url);
    }
    Ok(message)
}

/// Lazy message stream over a JSON-lines reader.
pub struct JsonLinesExtractor<R> {
    reader: R,
    min_words: usize,
    line_no: u64,
    rejected: usize,
    filtered: usize,
}

impl JsonLinesExtractor<BufReader<File>> {
    /// Open a JSON-lines file.
    pub fn open(path: impl AsRef<Path>, min_words: usize) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).with_context(|| format!("Failed to open {:?}", path))?;
        Ok(Self::new(BufReader::new(file), min_words))
    }
}

impl<R: BufRead> JsonLinesExtractor<R> {
    pub fn new(reader: R, min_words: usize) -> Self {
        Self {
            reader,
            min_words,
            line_no: 0,
            rejected: 0,
            filtered: 0,
        }
    }

    /// Lines dropped as malformed so far.
    pub fn rejected(&self) -> usize {
        self.rejected
    }

    /// Valid messages dropped by the `min_words` filter so far.
    pub fn filtered(&self) -> usize {
        self.filtered
    }
}

impl<R: BufRead> Iterator for JsonLinesExtractor<R> {
    type Item = Message;

    fn next(&mut self) -> Option<Message> {
        let mut line = String::new();
        loop {
            line.clear();
            match self.reader.read_line(&mut line) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(e) => {
                    warn!(line = self.line_no + 1, error = %e, "Failed to read input, stopping");
                    return None;
                }
            }
            self.line_no += 1;

            if line.trim().is_empty() {
                continue;
            }

            match parse_line(&line, self.line_no) {
                Ok(message) if message.word_count() < self.min_words => {
                    debug!(message_id = message.id(), "Message below min_words");
                    self.filtered += 1;
                }
                Ok(message) => return Some(message),
                Err(e) => {
                    warn!(line = self.line_no, error = %e, "Rejected input line");
                    self.rejected += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_full_record() {
        let line = r#"{"id": 3, "user": "U1", "text": "hello there", "ts": "1476312442.5", "channel": "ops", "team": "T1", "url": "https://x/p3"}"#;
        let msg = parse_line(line, 99).unwrap();
        assert_eq!(msg.id(), 3);
        assert_eq!(msg.author(), "U1");
        assert_eq!(msg.text(), "hello there");
        assert_eq!(msg.timestamp().unwrap().timestamp_millis(), 1_476_312_442_500);
        assert_eq!(msg.channel(), Some("ops"));
        assert_eq!(msg.team(), Some("T1"));
        assert_eq!(msg.url(), Some("https://x/p3"));
    }

    #[test]
    fn test_anon_text_preferred() {
        let line = r#"{"author": "bob", "text": "raw", "anon_text": "anonymized"}"#;
        let msg = parse_line(line, 4).unwrap();
        assert_eq!(msg.text(), "anonymized");
        assert_eq!(msg.author(), "bob");
        assert_eq!(msg.id(), 4);
        assert!(msg.timestamp().is_none());
    }

    #[test]
    fn test_numeric_timestamp() {
        let ts = parse_timestamp(&json!(1476312442)).unwrap();
        assert_eq!(ts.timestamp(), 1_476_312_442);
        assert!(parse_timestamp(&json!("soon")).is_err());
        assert!(parse_timestamp(&json!(-5)).is_err());
    }

    #[test]
    fn test_missing_text_rejected() {
        let err = parse_line(r#"{"user": "U1", "text": "   "}"#, 1).unwrap_err();
        assert!(matches!(err, ExtractError::Message(TypesError::MissingField("text"))));
    }

    #[test]
    fn test_missing_author_rejected() {
        let err = parse_line(r#"{"text": "hi"}"#, 1).unwrap_err();
        assert!(matches!(err, ExtractError::Message(TypesError::MissingField("author"))));
    }

    #[test]
    fn test_stream_skips_bad_lines() {
        let input = "{\"user\": \"a\", \"text\": \"one two three\"}\n\
                     not json\n\
                     \n\
                     {\"user\": \"b\", \"text\": \"short\"}\n\
                     {\"user\": \"c\", \"text\": \"four five six seven\"}\n";
        let mut extractor = JsonLinesExtractor::new(input.as_bytes(), 2);
        let ids: Vec<u64> = extractor.by_ref().map(|m| m.id()).collect();
        assert_eq!(ids, vec![1, 5]);
        assert_eq!(extractor.rejected(), 1);
        assert_eq!(extractor.filtered(), 1);
    }
}
