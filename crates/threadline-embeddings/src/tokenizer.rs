//! Chat message tokenizer.
//!
//! Strips user mentions (`<@U024BE7LH>` and `<@U024BE7LH|name>`), lowercases,
//! splits on non-alphanumeric characters, removes stop words and applies a
//! light English suffix stemmer.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;
use sha2::{Digest, Sha256};

use crate::model::Tokenizer;

static MENTION: OnceLock<Option<Regex>> = OnceLock::new();

fn mention_pattern() -> Option<&'static Regex> {
    MENTION
        .get_or_init(|| Regex::new(r"<@[UW][A-Z0-9]+(\|[^>]*)?>").ok())
        .as_ref()
}

/// Common English stop words.
pub const ENGLISH_STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "has", "he", "in", "is", "it",
    "its", "of", "on", "or", "that", "the", "to", "was", "were", "will", "with", "this", "they",
    "but", "have", "had", "what", "when", "where", "who", "which", "why", "how", "all", "each",
    "every", "both", "few", "more", "most", "other", "some", "such", "no", "nor", "not", "only",
    "own", "same", "so", "than", "too", "very", "can", "just", "should", "now", "also", "been",
    "being", "do", "does", "did", "doing", "would", "could", "might", "must", "shall", "about",
    "we", "you", "your", "our", "their", "him", "her", "them", "me", "my", "i",
];

/// Tokenizer for chat text.
#[derive(Debug, Clone)]
pub struct MessageTokenizer {
    stop_words: HashSet<String>,
    stem: bool,
    name: String,
}

impl Default for MessageTokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageTokenizer {
    /// Stemming tokenizer without stop words.
    pub fn new() -> Self {
        Self {
            stop_words: HashSet::new(),
            stem: true,
            name: "message+stem".to_string(),
        }
    }

    /// Use the built-in English stop word list.
    pub fn with_english_stop_words(self) -> Self {
        self.with_stop_words(ENGLISH_STOP_WORDS.iter().copied())
    }

    /// Add stop words (compared after lowercasing).
    pub fn with_stop_words<'a>(mut self, words: impl IntoIterator<Item = &'a str>) -> Self {
        self.stop_words
            .extend(words.into_iter().map(|w| w.to_lowercase()));
        self.refresh_name();
        self
    }

    /// Enable or disable stemming.
    pub fn with_stemming(mut self, stem: bool) -> Self {
        self.stem = stem;
        self.refresh_name();
        self
    }

    fn refresh_name(&mut self) {
        let mut name = "message".to_string();
        if self.stem {
            name.push_str("+stem");
        }
        if !self.stop_words.is_empty() {
            name.push_str(&format!("+stop-{}", self.stop_words_digest()));
        }
        self.name = name;
    }

    /// First 8 hex digits of the SHA-256 of the sorted stop words.
    fn stop_words_digest(&self) -> String {
        let mut words: Vec<&str> = self.stop_words.iter().map(String::as_str).collect();
        words.sort_unstable();
        let mut hasher = Sha256::new();
        for word in words {
            hasher.update(word.as_bytes());
            hasher.update([0u8]);
        }
        let digest = hasher.finalize();
        digest[..4]
            .iter()
            .map(|byte| format!("{:02x}", byte))
            .collect()
    }

    /// Remove user mentions from the text.
    pub fn remove_mentions<'t>(&self, text: &'t str) -> std::borrow::Cow<'t, str> {
        match mention_pattern() {
            Some(re) => re.replace_all(text, ""),
            None => std::borrow::Cow::Borrowed(text),
        }
    }

    /// Whitespace-separated words, lowercased and trimmed of surrounding
    /// punctuation. Mentions removed; nothing else filtered.
    pub fn words(&self, text: &str) -> Vec<String> {
        self.remove_mentions(text)
            .split_whitespace()
            .map(|w| {
                w.trim_matches(|c: char| !c.is_alphanumeric())
                    .to_lowercase()
            })
            .filter(|w| !w.is_empty())
            .collect()
    }

    /// Alphanumeric tokens with stop words removed, before stemming.
    pub fn valid_tokens(&self, text: &str) -> Vec<String> {
        self.remove_mentions(text)
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|s| !s.is_empty())
            .filter(|s| !self.stop_words.contains(*s))
            .map(String::from)
            .collect()
    }
}

impl Tokenizer for MessageTokenizer {
    fn name(&self) -> &str {
        &self.name
    }

    fn tokenize(&self, text: &str) -> Vec<String> {
        let tokens = self.valid_tokens(text);
        if self.stem {
            tokens.into_iter().map(|t| stem(&t)).collect()
        } else {
            tokens
        }
    }
}

/// Strip common English inflectional suffixes.
///
/// Keeps at least three characters of stem so short words survive intact.
pub fn stem(word: &str) -> String {
    const RULES: &[(&str, &str)] = &[
        ("ingly", ""),
        ("edly", ""),
        ("ies", "y"),
        ("ing", ""),
        ("ed", ""),
        ("ly", ""),
        ("es", ""),
        ("s", ""),
    ];

    if !word.is_ascii() {
        return word.to_string();
    }
    for (suffix, replacement) in RULES {
        if let Some(base) = word.strip_suffix(suffix) {
            if base.len() >= 3 && !base.ends_with('s') {
                return format!("{}{}", base, replacement);
            }
        }
    }
    word.to_string()
}
