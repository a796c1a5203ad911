//! Grammatical reply detection.
//!
//! Some messages continue the current conversation regardless of content:
//! one-word acknowledgements, or sentences opening with a conjunction or a
//! determiner ("and then...", "that one is broken"). These carry too little
//! semantic signal to score, so the classifier appends them to the most
//! recent topic directly.

use threadline_embeddings::{MessageTokenizer, Tokenizer};

/// Outcome of a reply check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyVerdict {
    pub is_reply: bool,
    pub reason: String,
}

impl ReplyVerdict {
    pub fn reply(reason: impl Into<String>) -> Self {
        Self {
            is_reply: true,
            reason: reason.into(),
        }
    }

    pub fn not_reply() -> Self {
        Self {
            is_reply: false,
            reason: "not a reply".to_string(),
        }
    }
}

/// Decides whether a message text continues the current conversation.
pub trait ReplyDetector: Send + Sync {
    fn detect(&self, text: &str) -> ReplyVerdict;
}

impl<F> ReplyDetector for F
where
    F: Fn(&str) -> ReplyVerdict + Send + Sync,
{
    fn detect(&self, text: &str) -> ReplyVerdict {
        self(text)
    }
}

/// Coordinating conjunctions (universal tag CONJ).
const CONJUNCTIONS: &[&str] = &["and", "but", "or", "nor", "so", "yet", "plus", "also"];

/// Wh-determiners (Penn tag WDT).
const WH_DETERMINERS: &[&str] = &["which", "whichever", "whatever", "what"];

/// Determiners (Penn tag DT).
const DETERMINERS: &[&str] = &[
    "the", "this", "that", "these", "those", "a", "an", "another", "both", "each", "either",
    "neither", "all", "some", "any", "no", "such",
];

/// Openers that acknowledge or answer the previous message.
const REPLY_STARTERS: &[&str] = &["ok", "k", "kk", "okay", "mine", "his", "hers", "theirs", "ours"];

/// Lexical reply detector.
///
/// Tag checks use closed word lists in place of a part-of-speech tagger;
/// the reason strings keep the tag names so diagnostics read the same.
#[derive(Debug, Clone, Default)]
pub struct GrammarReplyDetector {
    tokenizer: MessageTokenizer,
}

impl GrammarReplyDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tokenizer(tokenizer: MessageTokenizer) -> Self {
        Self { tokenizer }
    }
}

impl ReplyDetector for GrammarReplyDetector {
    fn detect(&self, text: &str) -> ReplyVerdict {
        let stemmed = self.tokenizer.tokenize(text);
        if stemmed.len() <= 1 {
            return ReplyVerdict::reply(format!("stemmed length of {}", stemmed.len()));
        }

        let words = self.tokenizer.words(text);
        let Some(first) = words.first().map(String::as_str) else {
            return ReplyVerdict::not_reply();
        };

        if CONJUNCTIONS.contains(&first) {
            return ReplyVerdict::reply("universal tag CONJ");
        }
        if WH_DETERMINERS.contains(&first) {
            return ReplyVerdict::reply("upenn tag WDT");
        }
        if DETERMINERS.contains(&first) {
            return ReplyVerdict::reply("upenn tag DT");
        }
        if REPLY_STARTERS.contains(&first) {
            return ReplyVerdict::reply(format!("reply starter {}", first));
        }
        ReplyVerdict::not_reply()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detect(text: &str) -> ReplyVerdict {
        GrammarReplyDetector::new().detect(text)
    }

    #[test]
    fn test_single_token_is_reply() {
        let verdict = detect("thanks!");
        assert!(verdict.is_reply);
        assert_eq!(verdict.reason, "stemmed length of 1");
    }

    #[test]
    fn test_mention_only_is_reply() {
        let verdict = detect("<@U024BE7LH>");
        assert!(verdict.is_reply);
        assert_eq!(verdict.reason, "stemmed length of 0");
    }

    #[test]
    fn test_conjunction_opener() {
        let verdict = detect("And the staging box is down too");
        assert!(verdict.is_reply);
        assert_eq!(verdict.reason, "universal tag CONJ");
    }

    #[test]
    fn test_wh_determiner_opener() {
        let verdict = detect("Which branch did you deploy?");
        assert!(verdict.is_reply);
        assert_eq!(verdict.reason, "upenn tag WDT");
    }

    #[test]
    fn test_determiner_opener() {
        let verdict = detect("That fix worked for me");
        assert!(verdict.is_reply);
        assert_eq!(verdict.reason, "upenn tag DT");
    }

    #[test]
    fn test_reply_starter() {
        let verdict = detect("ok. sounds good");
        assert!(verdict.is_reply);
        assert_eq!(verdict.reason, "reply starter ok");
    }

    #[test]
    fn test_plain_sentence_not_reply() {
        let verdict = detect("Deploying version two to production now");
        assert_eq!(verdict, ReplyVerdict::not_reply());
    }

    #[test]
    fn test_closure_detector() {
        let detector = |_: &str| ReplyVerdict::reply("starter ok");
        assert!(detector.detect("anything").is_reply);
    }
}
