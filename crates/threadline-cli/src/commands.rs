//! Command implementations for the threadline runner.
//!
//! Handles:
//! - classify: load settings, extract messages, classify each channel
//!   independently, write a JSON report
//! - config: print the merged settings

use std::collections::BTreeMap;
use std::fs;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use threadline_embeddings::{
    CosineSimilarity, HashedWordVectors, MessageTokenizer, Representation, WordVectors,
};
use threadline_topics::{
    DecisionPolicy, ElasticConfig, GrammarReplyDetector, SimilarityScorer, StreamReport,
    ThresholdConfig, TimeDecayConfig, Topic, TopicClassifier, TopicId,
};
use threadline_types::{Message, MessageId};

use crate::cli::{ClassifyArgs, PolicyArg};
use crate::extract::JsonLinesExtractor;
use crate::settings::Settings;

/// Channel name used for messages that carry none.
pub const NO_CHANNEL: &str = "(none)";

/// One message as reported.
#[derive(Debug, Clone, Serialize)]
pub struct MessageReport {
    pub id: MessageId,
    pub author: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    pub reason: String,
}

/// One topic as reported.
#[derive(Debug, Clone, Serialize)]
pub struct TopicReport {
    pub topic_id: TopicId,
    /// True when the topic had left the window before the run ended
    pub evicted: bool,
    pub start_message: MessageId,
    pub size: usize,
    pub authors: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_touched: Option<DateTime<Utc>>,
    pub messages: Vec<MessageReport>,
}

impl TopicReport {
    pub fn from_topic(topic: &Topic, evicted: bool) -> Self {
        Self {
            topic_id: topic.id().clone(),
            evicted,
            start_message: topic.start_message().id(),
            size: topic.size(),
            authors: topic.authors().into_iter().map(String::from).collect(),
            last_touched: topic.last_touched(),
            messages: topic
                .entries()
                .iter()
                .map(|entry| MessageReport {
                    id: entry.message.id(),
                    author: entry.message.author().to_string(),
                    text: entry.message.text().to_string(),
                    timestamp: entry.message.timestamp(),
                    reason: entry.reason.clone(),
                })
                .collect(),
        }
    }
}

/// Result of classifying one channel.
#[derive(Debug, Clone, Serialize)]
pub struct ChannelReport {
    pub channel: String,
    pub stats: StreamReport,
    /// Window topics most recent first, then evicted topics most recent first
    pub topics: Vec<TopicReport>,
}

/// Result of a `classify` run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub processor: String,
    pub policy: String,
    pub input_rejected: usize,
    pub input_filtered: usize,
    pub channels: Vec<ChannelReport>,
}

/// Per-channel report shaping.
#[derive(Debug, Clone, Copy)]
pub struct ReportOptions {
    pub max_messages: Option<usize>,
    pub include_evicted: bool,
    pub min_topic_size: usize,
}

impl From<&ClassifyArgs> for ReportOptions {
    fn from(args: &ClassifyArgs) -> Self {
        Self {
            max_messages: args.max_messages,
            include_evicted: args.include_evicted,
            min_topic_size: args.min_topic_size,
        }
    }
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured level.
pub fn init_tracing(log_level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")
}

/// Apply `classify` flags on top of loaded settings.
pub fn apply_overrides(settings: &mut Settings, args: &ClassifyArgs) -> Result<()> {
    let classifier = &mut settings.classifier;
    if let Some(capacity) = args.capacity {
        classifier.window_capacity = Some(capacity);
    }
    if let Some(max_active) = args.max_active_topics {
        classifier.max_active_topics = max_active;
    }
    match args.policy {
        Some(PolicyArg::Elastic) if !matches!(classifier.policy, DecisionPolicy::Elastic(_)) => {
            classifier.policy = DecisionPolicy::Elastic(ElasticConfig::default());
        }
        Some(PolicyArg::Threshold)
            if !matches!(classifier.policy, DecisionPolicy::GlobalThreshold(_)) =>
        {
            classifier.policy = DecisionPolicy::GlobalThreshold(ThresholdConfig::default());
        }
        _ => {}
    }
    if let Some(threshold) = args.threshold {
        match &mut classifier.policy {
            DecisionPolicy::GlobalThreshold(cfg) => cfg.similarity_threshold = threshold,
            DecisionPolicy::Elastic(_) => {
                warn!(threshold, "--threshold only applies to the threshold policy, ignoring")
            }
        }
    }
    if let Some(within_secs) = args.time_decay_secs {
        classifier.time_decay = Some(TimeDecayConfig { within_secs });
    }
    if args.no_replies {
        settings.detect_replies = false;
    }
    if let Some(min_words) = args.min_words {
        settings.extraction.min_words = min_words;
    }
    if let Some(vectors) = &args.vectors {
        settings.embedding.vectors_path = Some(vectors.clone());
    }
    settings.validate()
}

/// Assemble the classifier described by `settings`.
pub fn build_classifier(settings: &Settings) -> Result<TopicClassifier> {
    let base_tokenizer = MessageTokenizer::new().with_stemming(settings.embedding.stemming);
    let tokenizer = if settings.embedding.stop_words {
        base_tokenizer.clone().with_english_stop_words()
    } else {
        base_tokenizer.clone()
    };

    let representation: Arc<dyn Representation> = match &settings.embedding.vectors_path {
        Some(path) => Arc::new(
            WordVectors::load(path).with_context(|| format!("Failed to load vectors {}", path))?,
        ),
        None => Arc::new(HashedWordVectors::new(settings.embedding.dimension)),
    };

    let scorer = SimilarityScorer::new(
        representation,
        Arc::new(CosineSimilarity),
        Some(Arc::new(tokenizer)),
    )?;
    let mut classifier = TopicClassifier::new(settings.classifier.clone(), Arc::new(scorer))?;
    // Reply detection always sees stop words
    if settings.detect_replies {
        classifier = classifier
            .with_reply_detector(Arc::new(GrammarReplyDetector::with_tokenizer(base_tokenizer)));
    }
    Ok(classifier)
}

/// Classify one channel's messages in a fresh window.
pub fn classify_channel<I>(
    classifier: &TopicClassifier,
    channel: String,
    messages: I,
    options: ReportOptions,
) -> Result<ChannelReport>
where
    I: IntoIterator<Item = Message>,
{
    let mut window = classifier.new_window();
    let mut evicted = Vec::new();
    let stats = classifier
        .classify_stream_with(&mut window, messages, options.max_messages, |topic| {
            if options.include_evicted {
                evicted.push(topic);
            }
        })
        .with_context(|| format!("Classification failed for channel {}", channel))?;

    let topics = window
        .iter()
        .map(|t| TopicReport::from_topic(t, false))
        .chain(evicted.iter().rev().map(|t| TopicReport::from_topic(t, true)))
        .filter(|t| t.size >= options.min_topic_size)
        .collect();

    Ok(ChannelReport {
        channel,
        stats,
        topics,
    })
}

/// Classification task for one channel, fed as input is read.
struct ChannelWorker {
    sender: Option<mpsc::UnboundedSender<Message>>,
    sent: usize,
    handle: JoinHandle<Result<ChannelReport>>,
}

impl ChannelWorker {
    fn spawn(classifier: Arc<TopicClassifier>, channel: String, options: ReportOptions) -> Self {
        debug!(channel = %channel, "Starting channel worker");
        let (sender, mut receiver) = mpsc::unbounded_channel();
        let handle = tokio::task::spawn_blocking(move || {
            let messages = std::iter::from_fn(move || receiver.blocking_recv());
            classify_channel(&classifier, channel, messages, options)
        });
        Self {
            sender: Some(sender),
            sent: 0,
            handle,
        }
    }

    /// Forward a message; the sender closes once the worker stops pulling
    /// or `max_messages` have been forwarded.
    fn send(&mut self, message: Message, max_messages: Option<usize>) {
        let Some(sender) = &self.sender else {
            return;
        };
        if sender.send(message).is_err() {
            self.sender = None;
            return;
        }
        self.sent += 1;
        if max_messages.is_some_and(|max| self.sent >= max) {
            self.sender = None;
        }
    }

    /// Close the input and hand back the task.
    fn finish(self) -> JoinHandle<Result<ChannelReport>> {
        self.handle
    }
}

/// Route extracted messages to one worker per channel as they are read.
fn dispatch_messages<I>(
    classifier: &Arc<TopicClassifier>,
    messages: I,
    options: ReportOptions,
) -> BTreeMap<String, ChannelWorker>
where
    I: IntoIterator<Item = Message>,
{
    let mut workers: BTreeMap<String, ChannelWorker> = BTreeMap::new();
    for message in messages {
        let channel = message.channel().unwrap_or(NO_CHANNEL).to_string();
        let worker = workers.entry(channel.clone()).or_insert_with(|| {
            ChannelWorker::spawn(Arc::clone(classifier), channel, options)
        });
        worker.send(message, options.max_messages);
    }
    workers
}

/// Run `classify` with fully resolved settings.
///
/// Input is read on the blocking pool and streamed to one worker per
/// channel; each worker owns its window and the scorer is shared read-only.
pub async fn run_classify(settings: &Settings, args: &ClassifyArgs) -> Result<RunReport> {
    let classifier = Arc::new(build_classifier(settings)?);
    let options = ReportOptions::from(args);

    let mut extractor = JsonLinesExtractor::open(&args.input, settings.extraction.min_words)?;
    let reader_classifier = Arc::clone(&classifier);
    let (workers, extractor) = tokio::task::spawn_blocking(move || {
        let workers = dispatch_messages(&reader_classifier, extractor.by_ref(), options);
        (workers, extractor)
    })
    .await
    .context("Input task failed")?;
    info!(
        channels = workers.len(),
        rejected = extractor.rejected(),
        filtered = extractor.filtered(),
        "Extracted messages"
    );

    let handles: Vec<_> = workers.into_values().map(ChannelWorker::finish).collect();
    let mut reports = Vec::with_capacity(handles.len());
    for handle in handles {
        reports.push(handle.await.context("Channel task failed")??);
    }

    Ok(RunReport {
        processor: classifier.scorer().processor().id().to_string(),
        policy: classifier.config().policy.name().to_string(),
        input_rejected: extractor.rejected(),
        input_filtered: extractor.filtered(),
        channels: reports,
    })
}

/// `threadline classify`
pub async fn handle_classify(
    config_path: Option<&str>,
    log_level_override: Option<&str>,
    args: ClassifyArgs,
) -> Result<()> {
    let mut settings = Settings::load(config_path).context("Failed to load configuration")?;
    if let Some(log_level) = log_level_override {
        settings.log_level = log_level.to_string();
    }
    init_tracing(&settings.log_level)?;
    apply_overrides(&mut settings, &args)?;

    info!(input = ?args.input, policy = settings.classifier.policy.name(), "Classifying");
    let report = run_classify(&settings, &args).await?;
    let json = serde_json::to_string_pretty(&report).context("Failed to render report")?;

    match &args.output {
        Some(path) => {
            fs::write(path, json).with_context(|| format!("Failed to write {:?}", path))?;
            info!(output = ?path, "Wrote report");
        }
        None => println!("{}", json),
    }
    Ok(())
}

/// `threadline config`
pub fn handle_config(config_path: Option<&str>) -> Result<()> {
    let settings = Settings::load(config_path).context("Failed to load configuration")?;
    print!("{}", settings.to_toml()?);
    Ok(())
}
