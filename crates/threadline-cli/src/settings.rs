//! Layered runner settings.
//!
//! Load order (later sources override earlier):
//! 1. Built-in defaults
//! 2. Config file (~/.config/threadline/config.{toml,json,...})
//! 3. CLI-specified config file
//! 4. Environment variables (THREADLINE_*, `__` between nested keys)
//!
//! CLI flags are applied by the caller after loading.

use std::path::PathBuf;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use threadline_embeddings::hashed::DEFAULT_DIMENSION;
use threadline_topics::ClassifierConfig;

/// Representation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingSettings {
    /// Dimension of hashed word vectors (ignored when `vectors_path` is set)
    #[serde(default = "default_dimension")]
    pub dimension: usize,

    /// GloVe-style vocabulary file; hashed vectors only when absent
    #[serde(default)]
    pub vectors_path: Option<String>,

    /// Drop common English words before representing; reply detection
    /// always sees them
    #[serde(default)]
    pub stop_words: bool,

    /// Apply suffix stemming before representing
    #[serde(default = "default_true")]
    pub stemming: bool,
}

fn default_dimension() -> usize {
    DEFAULT_DIMENSION
}

fn default_true() -> bool {
    true
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            dimension: default_dimension(),
            vectors_path: None,
            stop_words: false,
            stemming: true,
        }
    }
}

/// Input filtering applied by the extractor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionSettings {
    /// Messages with fewer whitespace-separated words are dropped; 0 keeps all
    #[serde(default)]
    pub min_words: usize,
}

/// Runner settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Append grammatical replies to the most recent topic
    #[serde(default = "default_true")]
    pub detect_replies: bool,

    #[serde(default)]
    pub embedding: EmbeddingSettings,

    #[serde(default)]
    pub extraction: ExtractionSettings,

    #[serde(default)]
    pub classifier: ClassifierConfig,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            detect_replies: true,
            embedding: EmbeddingSettings::default(),
            extraction: ExtractionSettings::default(),
            classifier: ClassifierConfig::default(),
        }
    }
}

impl Settings {
    /// Load settings from every layer and validate the result.
    pub fn load(cli_config_path: Option<&str>) -> Result<Self> {
        let default_config_path = ProjectDirs::from("", "", "threadline")
            .map(|p| p.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."))
            .join("config");

        let mut builder = Config::builder()
            .set_default("log_level", default_log_level())?
            .add_source(File::with_name(&default_config_path.to_string_lossy()).required(false));

        if let Some(path) = cli_config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // THREADLINE_LOG_LEVEL, THREADLINE_CLASSIFIER__MAX_ACTIVE_TOPICS, ...
        builder = builder.add_source(
            Environment::with_prefix("THREADLINE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings: Settings = builder
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Failed to parse configuration")?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject settings the classifier cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.embedding.dimension == 0 {
            anyhow::bail!("embedding.dimension must be at least 1");
        }
        self.classifier
            .validate()
            .context("Invalid classifier configuration")?;
        Ok(())
    }

    /// Render the effective settings as TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to render settings")
    }
}
