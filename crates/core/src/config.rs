//! Job configuration, parsed and validated once at startup.

use crate::error::{PipelineError, Result};
use crate::keywords::{ExtractionOptions, InvocationMode};
use crate::models::PosClass;
use crate::normalizer::{NormalizerRules, RuleProfile};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

pub const DEFAULT_MIN_DOCUMENT_CHARS: usize = 50;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    pub database: DatabaseConfig,
    pub model: ModelConfig,
    pub tagger: TaggerConfig,
    pub pipeline: BatchConfig,
    #[serde(default)]
    pub normalizer: NormalizerConfig,
    #[serde(default)]
    pub logging: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    pub path: PathBuf,
    pub read_query: String,
    pub update_query: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelConfig {
    pub model: String,
    pub endpoint: String,
    pub ngram_range: (usize, usize),
    #[serde(default = "default_stop_words")]
    pub stop_words: String,
    #[serde(default = "default_true")]
    pub use_maxsum: bool,
    pub nr_candidates: usize,
    pub top_n: usize,
}

impl ModelConfig {
    pub fn extraction_options(&self) -> ExtractionOptions {
        ExtractionOptions {
            ngram_range: self.ngram_range,
            stop_words: self.stop_words.clone(),
            use_maxsum: self.use_maxsum,
            nr_candidates: self.nr_candidates,
            top_n: self.top_n,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TaggerConfig {
    pub endpoint: String,
    #[serde(default = "default_accepted_classes")]
    pub accepted: Vec<PosClass>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BatchConfig {
    pub batch_size: usize,
    #[serde(default = "default_min_document_chars")]
    pub min_document_chars: usize,
    #[serde(default)]
    pub invocation: InvocationMode,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NormalizerConfig {
    #[serde(default)]
    pub profile: RuleProfile,
    #[serde(default)]
    pub extra_literals: Vec<String>,
    /// Replaces the built-in rule set entirely when present.
    #[serde(default)]
    pub rules: Option<NormalizerRules>,
}

impl NormalizerConfig {
    pub fn rules(&self) -> NormalizerRules {
        self.rules
            .clone()
            .unwrap_or_else(|| NormalizerRules::for_profile(self.profile))
            .with_extra_literals(self.extra_literals.iter().cloned())
    }
}

/// Where the run log goes and how long rotated files are kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Logs go to stderr when unset.
    #[serde(default)]
    pub directory: Option<PathBuf>,
    #[serde(default = "default_log_prefix")]
    pub file_prefix: String,
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            directory: None,
            file_prefix: default_log_prefix(),
            retention_days: default_retention_days(),
        }
    }
}

fn default_stop_words() -> String {
    "english".to_string()
}

fn default_true() -> bool {
    true
}

fn default_accepted_classes() -> Vec<PosClass> {
    vec![PosClass::Noun, PosClass::Foreign]
}

fn default_min_document_chars() -> usize {
    DEFAULT_MIN_DOCUMENT_CHARS
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_prefix() -> String {
    "keyword".to_string()
}

fn default_retention_days() -> u32 {
    14
}

impl PipelineConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|error| {
            PipelineError::Config(format!("cannot read {}: {error}", path.display()))
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw)
            .map_err(|error| PipelineError::Config(error.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.database.read_query.trim().is_empty() {
            return Err(PipelineError::Config("database.read_query is empty".to_string()));
        }
        if self.database.update_query.trim().is_empty() {
            return Err(PipelineError::Config(
                "database.update_query is empty".to_string(),
            ));
        }
        if self.model.model.trim().is_empty() {
            return Err(PipelineError::Config("model.model is empty".to_string()));
        }
        Url::parse(&self.model.endpoint).map_err(|error| {
            PipelineError::Config(format!("model.endpoint {}: {error}", self.model.endpoint))
        })?;
        Url::parse(&self.tagger.endpoint).map_err(|error| {
            PipelineError::Config(format!("tagger.endpoint {}: {error}", self.tagger.endpoint))
        })?;
        if self.tagger.accepted.is_empty() {
            return Err(PipelineError::Config(
                "tagger.accepted must name at least one class".to_string(),
            ));
        }
        if self.pipeline.batch_size == 0 {
            return Err(PipelineError::Config(
                "pipeline.batch_size must be positive".to_string(),
            ));
        }
        if self.logging.file_prefix.trim().is_empty() {
            return Err(PipelineError::Config("logging.file_prefix is empty".to_string()));
        }
        self.model
            .extraction_options()
            .validate()
            .map_err(|error| PipelineError::Config(format!("model: {error}")))?;
        Ok(())
    }
}
