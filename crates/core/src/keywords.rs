//! Adapter around an external keyphrase model.
//!
//! The model owns ranking and diversification. This module only shapes the
//! request and checks that one result set comes back per document.

use crate::error::{PipelineError, Result};
use crate::models::{KeywordResult, KeywordSet};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionOptions {
    /// Inclusive (min, max) n-gram length of candidate phrases.
    pub ngram_range: (usize, usize),
    pub stop_words: String,
    /// Max-sum diversification over `nr_candidates` before keeping `top_n`.
    pub use_maxsum: bool,
    pub nr_candidates: usize,
    pub top_n: usize,
}

impl ExtractionOptions {
    pub fn validate(&self) -> Result<()> {
        let (min, max) = self.ngram_range;
        if min == 0 || min > max {
            return Err(PipelineError::InvalidArgument(format!(
                "ngram range ({min}, {max}) must satisfy 1 <= min <= max"
            )));
        }
        if self.top_n == 0 {
            return Err(PipelineError::InvalidArgument(
                "top_n must be positive".to_string(),
            ));
        }
        if self.use_maxsum && self.nr_candidates < self.top_n {
            return Err(PipelineError::InvalidArgument(format!(
                "nr_candidates {} is smaller than top_n {}",
                self.nr_candidates, self.top_n
            )));
        }
        Ok(())
    }
}

impl Default for ExtractionOptions {
    fn default() -> Self {
        Self {
            ngram_range: (1, 1),
            stop_words: "english".to_string(),
            use_maxsum: true,
            nr_candidates: 20,
            top_n: 5,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvocationMode {
    PerDocument,
    #[default]
    PerBatch,
}

#[async_trait]
pub trait KeywordModel {
    async fn extract_document(
        &self,
        document: &str,
        options: &ExtractionOptions,
    ) -> Result<KeywordSet>;

    /// One result set per document, in input order.
    async fn extract_batch(
        &self,
        documents: &[String],
        options: &ExtractionOptions,
    ) -> Result<Vec<KeywordSet>>;
}

pub struct KeywordExtractor<M> {
    model: M,
    options: ExtractionOptions,
    mode: InvocationMode,
}

impl<M> KeywordExtractor<M>
where
    M: KeywordModel + Send + Sync,
{
    pub fn new(model: M, options: ExtractionOptions, mode: InvocationMode) -> Result<Self> {
        options.validate()?;
        Ok(Self {
            model,
            options,
            mode,
        })
    }

    pub fn mode(&self) -> InvocationMode {
        self.mode
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub async fn extract(&self, documents: &[String]) -> Result<Vec<KeywordSet>> {
        if documents.is_empty() {
            return Ok(Vec::new());
        }

        let sets = match self.mode {
            InvocationMode::PerBatch => {
                self.model.extract_batch(documents, &self.options).await?
            }
            InvocationMode::PerDocument => {
                let mut sets = Vec::with_capacity(documents.len());
                for document in documents {
                    sets.push(self.model.extract_document(document, &self.options).await?);
                }
                sets
            }
        };

        if sets.len() != documents.len() {
            return Err(PipelineError::Extraction(format!(
                "model returned {} result sets for {} documents",
                sets.len(),
                documents.len()
            )));
        }

        Ok(sets
            .into_iter()
            .map(|set| {
                if set.is_empty() {
                    vec![KeywordResult::sentinel()]
                } else {
                    set
                }
            })
            .collect())
    }
}

#[derive(Debug, Clone, Serialize)]
struct ExtractRequest<'a> {
    model: &'a str,
    documents: &'a [String],
    keyphrase_ngram_range: (usize, usize),
    stop_words: &'a str,
    use_maxsum: bool,
    nr_candidates: usize,
    top_n: usize,
}

#[derive(Debug, Clone, Deserialize)]
struct ExtractResponse {
    keywords: Vec<Vec<(String, Option<f64>)>>,
}

/// Client for a keyphrase model served over HTTP, bound to one model id.
pub struct HttpKeywordModel {
    client: Client,
    endpoint: String,
    model: String,
}

impl HttpKeywordModel {
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
            model: model.into(),
        }
    }

    async fn request(
        &self,
        documents: &[String],
        options: &ExtractionOptions,
    ) -> Result<Vec<KeywordSet>> {
        let body = ExtractRequest {
            model: &self.model,
            documents,
            keyphrase_ngram_range: options.ngram_range,
            stop_words: &options.stop_words,
            use_maxsum: options.use_maxsum,
            nr_candidates: options.nr_candidates,
            top_n: options.top_n,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|error| PipelineError::Extraction(error.to_string()))?;

        if !response.status().is_success() {
            return Err(PipelineError::Extraction(format!(
                "keyword model at {} returned {}",
                self.endpoint,
                response.status()
            )));
        }

        let payload: ExtractResponse = response
            .json()
            .await
            .map_err(|error| PipelineError::Extraction(error.to_string()))?;

        Ok(payload_to_sets(payload))
    }
}

fn payload_to_sets(payload: ExtractResponse) -> Vec<KeywordSet> {
    payload
        .keywords
        .into_iter()
        .map(|set| {
            set.into_iter()
                .map(|(phrase, score)| KeywordResult { phrase, score })
                .collect()
        })
        .collect()
}

#[async_trait]
impl KeywordModel for HttpKeywordModel {
    async fn extract_document(
        &self,
        document: &str,
        options: &ExtractionOptions,
    ) -> Result<KeywordSet> {
        let documents = [document.to_string()];
        let mut sets = self.request(&documents, options).await?;
        if sets.len() != 1 {
            return Err(PipelineError::Extraction(format!(
                "expected one result set, got {}",
                sets.len()
            )));
        }
        Ok(sets.remove(0))
    }

    async fn extract_batch(
        &self,
        documents: &[String],
        options: &ExtractionOptions,
    ) -> Result<Vec<KeywordSet>> {
        self.request(documents, options).await
    }
}
