use crate::error::{PipelineError, Result};
use crate::models::{PosClass, TaggedToken};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

#[async_trait]
pub trait MorphTagger {
    /// Tags `text`, returning tokens in the order they appear.
    async fn tag(&self, text: &str) -> Result<Vec<TaggedToken>>;
}

/// Keeps tagged tokens whose class is accepted and joins their surfaces.
#[derive(Debug, Clone)]
pub struct TokenFilter {
    accepted: Vec<PosClass>,
}

impl TokenFilter {
    pub fn new(accepted: Vec<PosClass>) -> Self {
        Self { accepted }
    }

    pub fn accepts(&self, class: PosClass) -> bool {
        self.accepted.contains(&class)
    }

    pub fn join(&self, tokens: &[TaggedToken]) -> String {
        tokens
            .iter()
            .filter(|token| self.accepts(token.class))
            .map(|token| token.surface.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub async fn extract_tokens<T>(&self, tagger: &T, text: &str) -> Result<String>
    where
        T: MorphTagger + Sync + ?Sized,
    {
        let tokens = tagger.tag(text).await?;
        Ok(self.join(&tokens))
    }
}

impl Default for TokenFilter {
    fn default() -> Self {
        Self::new(vec![PosClass::Noun, PosClass::Foreign])
    }
}

#[derive(Debug, Clone, Serialize)]
struct TagRequest<'a> {
    text: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
struct TagResponse {
    #[serde(default)]
    tokens: Vec<TagPair>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum TagPair {
    Object { surface: String, tag: String },
    Tuple(String, String),
}

impl From<TagPair> for TaggedToken {
    fn from(value: TagPair) -> Self {
        match value {
            TagPair::Object { surface, tag } | TagPair::Tuple(surface, tag) => {
                TaggedToken::new(surface, tag)
            }
        }
    }
}

/// Client for a morphological analyzer served over HTTP.
pub struct HttpMorphTagger {
    client: Client,
    endpoint: String,
}

impl HttpMorphTagger {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl MorphTagger for HttpMorphTagger {
    async fn tag(&self, text: &str) -> Result<Vec<TaggedToken>> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&TagRequest { text })
            .send()
            .await
            .map_err(|error| PipelineError::Tagging(error.to_string()))?;

        if !response.status().is_success() {
            return Err(PipelineError::Tagging(format!(
                "tagger at {} returned {}",
                self.endpoint,
                response.status()
            )));
        }

        let payload: TagResponse = response
            .json()
            .await
            .map_err(|error| PipelineError::Tagging(error.to_string()))?;

        Ok(payload.tokens.into_iter().map(TaggedToken::from).collect())
    }
}
