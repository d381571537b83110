use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Phrase a keyword model reports when a document yields nothing usable.
pub const NO_KEYWORDS_SENTINEL: &str = "None Found";

/// Written in place of keywords for documents that produced none.
pub const NO_KEYWORDS_PLACEHOLDER: &str = "NONE KEYWORD";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArticleId {
    Int(i64),
    Text(String),
}

impl fmt::Display for ArticleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value),
        }
    }
}

impl From<i64> for ArticleId {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for ArticleId {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub id: ArticleId,
    pub title: String,
    pub content: String,
}

impl Article {
    pub fn working_text(&self) -> String {
        format!("{} {}", self.title, self.content)
    }
}

/// An article's text as it moves through the pipeline, keyed by its row id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Document {
    pub id: ArticleId,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PosClass {
    Noun,
    Foreign,
    Predicate,
    Modifier,
    Particle,
    Symbol,
    Other,
}

impl PosClass {
    /// Maps a Mecab-ko style tag (`NNG`, `SL`, `VV+EP`, ...) to its class.
    pub fn from_tag(tag: &str) -> Self {
        let tag = tag.trim();
        if tag == "SL" {
            return Self::Foreign;
        }

        match tag.chars().next() {
            Some('N') => Self::Noun,
            Some('V') => Self::Predicate,
            Some('M') => Self::Modifier,
            Some('J') => Self::Particle,
            Some('S') => Self::Symbol,
            _ => Self::Other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedToken {
    pub surface: String,
    pub tag: String,
    pub class: PosClass,
}

impl TaggedToken {
    pub fn new(surface: impl Into<String>, tag: impl Into<String>) -> Self {
        let tag = tag.into();
        Self {
            surface: surface.into(),
            class: PosClass::from_tag(&tag),
            tag,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordResult {
    pub phrase: String,
    pub score: Option<f64>,
}

impl KeywordResult {
    pub fn new(phrase: impl Into<String>, score: f64) -> Self {
        Self {
            phrase: phrase.into(),
            score: Some(score),
        }
    }

    pub fn sentinel() -> Self {
        Self {
            phrase: NO_KEYWORDS_SENTINEL.to_string(),
            score: None,
        }
    }
}

/// Ranked phrases for one document, in the order the model returned them.
pub type KeywordSet = Vec<KeywordResult>;

pub fn is_no_keywords(set: &[KeywordResult]) -> bool {
    matches!(set, [only] if only.phrase == NO_KEYWORDS_SENTINEL)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputRow {
    pub id: ArticleId,
    pub keywords: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub loaded: usize,
    pub deduplicated: usize,
    pub filtered_short: usize,
    pub batches: usize,
    pub extracted: usize,
    pub written: usize,
    pub elapsed: Duration,
}
