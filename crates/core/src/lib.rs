pub mod aggregate;
pub mod batching;
pub mod config;
pub mod error;
pub mod keywords;
pub mod models;
pub mod normalizer;
pub mod pipeline;
pub mod store;
pub mod tokenizer;
pub mod traits;

pub use aggregate::{aggregate, assemble_rows, format_keywords, KEYWORD_DELIMITER};
pub use batching::{batch, batch_count};
pub use config::{
    BatchConfig, DatabaseConfig, LogConfig, ModelConfig, NormalizerConfig, PipelineConfig,
    TaggerConfig,
};
pub use error::{ErrorKind, PipelineError};
pub use keywords::{ExtractionOptions, HttpKeywordModel, InvocationMode, KeywordExtractor, KeywordModel};
pub use models::{
    Article, ArticleId, Document, KeywordResult, KeywordSet, OutputRow, PosClass, RunReport,
    TaggedToken, NO_KEYWORDS_PLACEHOLDER, NO_KEYWORDS_SENTINEL,
};
pub use normalizer::{Normalizer, NormalizerRules, RewriteRule, RuleProfile};
pub use pipeline::{KeywordPipeline, RunSettings};
pub use store::{prepare_documents, SqliteStore};
pub use tokenizer::{HttpMorphTagger, MorphTagger, TokenFilter};
pub use traits::{ArticleSource, KeywordSink};
