use crate::error::Result;
use crate::models::{Article, OutputRow};
use async_trait::async_trait;

#[async_trait]
pub trait ArticleSource {
    /// Runs the configured read query; rows come back in query order.
    async fn load_articles(&self) -> Result<Vec<Article>>;
}

#[async_trait]
pub trait KeywordSink {
    /// Writes every row or none of them. Returns the number of rows written.
    async fn write_keywords(&self, rows: &[OutputRow]) -> Result<usize>;
}
