use crate::error::{PipelineError, Result};
use crate::models::{Article, ArticleId, Document, OutputRow};
use crate::traits::{ArticleSource, KeywordSink};
use async_trait::async_trait;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{params, Connection};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

impl FromSql for ArticleId {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value {
            ValueRef::Integer(id) => Ok(Self::Int(id)),
            ValueRef::Text(bytes) => std::str::from_utf8(bytes)
                .map(|id| Self::Text(id.to_string()))
                .map_err(|error| FromSqlError::Other(Box::new(error))),
            _ => Err(FromSqlError::InvalidType),
        }
    }
}

impl ToSql for ArticleId {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Self::Int(id) => ToSqlOutput::from(*id),
            Self::Text(id) => ToSqlOutput::from(id.as_str()),
        })
    }
}

/// Derives each article's working text and drops exact duplicate rows,
/// keeping the first occurrence.
pub fn prepare_documents(articles: Vec<Article>) -> Vec<Document> {
    let mut seen = HashSet::new();
    articles
        .into_iter()
        .map(|article| Document {
            text: article.working_text(),
            id: article.id,
        })
        .filter(|document| seen.insert(document.clone()))
        .collect()
}

/// Article table access through SQLite. The read query must return `id`,
/// `title` and `content` columns; the update query takes `(keywords, id)`.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    path: PathBuf,
    read_query: String,
    update_query: String,
}

impl SqliteStore {
    pub fn new(
        path: impl Into<PathBuf>,
        read_query: impl Into<String>,
        update_query: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            read_query: read_query.into(),
            update_query: update_query.into(),
        }
    }
}

fn read_articles(path: &Path, query: &str) -> rusqlite::Result<Vec<Article>> {
    let connection = Connection::open(path)?;
    let mut statement = connection.prepare(query)?;
    let rows = statement.query_map([], |row| {
        Ok(Article {
            id: row.get("id")?,
            title: row.get::<_, Option<String>>("title")?.unwrap_or_default(),
            content: row.get::<_, Option<String>>("content")?.unwrap_or_default(),
        })
    })?;
    rows.collect()
}

fn update_keywords(path: &Path, query: &str, rows: &[OutputRow]) -> Result<usize> {
    let sink_error = |error: rusqlite::Error| PipelineError::DataSink(error.to_string());

    let mut connection = Connection::open(path).map_err(sink_error)?;
    let transaction = connection.transaction().map_err(sink_error)?;
    {
        let mut statement = transaction.prepare(query).map_err(sink_error)?;
        if statement.parameter_count() != 2 {
            return Err(PipelineError::DataSink(format!(
                "update query takes {} parameters, expected (keywords, id)",
                statement.parameter_count()
            )));
        }
        for row in rows {
            statement
                .execute(params![row.keywords, row.id])
                .map_err(sink_error)?;
        }
    }
    transaction.commit().map_err(sink_error)?;

    Ok(rows.len())
}

#[async_trait]
impl ArticleSource for SqliteStore {
    async fn load_articles(&self) -> Result<Vec<Article>> {
        let path = self.path.clone();
        let query = self.read_query.clone();

        tokio::task::spawn_blocking(move || read_articles(&path, &query))
            .await
            .map_err(|error| PipelineError::DataSource(error.to_string()))?
            .map_err(|error| PipelineError::DataSource(error.to_string()))
    }
}

#[async_trait]
impl KeywordSink for SqliteStore {
    async fn write_keywords(&self, rows: &[OutputRow]) -> Result<usize> {
        if rows.is_empty() {
            return Ok(0);
        }

        let path = self.path.clone();
        let query = self.update_query.clone();
        let rows = rows.to_vec();

        tokio::task::spawn_blocking(move || update_keywords(&path, &query, &rows))
            .await
            .map_err(|error| PipelineError::DataSink(error.to_string()))?
    }
}
