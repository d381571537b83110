use crate::aggregate::{aggregate, assemble_rows};
use crate::batching::batch;
use crate::error::{PipelineError, Result};
use crate::keywords::{KeywordExtractor, KeywordModel};
use crate::models::{Document, RunReport};
use crate::normalizer::Normalizer;
use crate::store::prepare_documents;
use crate::tokenizer::{MorphTagger, TokenFilter};
use crate::traits::{ArticleSource, KeywordSink};
use std::time::Instant;
use tracing::{debug, info, info_span, Instrument};
use uuid::Uuid;

const PREVIEW_ROWS: usize = 5;

#[derive(Debug, Clone)]
pub struct RunSettings {
    pub batch_size: usize,
    pub min_document_chars: usize,
    pub token_filter: TokenFilter,
}

/// Runs one load → clean → tag → extract → write-back pass over the store.
///
/// Rows are processed in load order and the first failure aborts the run
/// before anything is written.
pub struct KeywordPipeline<S, T, M, K> {
    source: S,
    tagger: T,
    extractor: KeywordExtractor<M>,
    sink: K,
    normalizer: Normalizer,
    settings: RunSettings,
}

impl<S, T, M, K> KeywordPipeline<S, T, M, K>
where
    S: ArticleSource + Send + Sync,
    T: MorphTagger + Send + Sync,
    M: KeywordModel + Send + Sync,
    K: KeywordSink + Send + Sync,
{
    pub fn new(
        source: S,
        tagger: T,
        extractor: KeywordExtractor<M>,
        sink: K,
        normalizer: Normalizer,
        settings: RunSettings,
    ) -> Result<Self> {
        if settings.batch_size == 0 {
            return Err(PipelineError::InvalidArgument(
                "batch size must be positive".to_string(),
            ));
        }

        Ok(Self {
            source,
            tagger,
            extractor,
            sink,
            normalizer,
            settings,
        })
    }

    pub async fn run(&self) -> Result<RunReport> {
        let run_id = Uuid::new_v4();
        self.run_stages()
            .instrument(info_span!("keyword_run", %run_id))
            .await
    }

    async fn run_stages(&self) -> Result<RunReport> {
        let started = Instant::now();
        let mut report = RunReport::default();

        info!("dataload start");
        let articles = self.source.load_articles().await?;
        report.loaded = articles.len();
        let documents = prepare_documents(articles);
        report.deduplicated = report.loaded - documents.len();
        info!(
            loaded = report.loaded,
            unique = documents.len(),
            "dataload end"
        );

        info!("normalizing article text");
        let normalized = self.normalize(documents);

        let min_chars = self.settings.min_document_chars;
        let before = normalized.len();
        let kept: Vec<Document> = normalized
            .into_iter()
            .filter(|document| document.text.chars().count() >= min_chars)
            .collect();
        report.filtered_short = before - kept.len();
        info!(
            kept = kept.len(),
            dropped = report.filtered_short,
            min_chars,
            "removed short documents"
        );

        info!("extracting nouns");
        let tokens = self.tokenize(&kept).await?;

        info!(mode = ?self.extractor.mode(), "extracting keywords");
        let mut keyword_sets = Vec::with_capacity(tokens.len());
        for (index, members) in batch(&tokens, self.settings.batch_size)?.enumerate() {
            debug!(batch = index, size = members.len(), "extracting batch");
            keyword_sets.extend(self.extractor.extract(members).await?);
            report.batches += 1;
        }
        report.extracted = keyword_sets.len();

        let rows = assemble_rows(&kept, aggregate(keyword_sets))?;
        info!(rows = rows.len(), "keywords aggregated");
        for row in rows.iter().take(PREVIEW_ROWS) {
            debug!(id = %row.id, keywords = %row.keywords, "keyword preview");
        }

        report.written = if rows.is_empty() {
            info!("no rows to update");
            0
        } else {
            self.sink.write_keywords(&rows).await?
        };
        info!(written = report.written, "update end");

        report.elapsed = started.elapsed();
        info!(elapsed_ms = report.elapsed.as_millis() as u64, "run finished");
        Ok(report)
    }

    fn normalize(&self, documents: Vec<Document>) -> Vec<Document> {
        documents
            .into_iter()
            .map(|document| Document {
                text: self.normalizer.normalize(&document.text),
                id: document.id,
            })
            .collect()
    }

    async fn tokenize(&self, documents: &[Document]) -> Result<Vec<String>> {
        let mut tokens = Vec::with_capacity(documents.len());
        for document in documents {
            let joined = self
                .settings
                .token_filter
                .extract_tokens(&self.tagger, &document.text)
                .await
                .map_err(|error| match error {
                    PipelineError::Tagging(details) => {
                        PipelineError::Tagging(format!("article {}: {details}", document.id))
                    }
                    other => other,
                })?;
            tokens.push(joined);
        }
        Ok(tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keywords::{ExtractionOptions, InvocationMode};
    use crate::models::{
        Article, ArticleId, KeywordResult, KeywordSet, OutputRow, PosClass, TaggedToken,
        NO_KEYWORDS_PLACEHOLDER,
    };
    use crate::normalizer::NormalizerRules;
    use async_trait::async_trait;
    use std::sync::Mutex;

    const BODY: &str = "정부는 오늘 산업 경쟁력 강화를 위한 종합 대책을 내놓았으며 시장은 이번 발표가 하반기 경기 회복에 긍정적인 영향을 줄 것으로 내다봤다";

    struct FixedSource {
        articles: Vec<Article>,
    }

    #[async_trait]
    impl ArticleSource for FixedSource {
        async fn load_articles(&self) -> Result<Vec<Article>> {
            Ok(self.articles.clone())
        }
    }

    /// Tags every word as a common noun; fails on request.
    #[derive(Default)]
    struct WordTagger {
        fail: bool,
    }

    #[async_trait]
    impl MorphTagger for WordTagger {
        async fn tag(&self, text: &str) -> Result<Vec<TaggedToken>> {
            if self.fail {
                return Err(PipelineError::Tagging("analyzer offline".to_string()));
            }
            Ok(text
                .split_whitespace()
                .map(|word| TaggedToken::new(word, "NNG"))
                .collect())
        }
    }

    /// Scores the second word above the first.
    #[derive(Default)]
    struct LeadingWordsModel {
        batch_sizes: Mutex<Vec<usize>>,
    }

    fn leading_words(document: &str) -> KeywordSet {
        document
            .split_whitespace()
            .take(2)
            .zip([0.1, 0.9])
            .map(|(word, score)| KeywordResult::new(word, score))
            .collect()
    }

    #[async_trait]
    impl KeywordModel for LeadingWordsModel {
        async fn extract_document(
            &self,
            document: &str,
            _options: &ExtractionOptions,
        ) -> Result<KeywordSet> {
            Ok(leading_words(document))
        }

        async fn extract_batch(
            &self,
            documents: &[String],
            _options: &ExtractionOptions,
        ) -> Result<Vec<KeywordSet>> {
            self.batch_sizes
                .lock()
                .expect("batch sizes lock")
                .push(documents.len());
            Ok(documents.iter().map(|doc| leading_words(doc)).collect())
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        rows: Mutex<Vec<OutputRow>>,
        calls: Mutex<usize>,
        fail: bool,
    }

    #[async_trait]
    impl KeywordSink for RecordingSink {
        async fn write_keywords(&self, rows: &[OutputRow]) -> Result<usize> {
            *self.calls.lock().expect("calls lock") += 1;
            if self.fail {
                return Err(PipelineError::DataSink("connection reset".to_string()));
            }
            self.rows.lock().expect("rows lock").extend_from_slice(rows);
            Ok(rows.len())
        }
    }

    fn article(id: i64, title: &str, content: &str) -> Article {
        Article {
            id: ArticleId::Int(id),
            title: title.to_string(),
            content: content.to_string(),
        }
    }

    fn sample_articles() -> Vec<Article> {
        vec![
            article(10, "반도체 수출", BODY),
            article(3, "금리 동결", "짧은 기사"),
            article(7, "nvidia gpu", BODY),
            article(10, "반도체 수출", BODY),
            article(1, "환율 급등", BODY),
        ]
    }

    fn default_settings() -> RunSettings {
        RunSettings {
            batch_size: 2,
            min_document_chars: 50,
            token_filter: TokenFilter::default(),
        }
    }

    fn pipeline_with(
        articles: Vec<Article>,
        tagger: WordTagger,
        sink: RecordingSink,
        mode: InvocationMode,
        settings: RunSettings,
    ) -> KeywordPipeline<FixedSource, WordTagger, LeadingWordsModel, RecordingSink> {
        let extractor = KeywordExtractor::new(
            LeadingWordsModel::default(),
            ExtractionOptions::default(),
            mode,
        )
        .expect("valid options");
        let normalizer = Normalizer::new(&NormalizerRules::default()).expect("rules compile");

        KeywordPipeline::new(
            FixedSource { articles },
            tagger,
            extractor,
            sink,
            normalizer,
            settings,
        )
        .expect("valid settings")
    }

    fn pipeline(
        articles: Vec<Article>,
        tagger: WordTagger,
        sink: RecordingSink,
        mode: InvocationMode,
    ) -> KeywordPipeline<FixedSource, WordTagger, LeadingWordsModel, RecordingSink> {
        pipeline_with(articles, tagger, sink, mode, default_settings())
    }

    #[tokio::test]
    async fn run_writes_ranked_keywords_under_article_ids() {
        let pipeline = pipeline(
            sample_articles(),
            WordTagger::default(),
            RecordingSink::default(),
            InvocationMode::PerBatch,
        );

        let report = pipeline.run().await.expect("run should succeed");

        assert_eq!(report.loaded, 5);
        assert_eq!(report.deduplicated, 1);
        assert_eq!(report.filtered_short, 1);
        assert_eq!(report.batches, 2);
        assert_eq!(report.extracted, 3);
        assert_eq!(report.written, 3);

        let rows = pipeline.sink.rows.lock().expect("rows lock").clone();
        assert_eq!(
            rows,
            vec![
                OutputRow {
                    id: ArticleId::Int(10),
                    keywords: "수출, 반도체".to_string(),
                },
                OutputRow {
                    id: ArticleId::Int(7),
                    keywords: "GPU, NVIDIA".to_string(),
                },
                OutputRow {
                    id: ArticleId::Int(1),
                    keywords: "급등, 환율".to_string(),
                },
            ]
        );
        assert_eq!(
            *pipeline
                .extractor
                .model()
                .batch_sizes
                .lock()
                .expect("batch sizes lock"),
            vec![2, 1]
        );
    }

    #[tokio::test]
    async fn document_mode_produces_the_same_rows() {
        let pipeline = pipeline(
            sample_articles(),
            WordTagger::default(),
            RecordingSink::default(),
            InvocationMode::PerDocument,
        );

        let report = pipeline.run().await.expect("run should succeed");
        let rows = pipeline.sink.rows.lock().expect("rows lock").clone();

        assert_eq!(report.written, 3);
        assert_eq!(rows[1].keywords, "GPU, NVIDIA");
        assert!(pipeline
            .extractor
            .model()
            .batch_sizes
            .lock()
            .expect("batch sizes lock")
            .is_empty());
    }

    #[tokio::test]
    async fn documents_without_tokens_get_the_placeholder() {
        let pipeline = pipeline_with(
            vec![article(5, "경제 동향", BODY)],
            WordTagger::default(),
            RecordingSink::default(),
            InvocationMode::PerBatch,
            RunSettings {
                token_filter: TokenFilter::new(vec![PosClass::Foreign]),
                ..default_settings()
            },
        );
        pipeline.run().await.expect("run should succeed");

        let rows = pipeline.sink.rows.lock().expect("rows lock").clone();
        assert_eq!(
            rows,
            vec![OutputRow {
                id: ArticleId::Int(5),
                keywords: NO_KEYWORDS_PLACEHOLDER.to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn tagging_failure_aborts_before_write_back() {
        let pipeline = pipeline(
            sample_articles(),
            WordTagger { fail: true },
            RecordingSink::default(),
            InvocationMode::PerBatch,
        );

        let error = pipeline.run().await.expect_err("tagging should fail");

        assert!(matches!(error, PipelineError::Tagging(ref details) if details.contains("article 10")));
        assert_eq!(*pipeline.sink.calls.lock().expect("calls lock"), 0);
    }

    #[tokio::test]
    async fn sink_failure_is_reported_as_data_sink_error() {
        let pipeline = pipeline(
            sample_articles(),
            WordTagger::default(),
            RecordingSink {
                fail: true,
                ..Default::default()
            },
            InvocationMode::PerBatch,
        );

        let error = pipeline.run().await.expect_err("sink should fail");
        assert!(matches!(error, PipelineError::DataSink(_)));
    }

    #[tokio::test]
    async fn nothing_is_written_when_every_document_is_short() {
        let pipeline = pipeline(
            vec![article(1, "속보", "짧다"), article(2, "단신", "")],
            WordTagger::default(),
            RecordingSink::default(),
            InvocationMode::PerBatch,
        );

        let report = pipeline.run().await.expect("run should succeed");

        assert_eq!(report.filtered_short, 2);
        assert_eq!(report.batches, 0);
        assert_eq!(report.written, 0);
        assert_eq!(*pipeline.sink.calls.lock().expect("calls lock"), 0);
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        let extractor = KeywordExtractor::new(
            LeadingWordsModel::default(),
            ExtractionOptions::default(),
            InvocationMode::PerBatch,
        )
        .expect("valid options");
        let normalizer = Normalizer::new(&NormalizerRules::default()).expect("rules compile");

        let result = KeywordPipeline::new(
            FixedSource {
                articles: Vec::new(),
            },
            WordTagger::default(),
            extractor,
            RecordingSink::default(),
            normalizer,
            RunSettings {
                batch_size: 0,
                ..default_settings()
            },
        );
        assert!(matches!(result, Err(PipelineError::InvalidArgument(_))));
    }
}
