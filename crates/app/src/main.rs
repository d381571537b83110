mod logging;

use chrono::Utc;
use clap::Parser;
use news_keyword_core::{
    HttpKeywordModel, HttpMorphTagger, KeywordExtractor, KeywordPipeline, Normalizer,
    PipelineConfig, PipelineError, RunReport, RunSettings, SqliteStore, TokenFilter,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "news-keyword", version)]
struct Cli {
    /// JSON job configuration.
    #[arg(long, env = "NEWS_KEYWORD_CONFIG", default_value = "config.json")]
    config: PathBuf,

    /// Exit with a status code per failure kind instead of 0.
    #[arg(long, default_value_t = false)]
    strict_exit: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match PipelineConfig::load(&cli.config) {
        Ok(config) => config,
        Err(error) => {
            eprintln!("news-keyword: {error}");
            return exit_status(&error, cli.strict_exit);
        }
    };

    let _log_guard = match logging::install(&config.logging) {
        Ok(guard) => guard,
        Err(error) => {
            eprintln!("news-keyword: {error:#}");
            let error = PipelineError::Config(error.to_string());
            return exit_status(&error, cli.strict_exit);
        }
    };

    info!(
        version = env!("CARGO_PKG_VERSION"),
        started_at = %Utc::now().to_rfc3339(),
        config = %cli.config.display(),
        "news-keyword boot"
    );

    match run(&config).await {
        Ok(report) => {
            info!(
                loaded = report.loaded,
                written = report.written,
                elapsed_ms = report.elapsed.as_millis() as u64,
                "keyword run complete"
            );
            ExitCode::SUCCESS
        }
        Err(error) => {
            error!(kind = error.kind().as_str(), error = %error, "keyword run failed");
            exit_status(&error, cli.strict_exit)
        }
    }
}

async fn run(config: &PipelineConfig) -> Result<RunReport, PipelineError> {
    let store = SqliteStore::new(
        &config.database.path,
        &config.database.read_query,
        &config.database.update_query,
    );
    let tagger = HttpMorphTagger::new(&config.tagger.endpoint);
    let extractor = KeywordExtractor::new(
        HttpKeywordModel::new(&config.model.endpoint, &config.model.model),
        config.model.extraction_options(),
        config.pipeline.invocation,
    )?;
    let normalizer = Normalizer::new(&config.normalizer.rules())?;

    let pipeline = KeywordPipeline::new(
        store.clone(),
        tagger,
        extractor,
        store,
        normalizer,
        RunSettings {
            batch_size: config.pipeline.batch_size,
            min_document_chars: config.pipeline.min_document_chars,
            token_filter: TokenFilter::new(config.tagger.accepted.clone()),
        },
    )?;

    pipeline.run().await
}

fn exit_status(error: &PipelineError, strict: bool) -> ExitCode {
    ExitCode::from(status_code(error, strict))
}

/// A failed run exits 0 unless `strict` asks for the failure kind's code.
fn status_code(error: &PipelineError, strict: bool) -> u8 {
    if strict {
        error.kind().exit_code()
    } else {
        0
    }
}
