use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("data source error: {0}")]
    DataSource(String),

    #[error("tagging error: {0}")]
    Tagging(String),

    #[error("extraction error: {0}")]
    Extraction(String),

    #[error("data sink error: {0}")]
    DataSink(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("invalid config: {0}")]
    Config(String),

    #[error("regex error: {0}")]
    RegexError(#[from] regex::Error),
}

/// Coarse classification used for logging and process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    DataSource,
    Tagging,
    Extraction,
    DataSink,
    InvalidArgument,
    Config,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DataSource => "data_source",
            Self::Tagging => "tagging",
            Self::Extraction => "extraction",
            Self::DataSink => "data_sink",
            Self::InvalidArgument => "invalid_argument",
            Self::Config => "config",
        }
    }

    pub fn exit_code(self) -> u8 {
        match self {
            Self::DataSource => 10,
            Self::Tagging => 11,
            Self::Extraction => 12,
            Self::DataSink => 13,
            Self::InvalidArgument => 14,
            Self::Config => 15,
        }
    }
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::DataSource(_) => ErrorKind::DataSource,
            Self::Tagging(_) => ErrorKind::Tagging,
            Self::Extraction(_) => ErrorKind::Extraction,
            Self::DataSink(_) => ErrorKind::DataSink,
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::Config(_) | Self::RegexError(_) => ErrorKind::Config,
        }
    }
}

pub type Result<T, E = PipelineError> = std::result::Result<T, E>;
