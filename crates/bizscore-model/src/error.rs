use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("failed to read model artifact {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("model artifact is not valid json: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("unsupported artifact format_version {found} (supported: {supported})")]
    UnsupportedFormat { found: u32, supported: u32 },

    #[error("feature width mismatch: encoder produces {expected} columns, model expects {found}")]
    WidthMismatch { expected: usize, found: usize },

    #[error("industry vocabulary mismatch: {0}")]
    VocabularyMismatch(String),

    #[error("invalid model artifact: {0}")]
    InvalidArtifact(String),

    #[error("inference failed: {0}")]
    Inference(String),
}
