use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Document is not well-formed markup: {0}")]
    Parse(#[from] roxmltree::Error),

    #[error("Invalid configuration value for {field}: {details}")]
    InvalidConfig { field: String, details: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ReportError>;
