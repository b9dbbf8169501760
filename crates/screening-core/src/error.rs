use std::path::PathBuf;
use thiserror::Error;

/// Startup failures: nothing can be scored until these are fixed.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("Model file not found. Upload {file} in the app folder or model_artifacts/.")]
    ModelNotFound { file: String, searched: Vec<PathBuf> },

    #[error("Feature columns file not found. Upload {file} in the app folder or model_artifacts/.")]
    SchemaNotFound { file: String, searched: Vec<PathBuf> },

    #[error("read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid model artifact: {0}")]
    InvalidModel(String),

    #[error("invalid feature schema: {0}")]
    InvalidSchema(String),

    #[error("invalid feature mapping: {0}")]
    InvalidMapping(String),
}

/// Per-request failures. The caller renders these and stays up.
#[derive(Debug, Error)]
pub enum ScreeningError {
    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("{field} is not a finite number")]
    NonFiniteValue { field: String },

    #[error("X has {got} features, but the model is expecting {expected} features as input")]
    ShapeMismatch { expected: usize, got: usize },

    #[error("model inference failed: {0}")]
    Model(String),
}
