// error.rs - Crate error type

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DropError {
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("invalid curve table: {0}")]
    InvalidTable(String),

    #[error("invalid record: {0}")]
    InvalidRecord(String),

    #[error("invalid sketch: {0}")]
    InvalidSketch(String),

    #[error("unsupported color category: {0}")]
    UnsupportedColorCategory(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[cfg(feature = "onnx")]
    #[error("inference failed: {0}")]
    Inference(String),
}

pub type Result<T> = std::result::Result<T, DropError>;

/// Attach a path to an io error.
pub(crate) fn io_at(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> DropError {
    let path = path.into();
    move |source| DropError::Io { path, source }
}
