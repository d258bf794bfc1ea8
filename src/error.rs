use std::path::PathBuf;

/// Errors raised while loading and decoding the geography document.
///
/// All of these are fatal to initialization: the map is never rendered
/// from a partially decoded document.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read geography document {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("geography document is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("malformed topology: {0}")]
    Topology(String),
}

pub type Result<T> = std::result::Result<T, Error>;
