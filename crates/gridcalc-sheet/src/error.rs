use thiserror::Error;

/// Failures while saving, loading or snapshotting a sheet.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed sheet stream: {0}")]
    Framing(&'static str),

    #[error("bad cell record: {0}")]
    Record(String),

    #[error("bad json snapshot: {0}")]
    Json(#[from] serde_json::Error),
}
