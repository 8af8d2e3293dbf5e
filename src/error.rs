use std::path::PathBuf;

/// Errors that abort a sweep. Per-app revoke failures are not errors; they are
/// recorded as `FAILED` audit lines instead.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("catalog request for chunk {chunk} failed: {message}")]
    Fetch { chunk: usize, message: String },

    #[error("malformed catalog record for package {package_id}: {reason}")]
    MalformedRecord { package_id: u32, reason: String },

    #[error("license feed closed before the first license list arrived")]
    FeedClosed,

    #[error("audit log {}: {source}", .path.display())]
    Audit {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("confirmation prompt failed: {0}")]
    Prompt(#[source] std::io::Error),

    #[error("removal pipeline task did not complete: {0}")]
    Task(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
