//! FILENAME: app/worker/src/error.rs

use thiserror::Error;

/// Errors surfaced by a `WorkerHandle`. Protocol-level failures (bad slugs,
/// failed init) are never errors: they are dropped or answered in-band.
#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("Worker has stopped")]
    Closed,

    #[error("Malformed message: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Worker task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("Log file error: {0}")]
    Log(String),
}
