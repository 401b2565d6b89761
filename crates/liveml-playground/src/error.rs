//! Playground error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlaygroundError {
    #[error("invalid playground configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error("failed to start session worker: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("session worker stopped before it was ready")]
    WorkerStopped,
}
