//! Browser driver error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("Failed to launch browser: {0}")]
    Launch(String),
    #[error("Failed to connect to remote browser: {0}")]
    Connect(String),
    #[error("DevTools protocol error: {0}")]
    Protocol(String),
    #[error("Script evaluation failed: {0}")]
    Script(String),
    #[error("Browser support not compiled. Rebuild with: cargo build --features browser")]
    Unavailable,
}

impl DriverError {
    pub(crate) fn protocol(e: impl std::fmt::Display) -> Self {
        DriverError::Protocol(e.to_string())
    }

    pub(crate) fn script(e: impl std::fmt::Display) -> Self {
        DriverError::Script(e.to_string())
    }
}
