//! Capture error types.

use std::path::PathBuf;

use thiserror::Error;

use crate::browser::{CookieError, DriverError};

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Browser error: {0}")]
    Driver(#[from] DriverError),
    #[error("Credentials error: {0}")]
    Cookies(#[from] CookieError),
    #[error("Failed to write artifact {path}: {source}")]
    Artifact {
        path: PathBuf,
        source: std::io::Error,
    },
}
