//! Cookie file loading for authenticated browser sessions.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum CookieError {
    #[error("Failed to read cookies file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse cookies file {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
}

/// One cookie record as exported by browser extensions and WebDriver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CookieRecord {
    #[serde(default, alias = "key")]
    pub name: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub secure: Option<bool>,
    #[serde(default)]
    pub http_only: Option<bool>,
    /// Expiry as seconds since the epoch.
    #[serde(default, alias = "expirationDate")]
    pub expiry: Option<f64>,
    #[serde(default)]
    pub same_site: Option<String>,
}

/// Load cookies from a JSON file.
///
/// Records without a name are skipped; everything else is passed to the
/// driver as-is.
pub fn load_cookies(path: &Path) -> Result<Vec<CookieRecord>, CookieError> {
    debug!("Loading cookies from {:?}", path);

    let content = std::fs::read_to_string(path).map_err(|source| CookieError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let cookies: Vec<CookieRecord> =
        serde_json::from_str(&content).map_err(|source| CookieError::Parse {
            path: path.display().to_string(),
            source,
        })?;

    let total = cookies.len();
    let cookies: Vec<CookieRecord> = cookies
        .into_iter()
        .filter(|c| !c.name.is_empty())
        .collect();
    if cookies.len() < total {
        warn!("Skipped {} cookie(s) without a name", total - cookies.len());
    }

    Ok(cookies)
}
