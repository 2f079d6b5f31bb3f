//! Configuration loading.
//!
//! Settings come from, in increasing priority: built-in defaults, a TOML
//! file (`--config` or `likecap.toml` in the working directory), environment
//! variables, and finally CLI flags applied by the command.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::browser::BrowserConfig;

/// Default config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "likecap.toml";

/// GraphQL endpoint serving the likes timeline.
pub const DEFAULT_URL_PREFIX: &str = "https://x.com/i/api/graphql/-SxYPSmLFV7fnFq_-Q-UVg/Likes";

/// Capture loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureSettings {
    /// Only responses whose URL starts with this prefix are saved.
    #[serde(default = "default_url_prefix")]
    pub url_prefix: String,

    /// Directory receiving `response_<id>.json` files.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// How long one stop evaluation may wait for new content.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Interval between page-height polls while waiting.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Extract once more after the loop halts.
    #[serde(default)]
    pub final_flush: bool,
}

fn default_url_prefix() -> String {
    DEFAULT_URL_PREFIX.to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("response_bodies")
}

fn default_timeout_seconds() -> u64 {
    5
}

fn default_poll_interval_ms() -> u64 {
    100
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            url_prefix: default_url_prefix(),
            output_dir: default_output_dir(),
            timeout_seconds: default_timeout_seconds(),
            poll_interval_ms: default_poll_interval_ms(),
            final_flush: false,
        }
    }
}

impl CaptureSettings {
    /// Apply overrides from environment variables.
    ///
    /// - `LIKECAP_URL_PREFIX` - response URL prefix
    /// - `LIKECAP_OUTPUT_DIR` - artifact directory
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(prefix) = std::env::var("LIKECAP_URL_PREFIX") {
            if !prefix.is_empty() {
                self.url_prefix = prefix;
            }
        }
        if let Ok(dir) = std::env::var("LIKECAP_OUTPUT_DIR") {
            if !dir.is_empty() {
                self.output_dir = PathBuf::from(dir);
            }
        }
        self
    }
}

/// Full application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub capture: CaptureSettings,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl Settings {
    /// Parse settings from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Load settings from an explicit file, or from `likecap.toml` in the
    /// working directory if present, then apply environment overrides.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match config_path {
            Some(path) => Some(path.to_path_buf()),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                default.exists().then_some(default)
            }
        };

        let settings = match path {
            Some(path) => {
                debug!("Loading config from {:?}", path);
                let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
                    path: path.clone(),
                    source,
                })?;
                Self::from_toml(&content).map_err(|source| ConfigError::Parse { path, source })?
            }
            None => Self::default(),
        };

        Ok(settings.with_env_overrides())
    }

    pub fn with_env_overrides(self) -> Self {
        Self {
            browser: self.browser.with_env_overrides(),
            capture: self.capture.with_env_overrides(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_file_gives_defaults() {
        let settings = Settings::from_toml("").unwrap();
        assert_eq!(settings.capture.url_prefix, DEFAULT_URL_PREFIX);
        assert_eq!(settings.capture.output_dir, PathBuf::from("response_bodies"));
        assert_eq!(settings.capture.timeout_seconds, 5);
        assert_eq!(settings.capture.poll_interval_ms, 100);
        assert!(!settings.capture.final_flush);
        assert!(!settings.browser.headless);
    }

    #[test]
    fn sections_override_defaults() {
        let settings = Settings::from_toml(
            r#"
            [browser]
            headless = true

            [capture]
            output_dir = "captures"
            timeout_seconds = 12
            final_flush = true
            "#,
        )
        .unwrap();

        assert!(settings.browser.headless);
        assert_eq!(settings.capture.output_dir, PathBuf::from("captures"));
        assert_eq!(settings.capture.timeout_seconds, 12);
        assert!(settings.capture.final_flush);
        assert_eq!(settings.capture.url_prefix, DEFAULT_URL_PREFIX);
    }

    #[test]
    fn load_reports_bad_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"[capture]\ntimeout_seconds = \"soon\"\n").unwrap();

        let err = Settings::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
