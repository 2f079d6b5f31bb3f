//! Browser launch configuration.

use serde::{Deserialize, Serialize};

/// Browser launch configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// Run in headless mode (default: false).
    /// The likes timeline is easier to debug with a visible window.
    #[serde(default)]
    pub headless: bool,

    /// Proxy server URL (e.g., "socks5://127.0.0.1:1080").
    #[serde(default)]
    pub proxy: Option<String>,

    /// DevTools request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,

    /// Additional Chrome arguments.
    #[serde(default)]
    pub chrome_args: Vec<String>,

    /// Remote Chrome DevTools URL (e.g., "ws://localhost:9222").
    /// If set, connects to existing browser instead of launching one.
    #[serde(default)]
    pub remote_url: Option<String>,
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: false,
            proxy: None,
            request_timeout: default_request_timeout(),
            chrome_args: Vec::new(),
            remote_url: None,
        }
    }
}

impl BrowserConfig {
    /// Apply overrides from environment variables.
    ///
    /// - `LIKECAP_HEADLESS` - "1"/"true" to run headless
    /// - `LIKECAP_CHROME_ARGS` - whitespace-separated extra Chrome arguments
    /// - `BROWSER_URL` - remote DevTools URL
    /// - `SOCKS_PROXY` - proxy server for browser traffic
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(val) = std::env::var("LIKECAP_HEADLESS") {
            self.headless = val == "1" || val.eq_ignore_ascii_case("true");
        }

        if let Ok(val) = std::env::var("LIKECAP_CHROME_ARGS") {
            self.chrome_args
                .extend(val.split_whitespace().map(|s| s.to_string()));
        }

        if let Ok(url) = std::env::var("BROWSER_URL") {
            if !url.is_empty() {
                self.remote_url = Some(url);
            }
        }

        if let Ok(proxy) = std::env::var("SOCKS_PROXY") {
            if !proxy.is_empty() {
                self.proxy = Some(proxy);
            }
        }

        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_from_empty_toml() {
        let config: BrowserConfig = toml::from_str("").unwrap();
        assert!(!config.headless);
        assert_eq!(config.request_timeout, 30);
        assert!(config.remote_url.is_none());
        assert!(config.chrome_args.is_empty());
    }

    #[test]
    fn parses_toml_fields() {
        let config: BrowserConfig = toml::from_str(
            r#"
            headless = true
            chrome_args = ["--window-size=1280,2000"]
            remote_url = "ws://localhost:9222"
            "#,
        )
        .unwrap();

        assert!(config.headless);
        assert_eq!(config.chrome_args, vec!["--window-size=1280,2000"]);
        assert_eq!(config.remote_url.as_deref(), Some("ws://localhost:9222"));
    }
}
