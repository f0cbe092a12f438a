//! Runtime configuration read from the environment

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_BACKEND_URL: &str = "http://localhost:8001";

/// Configuration for the chat client and its front end
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatConfig {
    /// Base address of the assistant service; `/api/chat` is appended
    pub backend_url: String,
    /// Transport timeout for each request. `None` keeps the HTTP client default.
    pub request_timeout: Option<Duration>,
    /// Where the front end writes its logs. `None` disables logging.
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be a whole number of seconds, got {value:?}")]
    InvalidTimeout { var: &'static str, value: String },
    #[error("{var} must not be empty")]
    EmptyBackendUrl { var: &'static str },
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            request_timeout: None,
            log_file: None,
        }
    }
}

impl ChatConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from any variable source; `from_env` passes the process environment
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(url) = lookup("MENU_CHAT_BACKEND_URL") {
            let url = url.trim();
            if url.is_empty() {
                return Err(ConfigError::EmptyBackendUrl {
                    var: "MENU_CHAT_BACKEND_URL",
                });
            }
            config.backend_url = url.to_string();
        }

        if let Some(value) = lookup("MENU_CHAT_TIMEOUT_SECS") {
            let secs: u64 = value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidTimeout {
                    var: "MENU_CHAT_TIMEOUT_SECS",
                    value: value.clone(),
                })?;
            config.request_timeout = Some(Duration::from_secs(secs));
        }

        config.log_file = lookup("MENU_CHAT_LOG")
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from);

        Ok(config)
    }

    /// Full URL of the chat endpoint
    pub fn chat_endpoint(&self) -> String {
        format!("{}/api/chat", self.backend_url.trim_end_matches('/'))
    }
}
