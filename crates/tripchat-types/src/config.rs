//! Configuration types for Tripchat.
//!
//! `ChatConfig` represents the top-level `config.toml` that controls page
//! sizes, message limits, storage deadlines and the HTTP listener.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ChatError;

/// Top-level configuration for the chat service.
///
/// Loaded from `~/.tripchat/config.toml`. All fields have sensible defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Page size used when a caller does not ask for one.
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,

    /// Hard ceiling on any page size, applied even to explicit requests.
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u32,

    /// Maximum message body length in characters.
    #[serde(default = "default_max_body_len")]
    pub max_body_len: usize,

    /// Deadline for a single storage call.
    #[serde(default = "default_storage_timeout_ms")]
    pub storage_timeout_ms: u64,

    /// Pause before the single retry of a failed read.
    #[serde(default = "default_read_retry_backoff_ms")]
    pub read_retry_backoff_ms: u64,

    #[serde(default)]
    pub server: ServerConfig,
}

fn default_page_size() -> u32 {
    50
}

fn default_max_page_size() -> u32 {
    200
}

fn default_max_body_len() -> usize {
    4000
}

fn default_storage_timeout_ms() -> u64 {
    5_000
}

fn default_read_retry_backoff_ms() -> u64 {
    50
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
            max_body_len: default_max_body_len(),
            storage_timeout_ms: default_storage_timeout_ms(),
            read_retry_backoff_ms: default_read_retry_backoff_ms(),
            server: ServerConfig::default(),
        }
    }
}

impl ChatConfig {
    pub fn storage_timeout(&self) -> Duration {
        Duration::from_millis(self.storage_timeout_ms)
    }

    pub fn read_retry_backoff(&self) -> Duration {
        Duration::from_millis(self.read_retry_backoff_ms)
    }

    /// Resolve a requested page size against the configured default and cap.
    ///
    /// `None` yields the default; anything above the cap is clamped. Zero is
    /// rejected.
    pub fn resolve_limit(&self, requested: Option<u32>) -> Result<u32, ChatError> {
        match requested {
            Some(0) => Err(ChatError::Validation(
                "limit must be greater than zero".to_string(),
            )),
            Some(n) => Ok(n.min(self.max_page_size)),
            None => Ok(self.default_page_size.min(self.max_page_size)),
        }
    }

    /// Reset zero-valued limits, which would make every page empty or every
    /// storage call time out, to their defaults.
    ///
    /// Returns the config together with the names of the fields that were
    /// reset.
    pub fn normalized(mut self) -> (Self, Vec<&'static str>) {
        let mut reset = Vec::new();
        if self.default_page_size == 0 {
            self.default_page_size = default_page_size();
            reset.push("default_page_size");
        }
        if self.max_page_size == 0 {
            self.max_page_size = default_max_page_size();
            reset.push("max_page_size");
        }
        if self.max_body_len == 0 {
            self.max_body_len = default_max_body_len();
            reset.push("max_body_len");
        }
        if self.storage_timeout_ms == 0 {
            self.storage_timeout_ms = default_storage_timeout_ms();
            reset.push("storage_timeout_ms");
        }
        (self, reset)
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}
