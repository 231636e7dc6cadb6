//! Watch configuration
//!
//! All fields have defaults, so an empty TOML document is a valid config:
//!
//! ```toml
//! recursive = true
//! report_directories = true
//!
//! [backend]
//! kind = "poll"
//! interval_ms = 500
//!
//! [filter]
//! use_gitignore = true
//! additional_patterns = ["*.log", "target/"]
//! ```

use crate::error::{Result, WatchError};
use crate::filter::FilterConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Longest accepted poll interval (one hour)
const MAX_POLL_INTERVAL_MS: u64 = 3_600_000;

/// Watch configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Watch the whole tree below the root (default: true)
    #[serde(default = "default_true")]
    pub recursive: bool,

    /// Deliver events for directories, not just files (default: true)
    #[serde(default = "default_true")]
    pub report_directories: bool,

    /// Which OS facility produces the events
    #[serde(default)]
    pub backend: Backend,

    /// Paths whose events are dropped before delivery
    #[serde(default)]
    pub filter: FilterConfig,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            recursive: true,
            report_directories: true,
            backend: Backend::default(),
            filter: FilterConfig::default(),
        }
    }
}

impl WatchConfig {
    /// Parse a TOML document
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| WatchError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML config file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Serialize back to TOML
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| WatchError::Config(e.to_string()))
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if let Backend::Poll { interval_ms } = self.backend {
            if interval_ms == 0 || interval_ms > MAX_POLL_INTERVAL_MS {
                return Err(WatchError::Config(format!(
                    "poll interval must be 1..={MAX_POLL_INTERVAL_MS} ms, got {interval_ms}"
                )));
            }
        }
        Ok(())
    }

    pub(crate) fn recursive_mode(&self) -> notify::RecursiveMode {
        if self.recursive {
            notify::RecursiveMode::Recursive
        } else {
            notify::RecursiveMode::NonRecursive
        }
    }
}

/// Event source
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Backend {
    /// The platform's native notification API (FSEvents, inotify, ReadDirectoryChangesW)
    #[default]
    Native,
    /// Periodic directory scans, for filesystems without native notifications
    Poll {
        #[serde(default = "default_poll_interval_ms")]
        interval_ms: u64,
    },
}

impl Backend {
    /// Poll interval, if this is the polling backend
    pub fn poll_interval(&self) -> Option<Duration> {
        match self {
            Backend::Native => None,
            Backend::Poll { interval_ms } => Some(Duration::from_millis(*interval_ms)),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_poll_interval_ms() -> u64 {
    500
}
