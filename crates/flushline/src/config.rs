//! Process-wide progressive rendering configuration.
//!
//! Built once at startup (in code or from a TOML file) and moved into
//! [`ProgressiveRenderer`](crate::ProgressiveRenderer). Nothing mutates it
//! afterwards.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::threshold::{PaddingRule, default_rules};

/// Default depth of the channel between a producer and the transport.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressiveConfig {
    /// Read (and sweep) the flash before streaming starts.
    pub snapshot_flash: bool,
    /// Generate and commit the CSRF token before streaming starts.
    pub snapshot_token: bool,
    /// Chunks a transport may hold before `push` blocks.
    pub channel_capacity: usize,
    /// First-flush padding table, in match order.
    pub padding: Vec<PaddingRule>,
}

impl Default for ProgressiveConfig {
    fn default() -> Self {
        Self {
            snapshot_flash: true,
            snapshot_token: true,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            padding: default_rules(),
        }
    }
}

impl ProgressiveConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }
}
