use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Configuration for the command result cache, fixed at construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheConfig {
    /// Upper bound on total cached entries across all sessions.
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
    /// Entry lifetime in seconds when `store` gives no override.
    #[serde(default = "default_ttl_secs")]
    pub default_ttl_secs: u64,
    /// When disabled, invalidation relies solely on command-triggered
    /// purges; page fingerprints are neither computed nor compared.
    #[serde(default = "default_true")]
    pub enable_page_state_tracking: bool,
}

fn default_max_entries() -> usize {
    1000
}

fn default_ttl_secs() -> u64 {
    300
}

fn default_true() -> bool {
    true
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: default_max_entries(),
            default_ttl_secs: default_ttl_secs(),
            enable_page_state_tracking: default_true(),
        }
    }
}

impl CacheConfig {
    /// Reject configurations that can only come from a caller bug.
    /// Runs at construction time so misuse fails fast, not at first use.
    pub fn validate(&self) -> Result<()> {
        if self.max_entries == 0 {
            return Err(Error::Config(
                "maxEntries must be a positive integer".to_string(),
            ));
        }
        if self.default_ttl_secs == 0 {
            return Err(Error::Config(
                "defaultTtlSecs must be a positive number of seconds".to_string(),
            ));
        }
        Ok(())
    }
}
