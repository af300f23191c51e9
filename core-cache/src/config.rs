//! Cache sizing and TTL configuration.

use serde::{Deserialize, Serialize};

fn default_max_hot() -> usize {
    10_000
}

fn default_max_aux() -> usize {
    1_000
}

fn default_cdn_ttl_secs() -> u64 {
    3600
}

/// Sizing for the hot LRU tier and the bounded auxiliary maps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Capacity of the hot in-memory track LRU.
    #[serde(default = "default_max_hot")]
    pub max_hot: usize,

    /// Capacity of each auxiliary bounded map (audio key, CDN, head bytes).
    #[serde(default = "default_max_aux")]
    pub max_aux: usize,

    /// Default CDN URL time-to-live when the caller doesn't specify one.
    #[serde(default = "default_cdn_ttl_secs")]
    pub default_cdn_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_hot: default_max_hot(),
            max_aux: default_max_aux(),
            default_cdn_ttl_secs: default_cdn_ttl_secs(),
        }
    }
}

impl CacheConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.max_hot == 0 {
            return Err("max_hot must be greater than 0".to_string());
        }
        if self.max_aux == 0 {
            return Err("max_aux must be greater than 0".to_string());
        }
        Ok(())
    }
}
