//! Declarative cache configuration.

use crate::builder::{CacheBuilder, DEFAULT_CACHE_TYPE, DEFAULT_MAX_MEMORY_KB};
use crate::item::CacheItem;

/// The two settings a storage engine exposes for its page cache.
///
/// With the `serde` feature this can be read straight out of a settings
/// file; missing fields fall back to the builder defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CacheConfig {
  /// Policy name, optionally with the `SOFT_` prefix.
  pub cache_type: String,
  /// Memory budget in kilobytes.
  pub size_kb: u64,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      cache_type: DEFAULT_CACHE_TYPE.to_string(),
      size_kb: DEFAULT_MAX_MEMORY_KB,
    }
  }
}

impl CacheConfig {
  /// Starts a builder from this configuration.
  pub fn builder<T: CacheItem>(&self) -> CacheBuilder<T> {
    CacheBuilder::new()
      .cache_type(self.cache_type.as_str())
      .max_memory_kb(self.size_kb)
  }
}
