use crate::cache::PageCache;
use crate::error::BuildError;
use crate::item::CacheItem;
use crate::memory::{bucket_count, Budget};
use crate::policy::{CachePolicy, CacheType, PolicyKind};
use crate::store::Store;
use crate::writer::{CacheWriter, NullWriter};

use core::fmt;

/// The cache type used when none is configured.
pub const DEFAULT_CACHE_TYPE: &str = "LRU";

/// The capacity used when none is configured, in kilobytes.
pub const DEFAULT_MAX_MEMORY_KB: u64 = 16 * 1024;

/// How the builder will obtain its eviction policy.
enum PolicySource<T: CacheItem> {
  /// A type selector string, parsed at build time.
  Named(String),
  Kind(CacheType),
  Custom(Box<dyn CachePolicy<T>>),
}

/// A builder for creating `PageCache` instances.
pub struct CacheBuilder<T: CacheItem, W = NullWriter> {
  source: PolicySource<T>,
  max_memory_kb: u64,
  writer: W,
  random_seed: Option<u64>,
}

// Manual Debug implementation for CacheBuilder.
impl<T: CacheItem, W> fmt::Debug for CacheBuilder<T, W> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let policy = match &self.source {
      PolicySource::Named(name) => name.clone(),
      PolicySource::Kind(ty) => ty.to_string(),
      PolicySource::Custom(policy) => format!("custom {}", policy.name()),
    };
    f.debug_struct("CacheBuilder")
      .field("policy", &policy)
      .field("max_memory_kb", &self.max_memory_kb)
      .field("random_seed", &self.random_seed)
      .finish_non_exhaustive()
  }
}

impl<T: CacheItem> CacheBuilder<T> {
  /// Creates a builder for an LRU cache of 16 MiB that discards write-backs.
  pub fn new() -> Self {
    Self {
      source: PolicySource::Named(DEFAULT_CACHE_TYPE.to_string()),
      max_memory_kb: DEFAULT_MAX_MEMORY_KB,
      writer: NullWriter,
      random_seed: None,
    }
  }
}

impl<T: CacheItem> Default for CacheBuilder<T> {
  fn default() -> Self {
    Self::new()
  }
}

impl<T: CacheItem, W> CacheBuilder<T, W> {
  /// Selects the eviction policy by name, e.g. `"CLOCK"` or `"SOFT_LFU"`.
  ///
  /// The name is matched case-insensitively when the cache is built.
  pub fn cache_type(mut self, cache_type: impl Into<String>) -> Self {
    self.source = PolicySource::Named(cache_type.into());
    self
  }

  /// Selects one of the built-in eviction policies.
  pub fn policy(mut self, policy: PolicyKind) -> Self {
    self.source = PolicySource::Kind(CacheType::from(policy));
    self
  }

  /// Sets a custom eviction policy for the cache.
  ///
  /// By default, the cache uses an `LRU` policy.
  pub fn cache_policy<Policy>(mut self, policy: Policy) -> Self
  where
    Policy: CachePolicy<T> + 'static,
  {
    self.source = PolicySource::Custom(Box::new(policy));
    self
  }

  /// Sets the memory budget in kilobytes. This also fixes the size of the
  /// bucket table for the lifetime of the cache.
  pub fn max_memory_kb(mut self, kb: u64) -> Self {
    self.max_memory_kb = kb;
    self
  }

  /// Seeds the `RANDOM` policy so its victim sequence is reproducible.
  /// Ignored by every other policy.
  pub fn random_seed(mut self, seed: u64) -> Self {
    self.random_seed = Some(seed);
    self
  }

  /// Sets the write-back channel for dirty victims.
  pub fn writer<W2>(self, writer: W2) -> CacheBuilder<T, W2>
  where
    W2: CacheWriter<T>,
  {
    CacheBuilder {
      source: self.source,
      max_memory_kb: self.max_memory_kb,
      writer,
      random_seed: self.random_seed,
    }
  }
}

impl<T, W> CacheBuilder<T, W>
where
  T: CacheItem + Send + Sync + 'static,
  W: CacheWriter<T>,
{
  /// Validates the configuration and builds the cache.
  pub fn build(self) -> Result<PageCache<T, W>, BuildError> {
    let buckets = bucket_count(self.max_memory_kb)?;

    let (policy, cache_type) = match self.source {
      PolicySource::Named(name) => {
        let ty: CacheType = name.parse()?;
        (ty.policy.create(self.random_seed), Some(ty))
      }
      PolicySource::Kind(ty) => (ty.policy.create(self.random_seed), Some(ty)),
      PolicySource::Custom(policy) => (policy, None),
    };

    Ok(PageCache::from_parts(
      Store::new(buckets),
      policy,
      self.writer,
      Budget::new(self.max_memory_kb),
      cache_type,
    ))
  }
}
