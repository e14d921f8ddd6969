use crate::writer::BoxError;

/// Errors that can occur when building a cache.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
  /// The cache type selector did not name a known eviction policy.
  #[error("unknown cache type: {0:?}")]
  UnknownCacheType(String),
  /// The configured capacity does not fit the bucket table.
  #[error("this much cache memory is not supported: {kb}kb")]
  CapacityOverflow { kb: u64 },
}

/// Errors raised by cache operations.
///
/// Apart from `WriteBack`, every variant signals a broken invariant, either
/// in the caller or in the cache itself. None of them are retried.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
  /// Something tried to unlink the ring sentinel.
  #[error("try to remove head")]
  HeadUnlink,
  /// Something tried to relink the ring sentinel somewhere else.
  #[error("try to move head")]
  HeadRelocate,
  /// `update` was called with a different item than the resident one.
  #[error("old != record for key {key}: resident {resident}, offered {offered}")]
  ItemMismatch {
    key: u64,
    resident: String,
    offered: String,
  },
  /// The index still resolved a key right after it was removed.
  #[error("key {key} not removed: {item}")]
  NotRemoved { key: u64, item: String },
  /// A key the cache believed to be resident was missing from the index.
  #[error("key {key} expected to be resident but not found")]
  MissingKey { key: u64 },
  /// The write-back channel failed to persist a dirty victim.
  #[error("write-back of key {key} failed")]
  WriteBack {
    key: u64,
    #[source]
    source: BoxError,
  },
}

impl CacheError {
  /// Returns `true` if this error reports a broken internal invariant
  /// rather than a failure of the write-back channel.
  pub fn is_invariant_violation(&self) -> bool {
    !matches!(self, CacheError::WriteBack { .. })
  }
}
