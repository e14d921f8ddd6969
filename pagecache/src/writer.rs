use std::sync::Arc;

/// A boxed error returned by a write-back channel.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The write-back channel the cache flushes dirty victims through.
///
/// `write_back` is invoked once per dirty victim of an eviction pass, in the
/// order the policy selected them, and always before the victim is dropped.
/// The writer only receives the item, never the cache, so it cannot call
/// back into the cache while a batch is in flight. The cache additionally
/// suspends its budget for the length of the batch, so nothing done inside
/// the batch starts a nested eviction pass.
pub trait CacheWriter<T> {
  /// Persists a dirty item. An error aborts the eviction pass and is
  /// returned to the caller of the cache operation that triggered it.
  fn write_back(&mut self, item: &Arc<T>) -> Result<(), BoxError>;

  /// Diagnostic sink. Called once for every `put` or `set_max_memory` that
  /// leaves the cache at or over budget, including a `put` into a cache
  /// with nothing else to evict.
  fn trace_info(&mut self, message: &str) {
    tracing::info!(target: "fibre_pagecache", "{}", message);
  }
}

/// A writer that discards every write-back. Useful for read-only caches
/// and for callers that flush through `changed()` themselves.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullWriter;

impl<T> CacheWriter<T> for NullWriter {
  fn write_back(&mut self, _item: &Arc<T>) -> Result<(), BoxError> {
    Ok(())
  }
}

impl<T, W: CacheWriter<T> + ?Sized> CacheWriter<T> for Box<W> {
  fn write_back(&mut self, item: &Arc<T>) -> Result<(), BoxError> {
    (**self).write_back(item)
  }

  fn trace_info(&mut self, message: &str) {
    (**self).trace_info(message)
  }
}
