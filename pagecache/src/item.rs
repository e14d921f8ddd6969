use std::fmt;

/// The capabilities the cache needs from a cached storage object.
///
/// Items are created by the page store and handed to the cache as `Arc<T>`.
/// The cache never mutates an item; callers flip the dirty or pinned state
/// through their own interior mutability between cache calls.
pub trait CacheItem: fmt::Debug {
  /// The identifier of this item. Must not change while the item is resident.
  fn key(&self) -> u64;

  /// The cost of keeping this item resident, in words (4 bytes each).
  ///
  /// Queried on insert and again on removal, never cached by the cache.
  fn memory(&self) -> u64;

  /// Whether the item was modified since it was last written back.
  fn is_changed(&self) -> bool;

  /// Whether the item may be evicted. Pinned items return `false`.
  fn can_remove(&self) -> bool {
    true
  }
}
