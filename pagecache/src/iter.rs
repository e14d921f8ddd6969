//! Contains types for iterating over a cache's contents.

use crate::item::CacheItem;
use crate::store::{RingIds, Store};

use std::sync::Arc;

/// A lazy iterator over the dirty items of a cache, in ring order.
///
/// Nothing is collected up front: each call to `next` walks the ring until
/// it meets the next item whose `is_changed()` is `true`. The iterator
/// borrows the cache, so the resident set cannot change underneath it.
/// Calling `PageCache::changed` again starts a fresh pass.
pub struct Changed<'a, T> {
  store: &'a Store<T>,
  ids: RingIds<'a, T>,
}

impl<'a, T> Changed<'a, T> {
  pub(crate) fn new(store: &'a Store<T>) -> Self {
    Self {
      store,
      ids: store.ids(),
    }
  }
}

impl<'a, T: CacheItem> Iterator for Changed<'a, T> {
  type Item = &'a Arc<T>;

  fn next(&mut self) -> Option<Self::Item> {
    let store = self.store;
    self
      .ids
      .by_ref()
      .filter_map(|id| store.item(id))
      .find(|item| item.is_changed())
  }
}

/// An iterator over the resident keys of a cache, in ring order.
pub struct Keys<'a, T> {
  store: &'a Store<T>,
  ids: RingIds<'a, T>,
}

impl<'a, T> Keys<'a, T> {
  pub(crate) fn new(store: &'a Store<T>) -> Self {
    Self {
      store,
      ids: store.ids(),
    }
  }
}

impl<T> Iterator for Keys<'_, T> {
  type Item = u64;

  fn next(&mut self) -> Option<Self::Item> {
    let id = self.ids.next()?;
    self.store.node(id).map(|node| node.key())
  }

  fn size_hint(&self) -> (usize, Option<usize>) {
    (0, Some(self.store.len()))
  }
}
