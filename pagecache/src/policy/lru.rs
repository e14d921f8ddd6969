use super::{select_from_tail, CachePolicy, Selection};
use crate::error::CacheError;
use crate::item::CacheItem;
use crate::store::{NodeId, Store};

use std::sync::Arc;

pub(crate) const TYPE_NAME: &str = "LRU";

/// An eviction policy that evicts the least recently used entries.
///
/// The most recently used item sits right after the sentinel; victims are
/// taken from the other end.
#[derive(Debug, Default)]
pub struct LruPolicy;

impl LruPolicy {
  pub fn new() -> Self {
    Self
  }
}

impl<T: CacheItem> CachePolicy<T> for LruPolicy {
  fn name(&self) -> &'static str {
    TYPE_NAME
  }

  /// When an item is inserted, it is the most recently used.
  fn insert(&mut self, store: &mut Store<T>, item: Arc<T>) -> Result<NodeId, CacheError> {
    let front = store.front();
    store.insert_before(front, item, 0)
  }

  /// When an item is accessed, move it to the front.
  fn on_access(&mut self, store: &mut Store<T>, id: NodeId) -> Result<(), CacheError> {
    store.move_to_front(id)
  }

  fn on_update(&mut self, store: &mut Store<T>, id: NodeId) -> Result<(), CacheError> {
    store.move_to_front(id)
  }

  fn select_victims(
    &mut self,
    store: &mut Store<T>,
    words_to_free: u64,
    exclude: Option<NodeId>,
  ) -> Selection {
    select_from_tail(store, words_to_free, exclude)
  }
}
