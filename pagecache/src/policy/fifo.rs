use super::{select_from_tail, CachePolicy, Selection};
use crate::error::CacheError;
use crate::item::CacheItem;
use crate::store::{NodeId, Store};

use std::sync::Arc;

pub(crate) const TYPE_NAME: &str = "FIFO";

/// An eviction policy that evicts entries in a First-In, First-Out (FIFO) manner.
#[derive(Debug, Default)]
pub struct FifoPolicy;

impl FifoPolicy {
  pub fn new() -> Self {
    Self
  }
}

impl<T: CacheItem> CachePolicy<T> for FifoPolicy {
  fn name(&self) -> &'static str {
    TYPE_NAME
  }

  /// On insert, add the new item to the front of the queue.
  fn insert(&mut self, store: &mut Store<T>, item: Arc<T>) -> Result<NodeId, CacheError> {
    let front = store.front();
    store.insert_before(front, item, 0)
  }

  /// A FIFO policy does not care about access patterns. This is a no-op.
  fn on_access(&mut self, _store: &mut Store<T>, _id: NodeId) -> Result<(), CacheError> {
    Ok(())
  }

  /// Evict the oldest items until enough memory is freed.
  fn select_victims(
    &mut self,
    store: &mut Store<T>,
    words_to_free: u64,
    exclude: Option<NodeId>,
  ) -> Selection {
    select_from_tail(store, words_to_free, exclude)
  }
}
