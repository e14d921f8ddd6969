use super::{CachePolicy, Selection};
use crate::error::CacheError;
use crate::item::CacheItem;
use crate::store::{NodeId, Store};

use std::sync::Arc;

pub(crate) const TYPE_NAME: &str = "CLOCK";

/// An eviction policy based on the Clock (or Second-Chance) algorithm.
///
/// Every node carries a usage bit. The hand sweeps the ring: a set bit is
/// cleared and the node skipped, a clear bit makes the node a victim. New
/// nodes are linked just in front of the hand and start out referenced.
#[derive(Debug, Default)]
pub struct ClockPolicy {
  // `None` means the hand rests on the sentinel.
  hand: Option<NodeId>,
}

impl ClockPolicy {
  pub fn new() -> Self {
    Self::default()
  }

  fn hand<T>(&self, store: &Store<T>) -> NodeId {
    self
      .hand
      .filter(|id| store.contains(*id))
      .unwrap_or_else(|| store.head())
  }
}

impl<T: CacheItem> CachePolicy<T> for ClockPolicy {
  fn name(&self) -> &'static str {
    TYPE_NAME
  }

  fn insert(&mut self, store: &mut Store<T>, item: Arc<T>) -> Result<NodeId, CacheError> {
    let hand = self.hand(store);
    store.insert_before(hand, item, 1)
  }

  /// On access, set the usage bit.
  fn on_access(&mut self, store: &mut Store<T>, id: NodeId) -> Result<(), CacheError> {
    if let Some(node) = store.node_mut(id) {
      node.set_flag(1);
    }
    Ok(())
  }

  fn select_victims(
    &mut self,
    store: &mut Store<T>,
    words_to_free: u64,
    exclude: Option<NodeId>,
  ) -> Selection {
    let mut selection = Selection::default();
    let head = store.head();
    let mut cursor = self.hand(store);
    // Steps taken since the sweep last selected a victim or cleared a bit.
    // A full lap of those means nothing left can be evicted.
    let mut idle = 0;

    while selection.freed < words_to_free {
      if idle >= store.len() {
        break;
      }
      if cursor == head {
        cursor = store.next(cursor);
        continue;
      }

      let next = store.next(cursor);
      let Some(node) = store.node_mut(cursor) else {
        break;
      };
      if !node.is_evictable() || Some(cursor) == exclude {
        idle += 1;
      } else if node.flag() != 0 {
        node.set_flag(0);
        idle = 0;
      } else {
        selection.take(store, cursor);
        idle = 0;
      }
      cursor = next;
    }

    self.hand = Some(cursor);
    selection
  }

  /// Keep the hand off nodes that are about to disappear.
  fn on_remove(&mut self, store: &Store<T>, id: NodeId) {
    if self.hand == Some(id) {
      self.hand = Some(store.next(id));
    }
  }

  fn clear(&mut self) {
    self.hand = None;
  }
}
