use super::{CachePolicy, Selection};
use crate::error::CacheError;
use crate::item::CacheItem;
use crate::store::{NodeId, Store};

use std::sync::Arc;

pub(crate) const TYPE_NAME: &str = "LFU";

/// Doubles a frequency weight, keeping the old value if doubling would
/// overflow or fail to grow it.
#[inline]
pub(crate) fn bump(weight: u32) -> u32 {
  weight
    .checked_mul(2)
    .filter(|doubled| *doubled > weight)
    .unwrap_or(weight)
}

/// A frequency-weighted eviction policy.
///
/// Each node's flag is a weight that starts at 1 and doubles on every hit.
/// Victims are picked one at a time as the lowest weight found in a full
/// sweep of the ring; among equal weights the first one found wins, so
/// older items go first. New items are appended at the ring tail and are
/// exempt from the pass their own insertion triggers.
#[derive(Debug, Default)]
pub struct LfuPolicy;

impl LfuPolicy {
  pub fn new() -> Self {
    Self
  }
}

impl<T: CacheItem> CachePolicy<T> for LfuPolicy {
  fn name(&self) -> &'static str {
    TYPE_NAME
  }

  fn insert(&mut self, store: &mut Store<T>, item: Arc<T>) -> Result<NodeId, CacheError> {
    let head = store.head();
    store.insert_before(head, item, 1)
  }

  fn on_access(&mut self, store: &mut Store<T>, id: NodeId) -> Result<(), CacheError> {
    if let Some(node) = store.node_mut(id) {
      node.set_flag(bump(node.flag()));
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

    while selection.freed < words_to_free {
      let mut smallest: Option<(NodeId, u32)> = None;
      for id in store.ids() {
        if Some(id) == exclude {
          continue;
        }
        let Some(node) = store.node(id) else {
          continue;
        };
        if !node.is_evictable() {
          continue;
        }
        if smallest.map_or(true, |(_, weight)| node.flag() < weight) {
          smallest = Some((id, node.flag()));
        }
      }

      match smallest {
        Some((id, _)) => selection.take(store, id),
        None => break,
      }
    }
    selection
  }

  fn evicts_after_insert(&self) -> bool {
    true
  }
}
