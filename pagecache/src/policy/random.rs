#![cfg(feature = "random")]

use super::{CachePolicy, Selection};
use crate::error::CacheError;
use crate::item::CacheItem;
use crate::store::{NodeId, Store};

use rand::rngs::StdRng;
use rand::seq::IteratorRandom;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

pub(crate) const TYPE_NAME: &str = "RANDOM";

/// How many random buckets are probed for a victim before falling back to
/// a uniform pick over the whole ring.
const BUCKET_PROBES: usize = 32;

/// An eviction policy that evicts entries randomly when the cache is full.
#[derive(Debug)]
pub struct RandomPolicy {
  rng: StdRng,
}

impl RandomPolicy {
  /// Creates a policy seeded from the thread-local generator.
  pub fn new() -> Self {
    Self {
      rng: StdRng::from_rng(&mut rand::rng()),
    }
  }

  /// Creates a policy whose victim sequence is reproducible.
  pub fn with_seed(seed: u64) -> Self {
    Self {
      rng: StdRng::seed_from_u64(seed),
    }
  }

  fn eligible<T: CacheItem>(store: &Store<T>, id: NodeId, exclude: Option<NodeId>) -> bool {
    Some(id) != exclude && store.node(id).is_some_and(|node| node.is_evictable())
  }

  /// Probes a random bucket and returns an eligible node from its chain.
  fn probe<T: CacheItem>(&mut self, store: &Store<T>, exclude: Option<NodeId>) -> Option<NodeId> {
    let bucket = self.rng.random_range(0..store.bucket_count());
    let mut current = store.bucket(bucket);
    let mut chain = Vec::new();
    while let Some(id) = current {
      if Self::eligible(store, id, exclude) {
        chain.push(id);
      }
      current = store.chain_next(id);
    }
    chain.into_iter().choose(&mut self.rng)
  }

  fn pick<T: CacheItem>(&mut self, store: &Store<T>, exclude: Option<NodeId>) -> Option<NodeId> {
    for _ in 0..BUCKET_PROBES {
      if let Some(id) = self.probe(store, exclude) {
        return Some(id);
      }
    }
    // Sparse table: sample the ring directly.
    store
      .ids()
      .filter(|id| Self::eligible(store, *id, exclude))
      .choose(&mut self.rng)
  }
}

impl Default for RandomPolicy {
  fn default() -> Self {
    Self::new()
  }
}

impl<T: CacheItem> CachePolicy<T> for RandomPolicy {
  fn name(&self) -> &'static str {
    TYPE_NAME
  }

  fn insert(&mut self, store: &mut Store<T>, item: Arc<T>) -> Result<NodeId, CacheError> {
    let front = store.front();
    store.insert_before(front, item, 0)
  }

  /// A random policy does not care about access patterns. This is a no-op.
  fn on_access(&mut self, _store: &mut Store<T>, _id: NodeId) -> Result<(), CacheError> {
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
      match self.pick(store, exclude) {
        Some(id) => selection.take(store, id),
        None => break,
      }
    }
    selection
  }
}
