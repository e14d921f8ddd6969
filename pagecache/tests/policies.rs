// pagecache/tests/policies.rs

mod common;

use common::*;
use fibre_pagecache::{policy::*, CacheBuilder, CacheItem};

// --- Clock Policy Tests ---
mod clock {
  use super::*;
  use pretty_assertions::assert_eq;

  #[test]
  fn test_clock_second_chance_scenario() {
    // 12kb = 3072 words: three 1000-word pages fit, a fourth does not.
    let mut cache = build_test_cache(PolicyKind::Clock, 12);
    for key in [3, 4, 5, 2, 4] {
      cache.put(page(key, 1000)).unwrap();
    }

    assert!(cache.find(3).is_none(), "3 was evicted");
    assert_eq!(keys(&cache), vec![2, 4, 5]);
    assert_eq!(cache.metrics().evictions, 1);
  }

  #[test]
  fn test_clock_referenced_page_survives_a_sweep() {
    let mut cache = build_test_cache(PolicyKind::Clock, 12);
    for key in [1, 2, 3] {
      cache.put(page(key, 1000)).unwrap();
    }
    // First sweep clears every bit and takes 1; the hand rests on 2.
    cache.put(page(4, 1000)).unwrap();
    assert!(cache.find(1).is_none());

    // 2 is referenced again, so the next sweep passes it and takes 3.
    cache.get(2).unwrap();
    cache.put(page(5, 1000)).unwrap();
    assert!(cache.find(2).is_some());
    assert!(cache.find(3).is_none());
  }
}

// --- LFU Policy Tests ---
mod lfu {
  use super::*;
  use pretty_assertions::assert_eq;

  #[test]
  fn test_lfu_hit_miss_scenario() {
    // 12kb = 3072 words: the third 1024-word page meets the budget.
    let mut cache = build_test_cache(PolicyKind::Lfu, 12);
    cache.put(page(1, 1024)).unwrap();
    cache.put(page(3, 1024)).unwrap();
    for _ in 0..4 {
      assert!(cache.get(1).unwrap().is_some());
    }
    for _ in 0..3 {
      assert!(cache.get(3).unwrap().is_some());
    }
    cache.put(page(5, 1024)).unwrap();

    assert!(cache.find(1).is_some());
    assert!(cache.find(5).is_some(), "the new page is never its own victim");
    assert!(cache.find(3).is_none());
    let metrics = cache.metrics();
    assert_eq!(metrics.hits, 7);
    assert_eq!(metrics.evictions, 1);
  }

  #[test]
  fn test_lfu_touch_sequence() {
    // 13kb = 3328 words: room for three 1024-word pages.
    let mut cache = build_test_cache(PolicyKind::Lfu, 13);
    for key in [1, 2, 3, 1, 1, 2, 2, 3, 4] {
      if cache.get(key).unwrap().is_none() {
        cache.put(page(key, 1024)).unwrap();
      }
    }

    let mut resident = keys(&cache);
    resident.sort_unstable();
    assert_eq!(resident, vec![1, 2, 4]);
    let metrics = cache.metrics();
    assert_eq!(metrics.hits, 5);
    assert_eq!(metrics.misses, 4);
  }

  #[test]
  fn test_lfu_ties_evict_the_oldest() {
    let mut cache = build_test_cache(PolicyKind::Lfu, 13);
    for key in 1..=4 {
      cache.put(page(key, 1024)).unwrap();
    }
    assert_eq!(keys(&cache), vec![2, 3, 4]);
  }
}

// --- LRU Policy Tests ---
mod lru {
  use super::*;
  use pretty_assertions::assert_eq;

  #[test]
  fn test_lru_eviction_logic() {
    // 4kb = 1024 words: three 300-word pages fit.
    let mut cache = build_test_cache(PolicyKind::Lru, 4);
    for key in [3, 5, 2, 7] {
      cache.put(page(key, 300)).unwrap();
    }
    assert_eq!(keys(&cache), vec![7, 2, 5]);
  }

  #[test]
  fn test_lru_get_refreshes() {
    let mut cache = build_test_cache(PolicyKind::Lru, 4);
    for key in [3, 5, 2] {
      cache.put(page(key, 300)).unwrap();
    }
    cache.get(3).unwrap();
    cache.put(page(7, 300)).unwrap();
    assert_eq!(keys(&cache), vec![7, 3, 2], "5 was least recently used");
  }

  #[test]
  fn test_lru_duplicate_put_refreshes() {
    let mut cache = build_test_cache(PolicyKind::Lru, 4);
    for key in [3, 5, 2, 3, 7] {
      cache.put(page(key, 300)).unwrap();
    }
    assert_eq!(keys(&cache), vec![7, 3, 2]);
  }
}

// --- FIFO Policy Tests ---
mod fifo {
  use super::*;
  use pretty_assertions::assert_eq;

  #[test]
  fn test_fifo_eviction_logic() {
    let mut cache = build_test_cache(PolicyKind::Fifo, 4);
    for key in 1..=5 {
      cache.put(page(key, 300)).unwrap();
    }
    assert_eq!(keys(&cache), vec![5, 4, 3]);
  }

  #[test]
  fn test_fifo_ignores_access() {
    let mut cache = build_test_cache(PolicyKind::Fifo, 4);
    for key in 1..=3 {
      cache.put(page(key, 300)).unwrap();
    }
    cache.get(1).unwrap();
    cache.put(page(1, 300)).unwrap();
    cache.put(page(4, 300)).unwrap();
    assert!(cache.find(1).is_none(), "oldest goes regardless of access");
  }
}

// --- Random Policy Tests ---
#[cfg(feature = "random")]
mod random {
  use super::*;
  use pretty_assertions::assert_eq;

  fn run(seed: u64) -> Vec<u64> {
    let mut cache = CacheBuilder::<TestPage>::new()
      .cache_type("RANDOM")
      .max_memory_kb(4)
      .random_seed(seed)
      .build()
      .unwrap();
    for key in 0..50 {
      cache.put(page(key, 300)).unwrap();
    }
    cache.keys().collect()
  }

  #[test]
  fn test_random_respects_budget() {
    let resident = run(1);
    assert_eq!(resident.len(), 3);
    assert!(resident.contains(&49), "the page just put is resident");
  }

  #[test]
  fn test_random_is_reproducible_with_a_seed() {
    assert_eq!(run(99), run(99));
  }
}

// --- Custom Policy Tests ---
mod custom {
  use super::*;
  use pretty_assertions::assert_eq;
  use fibre_pagecache::error::CacheError;
  use fibre_pagecache::store::{NodeId, Store};
  use std::sync::Arc;

  /// Evicts the most recently inserted page first.
  #[derive(Debug, Default)]
  struct NewestFirst;

  impl<T: CacheItem> CachePolicy<T> for NewestFirst {
    fn name(&self) -> &'static str {
      "NEWEST_FIRST"
    }

    fn insert(&mut self, store: &mut Store<T>, item: Arc<T>) -> Result<NodeId, CacheError> {
      let front = store.front();
      store.insert_before(front, item, 0)
    }

    fn on_access(&mut self, _store: &mut Store<T>, _id: NodeId) -> Result<(), CacheError> {
      Ok(())
    }

    fn select_victims(
      &mut self,
      store: &mut Store<T>,
      words_to_free: u64,
      exclude: Option<NodeId>,
    ) -> Selection {
      let candidates: Vec<NodeId> = store
        .ids()
        .filter(|id| Some(*id) != exclude)
        .filter(|id| store.node(*id).is_some_and(|node| node.is_evictable()))
        .collect();
      let mut selection = Selection::default();
      for id in candidates {
        if selection.freed >= words_to_free {
          break;
        }
        selection.take(store, id);
      }
      selection
    }
  }

  #[test]
  fn test_custom_policy_drives_eviction() {
    let mut cache = CacheBuilder::<TestPage>::new()
      .cache_policy(NewestFirst)
      .max_memory_kb(4)
      .build()
      .unwrap();
    for key in 1..=4 {
      cache.put(page(key, 300)).unwrap();
    }
    assert_eq!(cache.policy_name(), "NEWEST_FIRST");
    assert!(cache.cache_type().is_none());
    assert_eq!(cache.keys().collect::<Vec<_>>(), vec![4, 2, 1], "3 went first");
  }
}
