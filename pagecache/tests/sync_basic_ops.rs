mod common;

use common::*;
use fibre_pagecache::{CacheError, PolicyKind};
use pretty_assertions::assert_eq;
use std::sync::Arc;

#[test]
fn test_put_then_find_returns_same_instance() {
  for policy in PolicyKind::all() {
    let mut cache = build_test_cache(*policy, 64);
    let item = page(7, 16);
    cache.put(item.clone()).unwrap();

    let found = cache.find(7).expect("resident");
    assert!(Arc::ptr_eq(found, &item), "{policy}: identity preserved");
    assert!(cache.find(8).is_none());
    assert_eq!(cache.metrics().hits, 0, "find does not count as a hit");
  }
}

#[test]
fn test_get_hit_and_miss() {
  let mut cache = build_test_cache(PolicyKind::Lru, 64);
  cache.put(page(1, 16)).unwrap();

  assert_eq!(cache.get(1).unwrap().map(|p| p.key), Some(1));
  assert!(cache.get(2).unwrap().is_none());

  let metrics = cache.metrics();
  assert_eq!(metrics.hits, 1);
  assert_eq!(metrics.misses, 1);
  assert_eq!(metrics.inserts, 1);
  assert_eq!(metrics.hit_ratio, 0.5);
}

#[test]
fn test_duplicate_put_is_idempotent() {
  for policy in PolicyKind::all() {
    let mut cache = build_test_cache(*policy, 64);
    cache.put(page(1, 16)).unwrap();
    cache.put(page(1, 16)).unwrap();

    assert_eq!(cache.len(), 1, "{policy}");
    assert_eq!(cache.memory_words(), 16, "{policy}: memory counted once");
    assert_eq!(cache.metrics().duplicate_puts, 1);
  }
}

#[test]
fn test_remove_and_clear() {
  let mut cache = build_test_cache(PolicyKind::Clock, 64);
  cache.put(page(1, 16)).unwrap();
  cache.put(page(2, 32)).unwrap();

  assert!(cache.remove(1).unwrap());
  assert!(!cache.remove(1).unwrap(), "double remove reports absence");
  assert_eq!(cache.memory_words(), 32);
  assert_eq!(keys(&cache), vec![2]);

  let dirty = dirty_page(3, 8);
  cache.put(dirty).unwrap();
  cache.clear();
  assert!(cache.is_empty());
  assert_eq!(cache.memory_words(), 0);
  assert!(cache.writer().written.is_empty(), "clear never writes back");

  cache.put(page(4, 8)).unwrap();
  assert_eq!(keys(&cache), vec![4], "cache usable after clear");
}

#[test]
fn test_update_confirms_resident_instance() {
  let mut cache = build_test_cache(PolicyKind::Lru, 64);
  let one = page(1, 16);
  cache.put(one.clone()).unwrap();
  cache.put(page(2, 16)).unwrap();

  let prior = cache.update(1, one.clone()).unwrap().expect("resident");
  assert!(Arc::ptr_eq(&prior, &one));
  assert_eq!(keys(&cache), vec![1, 2], "LRU update moves to front");
}

#[test]
fn test_update_with_different_instance_fails() {
  let mut cache = build_test_cache(PolicyKind::Fifo, 64);
  cache.put(page(1, 16)).unwrap();

  let err = cache.update(1, page(1, 16)).unwrap_err();
  assert!(matches!(err, CacheError::ItemMismatch { key: 1, .. }));
  assert!(err.is_invariant_violation());
  assert_eq!(cache.len(), 1, "cache unchanged");
}

#[test]
fn test_update_of_absent_key_puts() {
  let mut cache = build_test_cache(PolicyKind::Clock, 64);
  let item = page(5, 16);
  assert!(cache.update(5, item.clone()).unwrap().is_none());
  assert!(Arc::ptr_eq(cache.find(5).unwrap(), &item));
}

#[test]
fn test_changed_is_lazy_ordered_and_restartable() {
  let mut cache = build_test_cache(PolicyKind::Fifo, 64);
  let a = page(1, 8);
  let b = page(2, 8);
  let c = page(3, 8);
  for item in [&a, &b, &c] {
    cache.put(item.clone()).unwrap();
  }
  a.set_dirty(true);
  c.set_dirty(true);

  let first: Vec<u64> = cache.changed().map(|p| p.key).collect();
  assert_eq!(first, vec![3, 1], "ring order, FIFO front first");

  c.set_dirty(false);
  let second: Vec<u64> = cache.changed().map(|p| p.key).collect();
  assert_eq!(second, vec![1], "a new pass sees the current state");
}

#[test]
fn test_memory_reporting_in_kb() {
  let mut cache = build_test_cache(PolicyKind::Lru, 16);
  assert_eq!(cache.max_memory(), 16);
  assert_eq!(cache.max_memory_words(), 4096);

  cache.put(page(1, 1024)).unwrap();
  assert_eq!(cache.memory(), 4);
  assert_eq!(cache.memory_words(), 1024);
}
