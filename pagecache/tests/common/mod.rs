#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use fibre_pagecache::{BoxError, CacheBuilder, CacheItem, CacheWriter, PageCache, PolicyKind};

// A page whose dirty and pinned state can be flipped while it is resident,
// the way the page store does between cache calls.
#[derive(Debug)]
pub struct TestPage {
  pub key: u64,
  pub words: u64,
  dirty: AtomicBool,
  pinned: AtomicBool,
}

impl TestPage {
  pub fn set_dirty(&self, dirty: bool) {
    self.dirty.store(dirty, Ordering::Relaxed);
  }

  pub fn set_pinned(&self, pinned: bool) {
    self.pinned.store(pinned, Ordering::Relaxed);
  }
}

impl CacheItem for TestPage {
  fn key(&self) -> u64 {
    self.key
  }

  fn memory(&self) -> u64 {
    self.words
  }

  fn is_changed(&self) -> bool {
    self.dirty.load(Ordering::Relaxed)
  }

  fn can_remove(&self) -> bool {
    !self.pinned.load(Ordering::Relaxed)
  }
}

pub fn page(key: u64, words: u64) -> Arc<TestPage> {
  Arc::new(TestPage {
    key,
    words,
    dirty: AtomicBool::new(false),
    pinned: AtomicBool::new(false),
  })
}

pub fn dirty_page(key: u64, words: u64) -> Arc<TestPage> {
  let page = page(key, words);
  page.set_dirty(true);
  page
}

pub fn pinned_page(key: u64, words: u64) -> Arc<TestPage> {
  let page = page(key, words);
  page.set_pinned(true);
  page
}

// A writer that remembers what it was asked to do and can be told to fail.
#[derive(Debug, Default)]
pub struct RecordingWriter {
  pub written: Vec<u64>,
  pub traces: Vec<String>,
  pub fail_on: Option<u64>,
}

impl CacheWriter<TestPage> for RecordingWriter {
  fn write_back(&mut self, item: &Arc<TestPage>) -> Result<(), BoxError> {
    if self.fail_on == Some(item.key) {
      return Err(format!("disk full writing page {}", item.key).into());
    }
    // A flushed page is clean again.
    item.set_dirty(false);
    self.written.push(item.key);
    Ok(())
  }

  fn trace_info(&mut self, message: &str) {
    self.traces.push(message.to_string());
  }
}

pub type TestCache = PageCache<TestPage, RecordingWriter>;

// Helper to build a cache for testing purposes.
pub fn build_test_cache(policy: PolicyKind, kb: u64) -> TestCache {
  CacheBuilder::<TestPage>::new()
    .policy(policy)
    .max_memory_kb(kb)
    .random_seed(0x5eed)
    .writer(RecordingWriter::default())
    .build()
    .unwrap()
}

pub fn keys(cache: &TestCache) -> Vec<u64> {
  cache.keys().collect()
}
