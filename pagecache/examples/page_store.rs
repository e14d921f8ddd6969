use fibre_pagecache::{BoxError, CacheBuilder, CacheItem, CacheWriter};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

// A page of a toy storage engine. The payload can be edited while the
// page is cached; the dirty bit tells the cache it needs flushing.
#[derive(Debug)]
struct Page {
  id: u64,
  payload: Mutex<Vec<u8>>,
  dirty: AtomicBool,
}

impl Page {
  fn new(id: u64) -> Arc<Self> {
    Arc::new(Self {
      id,
      payload: Mutex::new(vec![0; 4096]),
      dirty: AtomicBool::new(false),
    })
  }

  fn write(&self, offset: usize, byte: u8) {
    if let Ok(mut payload) = self.payload.lock() {
      payload[offset] = byte;
    }
    self.dirty.store(true, Ordering::Relaxed);
  }
}

impl CacheItem for Page {
  fn key(&self) -> u64 {
    self.id
  }
  fn memory(&self) -> u64 {
    // 4096 bytes of payload plus a little bookkeeping, in 4-byte words.
    1024 + 8
  }
  fn is_changed(&self) -> bool {
    self.dirty.load(Ordering::Relaxed)
  }
}

// The "disk": flushed page payloads by id.
#[derive(Debug, Default)]
struct Disk {
  pages: HashMap<u64, Vec<u8>>,
}

impl CacheWriter<Page> for Disk {
  fn write_back(&mut self, page: &Arc<Page>) -> Result<(), BoxError> {
    let payload = page.payload.lock().map_err(|e| e.to_string())?.clone();
    self.pages.insert(page.id, payload);
    page.dirty.store(false, Ordering::Relaxed);
    println!("  flushed page {}", page.id);
    Ok(())
  }
}

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
  tracing_subscriber::fmt()
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .init();

  // Room for three pages.
  let mut cache = CacheBuilder::<Page>::new()
    .cache_type("CLOCK")
    .max_memory_kb(16)
    .writer(Disk::default())
    .build()?;

  for id in 0..3 {
    let page = Page::new(id);
    page.write(0, id as u8);
    cache.put(page)?;
  }
  println!("resident: {:?}", cache.keys().collect::<Vec<_>>());

  // Keep page 1 hot so the clock gives it a second chance.
  cache.get(1)?;

  println!("loading pages 3 and 4:");
  cache.put(Page::new(3))?;
  cache.put(Page::new(4))?;
  println!("resident: {:?}", cache.keys().collect::<Vec<_>>());

  // Checkpoint: flush whatever is still dirty.
  let dirty: Vec<Arc<Page>> = cache.changed().cloned().collect();
  for page in &dirty {
    cache.writer_mut().write_back(page)?;
  }

  println!("pages on disk: {}", cache.writer().pages.len());
  println!("{:#?}", cache.metrics());
  Ok(())
}
