use std::fmt;
use std::time::Instant;

/// Internal counters of one cache instance.
///
/// The cache is single-owner, so plain integers are enough; every cache
/// operation that mutates them already holds `&mut self`.
#[derive(Debug)]
pub(crate) struct Metrics {
  // --- Hit/Miss Ratios ---
  pub(crate) hits: u64,
  pub(crate) misses: u64,

  // --- Throughput ---
  pub(crate) inserts: u64,
  pub(crate) duplicate_puts: u64,
  pub(crate) removals: u64,

  // --- Eviction Stats ---
  pub(crate) evictions: u64,
  pub(crate) write_backs: u64,
  pub(crate) exhausted_passes: u64,

  created_at: Instant,
}

impl Default for Metrics {
  fn default() -> Self {
    Self {
      hits: 0,
      misses: 0,
      inserts: 0,
      duplicate_puts: 0,
      removals: 0,
      evictions: 0,
      write_backs: 0,
      exhausted_passes: 0,
      created_at: Instant::now(),
    }
  }
}

impl Metrics {
  pub(crate) fn new() -> Self {
    Self::default()
  }

  /// Creates a point-in-time snapshot. Memory figures come from the cache
  /// because the store owns them.
  pub(crate) fn snapshot(&self, memory_words: u64, max_memory_words: u64, len: usize) -> MetricsSnapshot {
    let total_lookups = self.hits + self.misses;

    MetricsSnapshot {
      hits: self.hits,
      misses: self.misses,
      hit_ratio: if total_lookups == 0 {
        0.0
      } else {
        self.hits as f64 / total_lookups as f64
      },
      inserts: self.inserts,
      duplicate_puts: self.duplicate_puts,
      removals: self.removals,
      evictions: self.evictions,
      write_backs: self.write_backs,
      exhausted_passes: self.exhausted_passes,
      len,
      memory_words,
      max_memory_words,
      uptime_secs: self.created_at.elapsed().as_secs(),
    }
  }
}

/// A point-in-time, public-facing snapshot of the cache's metrics.
#[derive(Clone, PartialEq)]
pub struct MetricsSnapshot {
  /// The number of `get` calls that found the key.
  pub hits: u64,
  /// The number of `get` calls that did not.
  pub misses: u64,
  /// The cache hit ratio (hits / (hits + misses)).
  pub hit_ratio: f64,
  /// The number of items made resident by `put` or `update`.
  pub inserts: u64,
  /// The number of `put` calls for a key that was already resident.
  pub duplicate_puts: u64,
  /// The number of items dropped by `remove`.
  pub removals: u64,
  /// The number of items evicted to stay within the memory budget.
  pub evictions: u64,
  /// The number of dirty victims handed to the writer.
  pub write_backs: u64,
  /// The number of eviction passes that could not free enough memory.
  pub exhausted_passes: u64,
  /// Resident items at snapshot time.
  pub len: usize,
  /// Resident memory at snapshot time, in words.
  pub memory_words: u64,
  /// The memory budget at snapshot time, in words.
  pub max_memory_words: u64,
  /// The number of seconds the cache has been running.
  pub uptime_secs: u64,
}

impl fmt::Debug for MetricsSnapshot {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("MetricsSnapshot")
      .field("hits", &self.hits)
      .field("misses", &self.misses)
      .field("hit_ratio", &format!("{:.2}%", self.hit_ratio * 100.0))
      .field("inserts", &self.inserts)
      .field("duplicate_puts", &self.duplicate_puts)
      .field("removals", &self.removals)
      .field("evictions", &self.evictions)
      .field("write_backs", &self.write_backs)
      .field("exhausted_passes", &self.exhausted_passes)
      .field("len", &self.len)
      .field("memory_words", &self.memory_words)
      .field("max_memory_words", &self.max_memory_words)
      .field("uptime_secs", &self.uptime_secs)
      .finish()
  }
}
