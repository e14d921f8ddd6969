//! Memory accounting.
//!
//! Capacity is configured in kilobytes but tracked in words of four bytes,
//! the unit `CacheItem::memory` reports in.

use crate::error::BuildError;

/// Bytes per accounting word.
pub const WORD_BYTES: u64 = 4;

/// Words of configured capacity per hash bucket.
pub const WORDS_PER_BUCKET: u64 = 64;

/// Largest bucket table the cache will allocate.
pub const MAX_BUCKETS: usize = 1 << 30;

/// Converts kilobytes to words, saturating on overflow.
#[inline]
pub fn kb_to_words(kb: u64) -> u64 {
  kb.saturating_mul(1024) / WORD_BYTES
}

/// Converts words back to whole kilobytes.
#[inline]
pub fn words_to_kb(words: u64) -> u64 {
  words.saturating_mul(WORD_BYTES) / 1024
}

/// Computes the fixed bucket count for a cache configured with `kb`.
///
/// The table is sized from the configured capacity, not from the observed
/// load, and is never resized afterwards.
pub(crate) fn bucket_count(kb: u64) -> Result<usize, BuildError> {
  let words = kb
    .checked_mul(1024)
    .map(|bytes| bytes / WORD_BYTES)
    .ok_or(BuildError::CapacityOverflow { kb })?;
  let wanted = usize::try_from(words / WORDS_PER_BUCKET)
    .map_err(|_| BuildError::CapacityOverflow { kb })?;

  match wanted.max(1).checked_next_power_of_two() {
    Some(len) if len <= MAX_BUCKETS => Ok(len),
    _ => Err(BuildError::CapacityOverflow { kb }),
  }
}

/// The memory budget of one cache instance.
///
/// Holds the configured maximum plus a write-back depth counter. While the
/// counter is non-zero no eviction pass may start, so bookkeeping done by a
/// write-back can never recurse into eviction.
#[derive(Debug)]
pub(crate) struct Budget {
  max_words: u64,
  write_back_depth: u32,
}

impl Budget {
  pub(crate) fn new(max_kb: u64) -> Self {
    Self {
      max_words: kb_to_words(max_kb),
      write_back_depth: 0,
    }
  }

  #[inline]
  pub(crate) fn max_words(&self) -> u64 {
    self.max_words
  }

  pub(crate) fn set_max_kb(&mut self, kb: u64) {
    self.max_words = kb_to_words(kb);
  }

  #[inline]
  pub(crate) fn is_suspended(&self) -> bool {
    self.write_back_depth > 0
  }

  /// Returns how many words an eviction pass must free before `incoming`
  /// more words can be held, or `None` if no pass is needed.
  ///
  /// A pass is needed once usage would meet or exceed the budget, and it
  /// must leave usage strictly below it.
  pub(crate) fn words_to_free(&self, used: u64, incoming: u64) -> Option<u64> {
    if self.is_suspended() {
      return None;
    }
    let projected = used.saturating_add(incoming);
    if projected >= self.max_words {
      Some(projected - self.max_words + 1)
    } else {
      None
    }
  }

  /// Suspends budget enforcement until the returned guard is dropped.
  ///
  /// Held by the cache across the write-back phase of a pass. Guards nest,
  /// and every early return from that phase drops its guard.
  pub(crate) fn suspend(&mut self) -> WriteBackGuard<'_> {
    self.write_back_depth += 1;
    WriteBackGuard { budget: self }
  }
}

/// Re-enables budget enforcement on drop.
#[derive(Debug)]
pub(crate) struct WriteBackGuard<'a> {
  budget: &'a mut Budget,
}

impl WriteBackGuard<'_> {
  #[cfg(test)]
  pub(crate) fn budget(&self) -> &Budget {
    self.budget
  }
}

impl Drop for WriteBackGuard<'_> {
  fn drop(&mut self) {
    self.budget.write_back_depth -= 1;
  }
}
