use crate::error::CacheError;
use crate::item::CacheItem;
use crate::iter::{Changed, Keys};
use crate::memory::{words_to_kb, Budget};
use crate::metrics::{Metrics, MetricsSnapshot};
use crate::policy::{CachePolicy, CacheType};
use crate::store::{NodeId, Store};
use crate::writer::{CacheWriter, NullWriter};

use core::fmt;
use std::sync::Arc;

use tracing::{debug, trace};

/// A memory-bounded cache of storage pages.
///
/// Items are looked up by key through a fixed bucket table and ordered on
/// a ring whose meaning depends on the eviction policy. Whenever a `put`
/// would bring resident memory to or past the budget, the policy selects
/// victims, dirty victims are flushed through the writer, and the victims
/// are dropped.
///
/// A cache has a single owner. Every operation that can change the ring
/// takes `&mut self`; callers that share a cache wrap it in their own lock.
pub struct PageCache<T: CacheItem, W = NullWriter> {
  pub(crate) store: Store<T>,
  policy: Box<dyn CachePolicy<T>>,
  writer: W,
  budget: Budget,
  metrics: Metrics,
  cache_type: Option<CacheType>,
}

impl<T: CacheItem, W> fmt::Debug for PageCache<T, W> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("PageCache")
      .field("policy", &self.policy.name())
      .field("store", &self.store)
      .field("budget", &self.budget)
      .finish_non_exhaustive()
  }
}

impl<T, W> PageCache<T, W>
where
  T: CacheItem,
  W: CacheWriter<T>,
{
  pub(crate) fn from_parts(
    store: Store<T>,
    policy: Box<dyn CachePolicy<T>>,
    writer: W,
    budget: Budget,
    cache_type: Option<CacheType>,
  ) -> Self {
    debug!(
      policy = policy.name(),
      buckets = store.bucket_count(),
      max_words = budget.max_words(),
      "page cache created"
    );
    Self {
      store,
      policy,
      writer,
      budget,
      metrics: Metrics::new(),
      cache_type,
    }
  }

  // --- Cache contract ---

  /// Makes `item` resident, evicting as needed to stay within budget.
  ///
  /// If an item with the same key is already resident nothing is inserted
  /// and the call counts as an access to the resident item.
  pub fn put(&mut self, item: Arc<T>) -> Result<(), CacheError> {
    if let Some(id) = self.store.find_id(item.key()) {
      self.metrics.duplicate_puts += 1;
      return self.policy.on_duplicate(&mut self.store, id);
    }

    if self.policy.evicts_after_insert() {
      let key = item.key();
      let id = self.policy.insert(&mut self.store, item)?;
      if let Err(err) = self.make_room(0, Some(id)) {
        // A failed pass leaves the cache as it was before the put.
        self.policy.on_remove(&self.store, id);
        self.store.remove_resident(key)?;
        return Err(err);
      }
      self.metrics.inserts += 1;
      Ok(())
    } else {
      self.make_room(item.memory(), None)?;
      self.policy.insert(&mut self.store, item)?;
      self.metrics.inserts += 1;
      Ok(())
    }
  }

  /// Returns the resident item for `key`, recording the access with the
  /// eviction policy.
  pub fn get(&mut self, key: u64) -> Result<Option<Arc<T>>, CacheError> {
    match self.store.find_id(key) {
      Some(id) => {
        self.policy.on_access(&mut self.store, id)?;
        self.metrics.hits += 1;
        Ok(self.store.item(id).cloned())
      }
      None => {
        self.metrics.misses += 1;
        Ok(None)
      }
    }
  }

  /// Returns the resident item for `key` without touching policy state.
  pub fn find(&self, key: u64) -> Option<&Arc<T>> {
    self.store.find(key)
  }

  /// Confirms that `item` is the resident item for `key` and returns it.
  ///
  /// If `key` is not resident, `item` is put instead and `None` returned.
  /// Offering a different instance under a resident key is an error.
  pub fn update(&mut self, key: u64, item: Arc<T>) -> Result<Option<Arc<T>>, CacheError> {
    let Some(id) = self.store.find_id(key) else {
      self.put(item)?;
      return Ok(None);
    };
    let resident = self
      .store
      .item(id)
      .cloned()
      .ok_or(CacheError::MissingKey { key })?;
    if !Arc::ptr_eq(&resident, &item) {
      return Err(CacheError::ItemMismatch {
        key,
        resident: format!("{:?}", resident),
        offered: format!("{:?}", item),
      });
    }
    self.policy.on_update(&mut self.store, id)?;
    Ok(Some(resident))
  }

  /// Drops the item for `key` without writing it back. Returns whether the
  /// key was resident.
  pub fn remove(&mut self, key: u64) -> Result<bool, CacheError> {
    let Some(id) = self.store.find_id(key) else {
      return Ok(false);
    };
    self.policy.on_remove(&self.store, id);
    self.store.remove_resident(key)?;
    self.metrics.removals += 1;
    Ok(true)
  }

  /// Drops every item without writing anything back. Callers flush dirty
  /// items through `changed()` first if they need them.
  pub fn clear(&mut self) {
    debug!(len = self.store.len(), "clearing page cache");
    self.store.clear();
    self.policy.clear();
  }

  /// Iterates the resident dirty items in ring order.
  pub fn changed(&self) -> Changed<'_, T> {
    Changed::new(&self.store)
  }

  /// Sets the memory budget in kilobytes and evicts down to it right away.
  ///
  /// The bucket table keeps the size chosen at construction.
  pub fn set_max_memory(&mut self, kb: u64) -> Result<(), CacheError> {
    self.budget.set_max_kb(kb);
    debug!(kb, max_words = self.budget.max_words(), "memory budget changed");
    self.make_room(0, None)
  }

  /// The memory budget in kilobytes.
  pub fn max_memory(&self) -> u64 {
    words_to_kb(self.budget.max_words())
  }

  /// Resident memory in kilobytes.
  pub fn memory(&self) -> u64 {
    words_to_kb(self.store.memory_words())
  }

  // --- Inspection ---

  pub fn max_memory_words(&self) -> u64 {
    self.budget.max_words()
  }

  pub fn memory_words(&self) -> u64 {
    self.store.memory_words()
  }

  pub fn len(&self) -> usize {
    self.store.len()
  }

  pub fn is_empty(&self) -> bool {
    self.store.is_empty()
  }

  /// Resident keys in ring order.
  pub fn keys(&self) -> Keys<'_, T> {
    Keys::new(&self.store)
  }

  /// The type selector this cache was built from, or `None` when a custom
  /// policy was supplied.
  pub fn cache_type(&self) -> Option<CacheType> {
    self.cache_type
  }

  pub fn policy_name(&self) -> &'static str {
    self.policy.name()
  }

  pub fn writer(&self) -> &W {
    &self.writer
  }

  pub fn writer_mut(&mut self) -> &mut W {
    &mut self.writer
  }

  /// Returns a snapshot of the cache's counters.
  pub fn metrics(&self) -> MetricsSnapshot {
    self
      .metrics
      .snapshot(self.store.memory_words(), self.budget.max_words(), self.store.len())
  }

  // --- Eviction ---

  /// Runs one eviction pass if `incoming` more words would meet or exceed
  /// the budget. `exclude` is the node that was just inserted, if any.
  fn make_room(&mut self, incoming: u64, exclude: Option<NodeId>) -> Result<(), CacheError> {
    let used = self.store.memory_words();
    let Some(words_to_free) = self.budget.words_to_free(used, incoming) else {
      return Ok(());
    };
    let candidates = self.store.len() - usize::from(exclude.is_some());
    if candidates == 0 {
      // Shrinking an empty cache has nothing to report; a put that cannot
      // fit does.
      if incoming > 0 || exclude.is_some() {
        self.report_exhausted(used);
      }
      return Ok(());
    }

    let selection = self
      .policy
      .select_victims(&mut self.store, words_to_free, exclude);
    debug!(
      policy = self.policy.name(),
      words_to_free,
      freed = selection.freed,
      victims = selection.victims.len(),
      "eviction pass"
    );

    if selection.freed < words_to_free {
      self.report_exhausted(used);
    }

    if selection.victims.is_empty() {
      return Ok(());
    }
    self.flush_and_remove(selection.victims)
  }

  /// Emits the one diagnostic a pass gives when it cannot get under budget.
  fn report_exhausted(&mut self, used: u64) {
    self.metrics.exhausted_passes += 1;
    let message = format!(
      "cannot remove records, cache size too small? records: {} memory: {}",
      self.store.len(),
      used
    );
    self.writer.trace_info(&message);
  }

  /// Writes back the dirty victims in selection order, then drops all of
  /// them in the same order.
  ///
  /// If the writer fails, every victim stays resident and selectable again.
  fn flush_and_remove(&mut self, victims: Vec<NodeId>) -> Result<(), CacheError> {
    {
      let _guard = self.budget.suspend();
      for id in &victims {
        let Some(item) = self.store.item(*id).cloned() else {
          continue;
        };
        if !item.is_changed() {
          continue;
        }
        if let Err(source) = self.writer.write_back(&item) {
          for id in &victims {
            if let Some(node) = self.store.node_mut(*id) {
              node.set_doomed(false);
            }
          }
          return Err(CacheError::WriteBack {
            key: item.key(),
            source,
          });
        }
        self.metrics.write_backs += 1;
      }
    }

    for id in victims {
      let Some(key) = self.store.node(id).map(|node| node.key()) else {
        continue;
      };
      self.policy.on_remove(&self.store, id);
      let item = self.store.remove_resident(key)?;
      trace!(key, words = item.memory(), "evicted");
      self.metrics.evictions += 1;
    }
    Ok(())
  }
}
