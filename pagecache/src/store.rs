use crate::error::CacheError;
use crate::item::CacheItem;

use core::fmt;
use std::sync::Arc;

use generational_arena::{Arena, Index};

/// A stable handle to a node in the store's arena.
pub type NodeId = Index;

/// One slot of the store: either the ring sentinel or a resident item.
///
/// `next`/`prev` form the circular ordering ring, `chain_next` the bucket
/// collision chain. `flag` is owned by the eviction policy (usage bit for
/// Clock, frequency for LFU) and `doomed` marks a node already selected as
/// a victim by the running eviction pass.
#[derive(Debug)]
pub struct Node<T> {
  key: u64,
  item: Option<Arc<T>>,
  next: NodeId,
  prev: NodeId,
  chain_next: Option<NodeId>,
  flag: u32,
  doomed: bool,
}

impl<T> Node<T> {
  fn sentinel(id: NodeId) -> Self {
    Self {
      key: 0,
      item: None,
      next: id,
      prev: id,
      chain_next: None,
      flag: 0,
      doomed: false,
    }
  }

  /// The key of the resident item. Meaningless for the sentinel.
  #[inline]
  pub fn key(&self) -> u64 {
    self.key
  }

  /// The resident item, or `None` for the sentinel.
  #[inline]
  pub fn item(&self) -> Option<&Arc<T>> {
    self.item.as_ref()
  }

  #[inline]
  pub fn flag(&self) -> u32 {
    self.flag
  }

  #[inline]
  pub fn set_flag(&mut self, flag: u32) {
    self.flag = flag;
  }

  #[inline]
  pub fn is_doomed(&self) -> bool {
    self.doomed
  }

  #[inline]
  pub fn set_doomed(&mut self, doomed: bool) {
    self.doomed = doomed;
  }
}

impl<T: CacheItem> Node<T> {
  /// Whether the running eviction pass may pick this node.
  #[inline]
  pub fn is_evictable(&self) -> bool {
    !self.doomed && self.item.as_ref().is_some_and(|item| item.can_remove())
  }

  /// The current footprint of the resident item in words.
  #[inline]
  pub fn memory(&self) -> u64 {
    self.item.as_ref().map_or(0, |item| item.memory())
  }
}

/// Resident items of one cache: an arena of nodes indexed by a fixed-size
/// bucket table and threaded onto a circular ring anchored at a sentinel.
///
/// Every resident key is reachable exactly once from the buckets and
/// exactly once from the ring. The sentinel lives in the arena but never in
/// a bucket chain.
pub struct Store<T> {
  nodes: Arena<Node<T>>,
  buckets: Box<[Option<NodeId>]>,
  mask: u64,
  head: NodeId,
  len: usize,
  memory: u64,
}

impl<T> fmt::Debug for Store<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Store")
      .field("buckets", &self.buckets.len())
      .field("len", &self.len)
      .field("memory", &self.memory)
      .finish()
  }
}

impl<T> Store<T> {
  /// Creates an empty store. `bucket_count` must be a power of two.
  pub(crate) fn new(bucket_count: usize) -> Self {
    debug_assert!(bucket_count.is_power_of_two());
    let mut nodes = Arena::new();
    let head = nodes.insert_with(Node::sentinel);
    Self {
      nodes,
      buckets: vec![None; bucket_count].into_boxed_slice(),
      mask: bucket_count as u64 - 1,
      head,
      len: 0,
      memory: 0,
    }
  }

  /// The ring sentinel.
  #[inline]
  pub fn head(&self) -> NodeId {
    self.head
  }

  /// Number of resident items.
  #[inline]
  pub fn len(&self) -> usize {
    self.len
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.len == 0
  }

  /// Running total of resident memory, in words.
  #[inline]
  pub fn memory_words(&self) -> u64 {
    self.memory
  }

  #[inline]
  pub fn bucket_count(&self) -> usize {
    self.buckets.len()
  }

  /// First node of the collision chain of bucket `bucket`.
  #[inline]
  pub fn bucket(&self, bucket: usize) -> Option<NodeId> {
    self.buckets.get(bucket).copied().flatten()
  }

  /// The node following `id` in its bucket chain.
  #[inline]
  pub fn chain_next(&self, id: NodeId) -> Option<NodeId> {
    self.nodes.get(id).and_then(|node| node.chain_next)
  }

  /// Whether `id` refers to a live node (the sentinel included).
  #[inline]
  pub fn contains(&self, id: NodeId) -> bool {
    self.nodes.contains(id)
  }

  #[inline]
  pub fn node(&self, id: NodeId) -> Option<&Node<T>> {
    self.nodes.get(id)
  }

  #[inline]
  pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node<T>> {
    self.nodes.get_mut(id)
  }

  /// The first node after the sentinel, or the sentinel on an empty ring.
  #[inline]
  pub fn front(&self) -> NodeId {
    self.next(self.head)
  }

  /// The ring successor of `id`, `None` for a stale id.
  #[inline]
  pub fn successor(&self, id: NodeId) -> Option<NodeId> {
    self.nodes.get(id).map(|node| node.next)
  }

  /// The ring predecessor of `id`, `None` for a stale id.
  #[inline]
  pub fn predecessor(&self, id: NodeId) -> Option<NodeId> {
    self.nodes.get(id).map(|node| node.prev)
  }

  /// Panics if `id` is not live.
  #[inline]
  pub(crate) fn next(&self, id: NodeId) -> NodeId {
    self.nodes[id].next
  }

  /// Panics if `id` is not live.
  #[inline]
  pub(crate) fn prev(&self, id: NodeId) -> NodeId {
    self.nodes[id].prev
  }

  /// The resident item at `id`, `None` for the sentinel or a stale id.
  #[inline]
  pub fn item(&self, id: NodeId) -> Option<&Arc<T>> {
    self.nodes.get(id).and_then(|node| node.item.as_ref())
  }

  #[inline]
  fn bucket_of(&self, key: u64) -> usize {
    (key & self.mask) as usize
  }

  /// Resolves `key` to its node by walking the bucket's collision chain.
  pub fn find_id(&self, key: u64) -> Option<NodeId> {
    let mut current = self.buckets[self.bucket_of(key)];
    while let Some(id) = current {
      let node = &self.nodes[id];
      if node.key == key {
        return Some(id);
      }
      current = node.chain_next;
    }
    None
  }

  /// Resolves `key` to its resident item.
  #[inline]
  pub fn find(&self, key: u64) -> Option<&Arc<T>> {
    self.find_id(key).and_then(|id| self.item(id))
  }

  /// Iterates node ids in ring order, starting after the sentinel.
  pub fn ids(&self) -> RingIds<'_, T> {
    RingIds {
      store: self,
      cursor: self.next(self.head),
    }
  }

  /// Links the detached node `id` immediately before `at`.
  pub(crate) fn link_before(&mut self, at: NodeId, id: NodeId) -> Result<(), CacheError> {
    if id == self.head {
      return Err(CacheError::HeadRelocate);
    }
    let prev = self.nodes[at].prev;
    {
      let node = &mut self.nodes[id];
      node.prev = prev;
      node.next = at;
    }
    self.nodes[prev].next = id;
    self.nodes[at].prev = id;
    Ok(())
  }

  /// Takes `id` out of the ring, leaving it pointing at itself.
  pub(crate) fn unlink(&mut self, id: NodeId) -> Result<(), CacheError> {
    if id == self.head {
      return Err(CacheError::HeadUnlink);
    }
    let (prev, next) = {
      let node = &self.nodes[id];
      (node.prev, node.next)
    };
    self.nodes[prev].next = next;
    self.nodes[next].prev = prev;
    let node = &mut self.nodes[id];
    node.next = id;
    node.prev = id;
    Ok(())
  }

  /// Relinks `id` right after the sentinel.
  pub fn move_to_front(&mut self, id: NodeId) -> Result<(), CacheError> {
    if id == self.head {
      return Err(CacheError::HeadRelocate);
    }
    let front = self.front();
    if front == id {
      return Ok(());
    }
    self.unlink(id)?;
    self.link_before(front, id)
  }

  /// Drops every node and resets the ring to just the sentinel.
  pub(crate) fn clear(&mut self) {
    // Drop the old nodes before creating the new table.
    self.nodes.clear();
    self.head = self.nodes.insert_with(Node::sentinel);
    self.buckets.iter_mut().for_each(|bucket| *bucket = None);
    self.len = 0;
    self.memory = 0;
  }
}

impl<T: CacheItem> Store<T> {
  /// Makes `item` resident: prepends it to its bucket chain, links it into
  /// the ring right before `at` and charges its memory.
  ///
  /// The caller guarantees the key is not already resident.
  pub fn insert_before(
    &mut self,
    at: NodeId,
    item: Arc<T>,
    flag: u32,
  ) -> Result<NodeId, CacheError> {
    let key = item.key();
    let memory = item.memory();
    let bucket = self.bucket_of(key);
    let head = self.head;
    let chain_next = self.buckets[bucket];

    let id = self.nodes.insert(Node {
      key,
      item: Some(item),
      next: head,
      prev: head,
      chain_next,
      flag,
      doomed: false,
    });
    self.buckets[bucket] = Some(id);
    self.link_before(at, id)?;

    self.len += 1;
    self.memory = self.memory.saturating_add(memory);
    Ok(id)
  }

  /// Removes `key` from the bucket chain and the ring and releases its
  /// memory. Returns the removed item, or `None` if it was not resident.
  pub(crate) fn remove(&mut self, key: u64) -> Result<Option<Arc<T>>, CacheError> {
    let bucket = self.bucket_of(key);
    let mut last: Option<NodeId> = None;
    let mut current = self.buckets[bucket];
    while let Some(id) = current {
      if self.nodes[id].key == key {
        break;
      }
      last = Some(id);
      current = self.nodes[id].chain_next;
    }
    let Some(id) = current else {
      return Ok(None);
    };

    let chain_next = self.nodes[id].chain_next;
    match last {
      Some(last) => self.nodes[last].chain_next = chain_next,
      None => self.buckets[bucket] = chain_next,
    }
    self.unlink(id)?;

    let item = self.nodes.remove(id).and_then(|node| node.item);
    self.len -= 1;
    let released = item.as_ref().map_or(0, |item| item.memory());
    self.memory = self.memory.saturating_sub(released);

    if let Some(still) = self.find(key) {
      return Err(CacheError::NotRemoved {
        key,
        item: format!("{:?}", still),
      });
    }
    Ok(item)
  }

  /// Removes a key the caller knows to be resident.
  pub(crate) fn remove_resident(&mut self, key: u64) -> Result<Arc<T>, CacheError> {
    self.remove(key)?.ok_or(CacheError::MissingKey { key })
  }
}

/// Node ids in ring order, excluding the sentinel.
pub struct RingIds<'a, T> {
  store: &'a Store<T>,
  cursor: NodeId,
}

impl<T> Iterator for RingIds<'_, T> {
  type Item = NodeId;

  fn next(&mut self) -> Option<Self::Item> {
    if self.cursor == self.store.head {
      return None;
    }
    let id = self.cursor;
    self.cursor = self.store.next(id);
    Some(id)
  }
}
