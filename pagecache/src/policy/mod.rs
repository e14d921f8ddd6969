pub mod clock;
pub mod fifo;
pub mod lfu;
pub mod lru;
#[cfg(feature = "random")]
pub mod random;

use crate::error::{BuildError, CacheError};
use crate::item::CacheItem;
use crate::store::{NodeId, Store};

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// The victims chosen by one eviction pass.
#[derive(Debug, Default)]
pub struct Selection {
  /// Victims in the order they were selected. Each is marked doomed.
  pub victims: Vec<NodeId>,
  /// Words the victims account for.
  pub freed: u64,
}

impl Selection {
  /// Marks `id` as a victim and counts its memory.
  pub fn take(&mut self, store: &mut Store<impl CacheItem>, id: NodeId) {
    if let Some(node) = store.node_mut(id) {
      node.set_doomed(true);
      self.freed = self.freed.saturating_add(node.memory());
      self.victims.push(id);
    }
  }
}

/// An eviction policy: the ordering a cache imposes on its resident items
/// and the rule it uses to pick victims.
///
/// Policies own the per-node `flag` and decide where new nodes are linked.
/// Selection only marks victims; the cache writes them back and removes
/// them afterwards, calling `on_remove` for each.
pub trait CachePolicy<T: CacheItem>: Send + fmt::Debug {
  /// The cache type name of this policy, e.g. `"CLOCK"`.
  fn name(&self) -> &'static str;

  /// Makes `item` resident, linking it wherever the policy wants new items.
  fn insert(&mut self, store: &mut Store<T>, item: Arc<T>) -> Result<NodeId, CacheError>;

  /// Called on a `get` hit.
  fn on_access(&mut self, store: &mut Store<T>, id: NodeId) -> Result<(), CacheError>;

  /// Called when `put` is handed a key that is already resident.
  fn on_duplicate(&mut self, store: &mut Store<T>, id: NodeId) -> Result<(), CacheError> {
    self.on_access(store, id)
  }

  /// Called when `update` confirms the resident item.
  fn on_update(&mut self, _store: &mut Store<T>, _id: NodeId) -> Result<(), CacheError> {
    Ok(())
  }

  /// Picks victims until at least `words_to_free` words are covered or no
  /// candidate is left. `exclude` is never selected.
  fn select_victims(
    &mut self,
    store: &mut Store<T>,
    words_to_free: u64,
    exclude: Option<NodeId>,
  ) -> Selection;

  /// Called right before `id` is unlinked, by eviction or by `remove`.
  fn on_remove(&mut self, _store: &Store<T>, _id: NodeId) {}

  /// Called after the store was cleared.
  fn clear(&mut self) {}

  /// Whether new items are linked before the eviction pass runs.
  fn evicts_after_insert(&self) -> bool {
    false
  }
}

/// Walks the ring from the tail towards the sentinel, taking every
/// evictable node until enough memory is covered.
pub fn select_from_tail<T: CacheItem>(
  store: &mut Store<T>,
  words_to_free: u64,
  exclude: Option<NodeId>,
) -> Selection {
  let mut selection = Selection::default();
  let head = store.head();
  let mut cursor = store.prev(head);

  while selection.freed < words_to_free && cursor != head {
    let prev = store.prev(cursor);
    let evictable = Some(cursor) != exclude
      && store.node(cursor).is_some_and(|node| node.is_evictable());
    if evictable {
      selection.take(store, cursor);
    }
    cursor = prev;
  }
  selection
}

#[cfg(feature = "random")]
const ALL_POLICIES: &[PolicyKind] = &[
  PolicyKind::Clock,
  PolicyKind::Lfu,
  PolicyKind::Lru,
  PolicyKind::Fifo,
  PolicyKind::Random,
];

#[cfg(not(feature = "random"))]
const ALL_POLICIES: &[PolicyKind] = &[
  PolicyKind::Clock,
  PolicyKind::Lfu,
  PolicyKind::Lru,
  PolicyKind::Fifo,
];

/// The built-in eviction policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "UPPERCASE"))]
pub enum PolicyKind {
  /// Second-chance clock.
  Clock,
  /// Frequency weighted, saturating doubling on every hit.
  Lfu,
  /// Least recently used.
  Lru,
  /// Insertion order, accesses are ignored.
  Fifo,
  /// Uniformly sampled victims.
  #[cfg(feature = "random")]
  Random,
}

impl PolicyKind {
  pub fn name(self) -> &'static str {
    match self {
      PolicyKind::Clock => clock::TYPE_NAME,
      PolicyKind::Lfu => lfu::TYPE_NAME,
      PolicyKind::Lru => lru::TYPE_NAME,
      PolicyKind::Fifo => fifo::TYPE_NAME,
      #[cfg(feature = "random")]
      PolicyKind::Random => random::TYPE_NAME,
    }
  }

  /// Every policy compiled into this build.
  pub fn all() -> &'static [PolicyKind] {
    ALL_POLICIES
  }

  /// Instantiates the policy. `seed` only matters for `Random`.
  #[cfg_attr(not(feature = "random"), allow(unused_variables))]
  pub(crate) fn create<T>(self, seed: Option<u64>) -> Box<dyn CachePolicy<T>>
  where
    T: CacheItem + Send + Sync + 'static,
  {
    match self {
      PolicyKind::Clock => Box::new(clock::ClockPolicy::new()),
      PolicyKind::Lfu => Box::new(lfu::LfuPolicy::new()),
      PolicyKind::Lru => Box::new(lru::LruPolicy::new()),
      PolicyKind::Fifo => Box::new(fifo::FifoPolicy::new()),
      #[cfg(feature = "random")]
      PolicyKind::Random => match seed {
        Some(seed) => Box::new(random::RandomPolicy::with_seed(seed)),
        None => Box::new(random::RandomPolicy::new()),
      },
    }
  }
}

impl fmt::Display for PolicyKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

impl FromStr for PolicyKind {
  type Err = BuildError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    PolicyKind::all()
      .iter()
      .copied()
      .find(|kind| kind.name().eq_ignore_ascii_case(s))
      .ok_or_else(|| BuildError::UnknownCacheType(s.to_string()))
  }
}

/// A parsed cache type selector such as `"LRU"` or `"SOFT_CLOCK"`.
///
/// The `SOFT_` prefix asks for a soft-reference overflow tier around the
/// cache. That tier is provided by the caller; the cache only records it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheType {
  pub policy: PolicyKind,
  pub soft_references: bool,
}

impl CacheType {
  pub const SOFT_PREFIX: &'static str = "SOFT_";
}

impl From<PolicyKind> for CacheType {
  fn from(policy: PolicyKind) -> Self {
    Self {
      policy,
      soft_references: false,
    }
  }
}

impl fmt::Display for CacheType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if self.soft_references {
      f.write_str(Self::SOFT_PREFIX)?;
    }
    f.write_str(self.policy.name())
  }
}

impl FromStr for CacheType {
  type Err = BuildError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let trimmed = s.trim();
    let prefix_len = Self::SOFT_PREFIX.len();
    let soft = trimmed.len() > prefix_len
      && trimmed.is_char_boundary(prefix_len)
      && trimmed[..prefix_len].eq_ignore_ascii_case(Self::SOFT_PREFIX);
    let name = if soft { &trimmed[prefix_len..] } else { trimmed };

    let policy = name
      .parse::<PolicyKind>()
      .map_err(|_| BuildError::UnknownCacheType(s.to_string()))?;
    Ok(Self {
      policy,
      soft_references: soft,
    })
  }
}
