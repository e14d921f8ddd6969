//! A memory-bounded page cache for embedded storage engines.
//!
//! # Features
//! - **Word-based Accounting**: Capacity is set in kilobytes and tracked in
//!   4-byte words reported by each item.
//! - **Fixed Hash Index**: Keys resolve through a power-of-two bucket table
//!   sized once from the configured capacity.
//! - **Five Policies**: Clock, LFU, LRU, FIFO and (with the `random` feature)
//!   Random, all sharing one arena-backed ring. Custom policies plug in
//!   through `CachePolicy`.
//! - **Write-Back**: Dirty victims are flushed through a `CacheWriter` before
//!   they are dropped, with eviction suspended while the batch runs.
//! - **Pinning**: Items that refuse removal are never evicted; the cache
//!   runs over budget and reports it instead.
//! - **Observability**: Exposes hit, miss, eviction and write-back counters.

// Public modules that form the API
pub mod builder;
pub mod cache;
pub mod config;
pub mod error;
pub mod item;
pub mod iter;
pub mod memory;
pub mod metrics;
pub mod policy;
pub mod store;
pub mod writer;

// Re-export the primary user-facing types for convenience
pub use builder::CacheBuilder;
pub use cache::PageCache;
pub use config::CacheConfig;
pub use error::{BuildError, CacheError};
pub use item::CacheItem;
pub use metrics::MetricsSnapshot;
pub use policy::{CachePolicy, CacheType, PolicyKind};
pub use writer::{BoxError, CacheWriter, NullWriter};
