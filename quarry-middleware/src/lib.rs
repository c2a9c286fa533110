//! quarry-middleware
//!
//! Wrappers around [`SourceAdapter`](quarry_core::SourceAdapter)s (quota accounting,
//! temporary blacklisting), a builder composing them, and an in-memory
//! [`CacheStore`](quarry_core::CacheStore).

mod blacklist;
mod builder;
mod memory;
mod quota;

pub use crate::blacklist::{BlacklistMiddleware, BlacklistingSource};
pub use crate::builder::SourceBuilder;
pub use crate::memory::MemoryStore;
pub use crate::quota::{QuotaAwareSource, QuotaMiddleware};
