//! quarry-core
//!
//! Contracts and pure logic shared across the quarry workspace.
//!
//! - `source`: the `SourceAdapter` trait every upstream data source implements.
//! - `store`: the `CacheStore` boundary to the persistence layer.
//! - `extract`: the Field Extractor and the per-metric candidate-key table.
//! - `normalize`: turns a raw provider record into `CanonicalFundamentals`.
//! - `staleness`: decides whether a cached entry must be refreshed.
#![warn(missing_docs)]

/// Field extraction from provider-native payloads.
pub mod extract;
/// Middleware trait implemented by source wrappers.
pub mod middleware;
/// Canonical record construction and derived metrics.
pub mod normalize;
/// The source adapter contract.
pub mod source;
/// Refresh eligibility rules.
pub mod staleness;
/// The cache store contract.
pub mod store;

pub use extract::{candidate_keys, extract};
pub use middleware::Middleware;
pub use normalize::{canonicalize, extract_metrics};
pub use source::SourceAdapter;
pub use staleness::{effective_interval, is_complete, needs_refresh};
pub use store::CacheStore;

pub use quarry_types::*;
