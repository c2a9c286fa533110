//! Builder for composing sources with middleware layers.
//!
//! Layers form an onion around the raw source:
//!
//! ```text
//! Resolver
//!     ↓
//! Outermost middleware (e.g. Blacklist: checks first, sees errors last)
//!     ↓
//! Inner middleware (e.g. Quota: enforces the budget)
//!     ↓
//! Raw source (e.g. TimeSeries: makes the HTTP call)
//! ```
//!
//! `layers` is stored outermost-first (last added = outermost) and applied in
//! reverse by `build()`:
//!
//! ```text
//! builder.with_quota(..).with_blacklist(..)
//!
//! Storage: [Blacklist, Quota]
//! Result:  Blacklist(Quota(Raw))
//! ```

use std::sync::Arc;
use std::time::Duration;

use quarry_core::{Middleware, QuotaConfig, SourceAdapter};
use serde_json::json;

use crate::blacklist::BlacklistMiddleware;
use crate::quota::QuotaMiddleware;

/// Composes a raw source with layered wrappers.
pub struct SourceBuilder {
    raw: Arc<dyn SourceAdapter>,
    /// Outermost layer first.
    layers: Vec<Box<dyn Middleware>>,
}

impl SourceBuilder {
    /// Create a new builder from a raw, unwrapped source.
    #[must_use]
    pub fn new(raw: Arc<dyn SourceAdapter>) -> Self {
        Self {
            raw,
            layers: Vec::new(),
        }
    }

    /// Add or replace the quota layer, placing it outermost.
    #[must_use]
    pub fn with_quota(mut self, cfg: QuotaConfig) -> Self {
        self.layers.retain(|m| m.name() != "QuotaAwareSource");
        self.layers.insert(0, Box::new(QuotaMiddleware::new(cfg)));
        self
    }

    /// Remove the quota layer if present.
    #[must_use]
    pub fn without_quota(mut self) -> Self {
        self.layers.retain(|m| m.name() != "QuotaAwareSource");
        self
    }

    /// Add or replace the blacklist layer, placing it outermost.
    #[must_use]
    pub fn with_blacklist(mut self, default_duration: Duration) -> Self {
        self.layers.retain(|m| m.name() != "BlacklistingSource");
        self.layers
            .insert(0, Box::new(BlacklistMiddleware::new(default_duration)));
        self
    }

    /// Push a custom layer outside every existing one.
    #[must_use]
    pub fn layer(mut self, layer: Box<dyn Middleware>) -> Self {
        self.layers.insert(0, layer);
        self
    }

    /// Describe the stack, outermost first, ending with the raw source.
    #[must_use]
    pub fn describe(&self) -> serde_json::Value {
        let mut out: Vec<serde_json::Value> = self
            .layers
            .iter()
            .map(|l| json!({ "name": l.name(), "config": l.config_json() }))
            .collect();
        out.push(json!({ "name": "RawSource", "config": { "key": self.raw.key().as_str() } }));
        serde_json::Value::Array(out)
    }

    /// Build the wrapped source, applying layers innermost first.
    #[must_use]
    pub fn build(self) -> Arc<dyn SourceAdapter> {
        let mut acc: Arc<dyn SourceAdapter> = Arc::clone(&self.raw);
        for m in self.layers.into_iter().rev() {
            acc = m.apply(acc);
        }
        acc
    }
}
