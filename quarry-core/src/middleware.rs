use std::sync::Arc;

use crate::source::SourceAdapter;

/// A layer that wraps a [`SourceAdapter`] in another adapter.
///
/// Layers such as call budgets or throttling blackouts sit between the resolver and
/// a raw source and keep the inner source's key.
pub trait Middleware: Send + Sync {
    /// Consume the layer and wrap `inner`.
    fn apply(self: Box<Self>, inner: Arc<dyn SourceAdapter>) -> Arc<dyn SourceAdapter>;

    /// Stable layer name, used to replace or remove a layer in a stack.
    fn name(&self) -> &'static str;

    /// Layer settings as JSON, for describing a built stack.
    fn config_json(&self) -> serde_json::Value;
}
