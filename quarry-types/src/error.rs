use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error type for the quarry workspace.
///
/// Variants fall into two families. Structural errors (see [`QuarryError::is_structural`])
/// describe problems that calling another source cannot fix and abort a resolution.
/// Every other variant is transient from the resolver's point of view: it is logged
/// at the adapter boundary and treated as "this source had no records".
#[derive(Debug, Error, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuarryError {
    /// The symbol does not satisfy the exchange-qualified ticker format.
    #[error("invalid symbol: {0}")]
    InvalidSymbol(String),

    /// The provider rejected our credentials (missing crumb, expired cookie, bad key).
    #[error("{source_key} unauthorized: {msg}")]
    Unauthorized {
        /// Source that rejected the request.
        source_key: String,
        /// Human-readable error message.
        msg: String,
    },

    /// Engine or adapter configuration is unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Invariant broken inside the engine (e.g. a resolution task panicked).
    #[error("internal error: {0}")]
    Internal(String),

    /// An individual source failed at the transport or provider level.
    #[error("{source_key} failed: {msg}")]
    Connector {
        /// Source that failed.
        source_key: String,
        /// Human-readable error message.
        msg: String,
    },

    /// The provider returned a payload we could not interpret.
    #[error("data issue: {0}")]
    Data(String),

    /// The provider does not know the requested symbol.
    #[error("not found: {what}")]
    NotFound {
        /// Description of missing resource, e.g. "statement history for RELIANCE.NS".
        what: String,
    },

    /// An individual source call exceeded the configured timeout.
    #[error("source timed out: {source_key}")]
    ProviderTimeout {
        /// Source that timed out.
        source_key: String,
    },

    /// The provider answered with a rate-limit response.
    #[error("{source_key} rate limited")]
    RateLimited {
        /// Source that was throttled.
        source_key: String,
        /// Provider hint for when to retry, if any.
        retry_after_ms: Option<u64>,
    },

    /// The request exceeds the configured quota budget for the current window.
    #[error("quota exceeded: remaining={remaining} reset_in_ms={reset_in_ms}")]
    QuotaExceeded {
        /// Remaining units at the time of rejection.
        remaining: u64,
        /// Milliseconds until the quota window resets.
        reset_in_ms: u64,
    },

    /// Source is temporarily blacklisted by middleware; retry after `reset_in_ms`.
    #[error("temporarily blacklisted: reset_in_ms={reset_in_ms}")]
    TemporarilyBlacklisted {
        /// Milliseconds remaining until the blacklist window elapses.
        reset_in_ms: u64,
    },

    /// The cache store failed to read or write an entry.
    #[error("cache store error: {0}")]
    Store(String),
}

impl QuarryError {
    /// Helper: build a `Connector` error with the source name and message.
    pub fn connector(source_key: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Connector {
            source_key: source_key.into(),
            msg: msg.into(),
        }
    }

    /// Helper: build an `Unauthorized` error with the source name and message.
    pub fn unauthorized(source_key: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Unauthorized {
            source_key: source_key.into(),
            msg: msg.into(),
        }
    }

    /// Helper: build a `NotFound` error for a description of the missing resource.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    /// Helper: build a `ProviderTimeout` error.
    pub fn provider_timeout(source_key: impl Into<String>) -> Self {
        Self::ProviderTimeout {
            source_key: source_key.into(),
        }
    }

    /// Helper: build a `RateLimited` error.
    pub fn rate_limited(source_key: impl Into<String>, retry_after_ms: Option<u64>) -> Self {
        Self::RateLimited {
            source_key: source_key.into(),
            retry_after_ms,
        }
    }

    /// Returns true for failures that falling through to another source cannot fix.
    ///
    /// The resolver aborts immediately on a structural error and propagates it to the
    /// caller; everything else is absorbed as an empty result for that source.
    #[must_use]
    pub const fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::InvalidSymbol(_)
                | Self::Unauthorized { .. }
                | Self::InvalidConfig(_)
                | Self::Internal(_)
        )
    }

    /// Returns true when the error signals provider throttling of any kind.
    #[must_use]
    pub const fn is_rate_limit(&self) -> bool {
        matches!(
            self,
            Self::RateLimited { .. } | Self::QuotaExceeded { .. }
        )
    }
}
