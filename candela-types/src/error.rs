use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error type for the candela workspace.
///
/// Variants fall into two classes. Fatal errors (`DataUnavailable`,
/// `MissingCredentials`, `InvalidArg`) abort a pipeline run. Everything else
/// produced by a single upstream call is recovered locally by the orchestrator
/// and surfaces only as a warning in the run report.
#[derive(Debug, Error, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CandelaError {
    /// No usable data exists for something the run cannot proceed without
    /// (e.g. the reference-resolution candles).
    #[error("data unavailable: {what}")]
    DataUnavailable {
        /// Description of what could not be obtained.
        what: String,
    },

    /// Some, but not all, fetches for a source failed; the source is degraded.
    #[error("partial fetch failure for {source_label}: {failed}/{attempted} failed")]
    PartialFetch {
        /// Source label, e.g. "candles/1m" or "channel-history".
        source_label: String,
        /// Number of failed requests.
        failed: usize,
        /// Number of attempted requests.
        attempted: usize,
    },

    /// No bearer token was configured; checked before any network call.
    #[error("missing authorization token")]
    MissingCredentials,

    /// The requested capability is not implemented by the target connector.
    #[error("unsupported capability: {capability}")]
    Unsupported {
        /// Capability label (e.g. "signals").
        capability: String,
    },

    /// Issues with the returned or expected data (missing fields, bad shapes).
    #[error("data issue: {0}")]
    Data(String),

    /// Invalid input argument.
    #[error("invalid argument: {0}")]
    InvalidArg(String),

    /// An individual connector returned an error.
    #[error("{connector} failed: {msg}")]
    Connector {
        /// Connector name that failed.
        connector: String,
        /// Human-readable error message.
        msg: String,
    },

    /// The upstream answered with a non-success HTTP status.
    #[error("upstream returned HTTP {status}: {msg}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Response body excerpt or reason phrase.
        msg: String,
    },

    /// The upstream rejected the call for rate reasons.
    #[error("rate limit exceeded: retry_after_ms={retry_after_ms:?}")]
    RateLimitExceeded {
        /// Server-provided retry hint, when present.
        retry_after_ms: Option<u64>,
    },

    /// A resource could not be found.
    #[error("not found: {what}")]
    NotFound {
        /// Description of missing resource, e.g. "positions for instance 7".
        what: String,
    },

    /// An individual upstream call exceeded the configured timeout.
    #[error("fetch timed out: {capability} via {connector}")]
    FetchTimeout {
        /// Connector name that timed out.
        connector: String,
        /// Capability label (e.g. "candles", "channel-history").
        capability: String,
    },

    /// A newer run started before this one could hand its bundle to the sink.
    #[error("run {generation} superseded by a newer run")]
    Superseded {
        /// Generation of the stale run.
        generation: u64,
    },
}

impl CandelaError {
    /// Helper: build a `DataUnavailable` error.
    pub fn data_unavailable(what: impl Into<String>) -> Self {
        Self::DataUnavailable { what: what.into() }
    }

    /// Helper: build an `Unsupported` error for a capability string.
    #[must_use]
    pub fn unsupported(cap: impl Into<String>) -> Self {
        Self::Unsupported {
            capability: cap.into(),
        }
    }

    /// Helper: build a `Connector` error with the connector name and message.
    pub fn connector(connector: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Connector {
            connector: connector.into(),
            msg: msg.into(),
        }
    }

    /// Helper: build a `NotFound` error for a description of the missing resource.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    /// Helper: build a `FetchTimeout` error.
    pub fn fetch_timeout(connector: impl Into<String>, capability: impl Into<String>) -> Self {
        Self::FetchTimeout {
            connector: connector.into(),
            capability: capability.into(),
        }
    }

    /// Helper: build a `PartialFetch` warning.
    pub fn partial_fetch(source_label: impl Into<String>, failed: usize, attempted: usize) -> Self {
        Self::PartialFetch {
            source_label: source_label.into(),
            failed,
            attempted,
        }
    }

    /// Returns true if this error must abort a pipeline run.
    ///
    /// Everything else is a per-source failure the orchestrator degrades around.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::DataUnavailable { .. } | Self::MissingCredentials | Self::InvalidArg(_)
        )
    }

    /// Returns true for failures that a later retry could plausibly fix.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::FetchTimeout { .. }
                | Self::RateLimitExceeded { .. }
                | Self::Http {
                    status: 500..=599,
                    ..
                }
        )
    }
}
