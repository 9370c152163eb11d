use std::sync::Arc;
use std::time::Duration;

use candela_core::{
    AlignmentConfig, CandelaConnector, CandelaError, Capability, Credentials, FetchConfig,
    PipelineConfig,
};

/// Orchestrator that fetches, merges and aligns chart data for trading instances.
pub struct Candela {
    pub(crate) connectors: Vec<Arc<dyn CandelaConnector>>,
    pub(crate) cfg: PipelineConfig,
}

/// Builder for constructing a `Candela` orchestrator with custom configuration.
pub struct CandelaBuilder {
    connectors: Vec<Arc<dyn CandelaConnector>>,
    cfg: PipelineConfig,
}

impl Default for CandelaBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CandelaBuilder {
    /// Create a new builder with the default configuration.
    ///
    /// Behavior and trade-offs:
    /// - Starts with no connectors and no credentials; register at least one
    ///   connector via [`with_connector`](Self::with_connector). Credentials are
    ///   checked when a run starts, not here.
    /// - Defaults: 1000 bars per request, 1 s between sequential requests,
    ///   30 s per upstream call, 120 s alignment tolerance, coarse fallback on.
    #[must_use]
    pub fn new() -> Self {
        Self {
            connectors: vec![],
            cfg: PipelineConfig::default(),
        }
    }

    /// Register a connector.
    ///
    /// Behavior and trade-offs:
    /// - Each capability is served by the first registered connector that
    ///   advertises it; later ones are ignored for that capability.
    /// - Duplicates are not deduplicated.
    #[must_use]
    pub fn with_connector(mut self, c: Arc<dyn CandelaConnector>) -> Self {
        self.connectors.push(c);
        self
    }

    /// Set the bearer credentials passed to every upstream call.
    #[must_use]
    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.cfg.credentials = Some(credentials);
        self
    }

    /// Shorthand for [`credentials`](Self::credentials) with a raw bearer token.
    #[must_use]
    pub fn bearer_token(self, token: impl Into<String>) -> Self {
        self.credentials(Credentials::bearer(token))
    }

    /// Replace the whole configuration.
    #[must_use]
    pub fn config(mut self, cfg: PipelineConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Replace the fetch settings.
    #[must_use]
    pub const fn fetch(mut self, fetch: FetchConfig) -> Self {
        self.cfg.fetch = fetch;
        self
    }

    /// Cap the number of bars asked for in a single request.
    ///
    /// The effective cap is the smaller of this and the connector's own limit.
    /// Smaller caps mean more fragments and more paced requests.
    #[must_use]
    pub const fn max_bars_per_request(mut self, cap: u32) -> Self {
        self.cfg.fetch.max_bars_per_request = cap;
        self
    }

    /// Set the pause between the end of one fragment request and the start of the next.
    #[must_use]
    pub const fn min_request_interval(mut self, interval: Duration) -> Self {
        self.cfg.fetch.pacing.min_interval = interval;
        self
    }

    /// Set the upper bound for any single upstream call.
    ///
    /// Behavior and trade-offs:
    /// - A call exceeding it fails with `FetchTimeout` and degrades like any
    ///   other fetch failure (skipped fragment, empty auxiliary source).
    #[must_use]
    pub const fn request_timeout(mut self, timeout: Duration) -> Self {
        self.cfg.fetch.request_timeout = timeout;
        self
    }

    /// Set the alignment tolerance in milliseconds.
    #[must_use]
    pub const fn alignment_tolerance_ms(mut self, tolerance_ms: i64) -> Self {
        self.cfg.alignment = AlignmentConfig { tolerance_ms };
        self
    }

    /// Derive coarse candles from the fine series when the coarse fetch fails.
    ///
    /// Behavior and trade-offs:
    /// - Resampled bars only cover the visible range, so the indicator loses
    ///   its warm-up and starts `ema_periods - 1` coarse bars late.
    #[must_use]
    pub const fn coarse_fallback_resample(mut self, yes: bool) -> Self {
        self.cfg.coarse_fallback_resample = yes;
        self
    }

    /// Build the `Candela` orchestrator.
    ///
    /// # Errors
    /// Returns `InvalidArg` if no connectors have been registered, the request
    /// cap is zero, the request timeout is zero, or the alignment tolerance is
    /// negative.
    pub fn build(self) -> Result<Candela, CandelaError> {
        if self.connectors.is_empty() {
            return Err(CandelaError::InvalidArg(
                "no connectors registered; add at least one via with_connector(...)".to_string(),
            ));
        }
        if self.cfg.fetch.max_bars_per_request == 0 {
            return Err(CandelaError::InvalidArg(
                "max_bars_per_request must be > 0".to_string(),
            ));
        }
        if self.cfg.fetch.request_timeout.is_zero() {
            return Err(CandelaError::InvalidArg(
                "request_timeout must be > 0".to_string(),
            ));
        }
        if self.cfg.alignment.tolerance_ms < 0 {
            return Err(CandelaError::InvalidArg(format!(
                "alignment tolerance must be >= 0, got {}",
                self.cfg.alignment.tolerance_ms
            )));
        }

        Ok(Candela {
            connectors: self.connectors,
            cfg: self.cfg,
        })
    }
}

impl Candela {
    /// Start building a new `Candela` instance.
    ///
    /// ```rust,ignore
    /// use std::sync::Arc;
    /// use candela_http::HttpConnector;
    ///
    /// let http = HttpConnector::builder("https://api.example.com/").build()?;
    /// let candela = candela::Candela::builder()
    ///     .with_connector(Arc::new(http))
    ///     .bearer_token(std::env::var("CANDELA_TOKEN")?)
    ///     .request_timeout(std::time::Duration::from_secs(10))
    ///     .build()?;
    /// ```
    #[must_use]
    pub fn builder() -> CandelaBuilder {
        CandelaBuilder::new()
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &PipelineConfig {
        &self.cfg
    }

    /// Registered connectors in registration order.
    #[must_use]
    pub fn connectors(&self) -> &[Arc<dyn CandelaConnector>] {
        &self.connectors
    }

    /// First registered connector advertising `cap`.
    pub(crate) fn provider_for(&self, cap: Capability) -> Option<Arc<dyn CandelaConnector>> {
        self.connectors.iter().find(|c| c.supports(cap)).cloned()
    }

    /// Credentials for a run; checked before any network call.
    pub(crate) fn credentials(&self) -> Result<&Credentials, CandelaError> {
        match &self.cfg.credentials {
            Some(c) if !c.is_blank() => Ok(c),
            _ => Err(CandelaError::MissingCredentials),
        }
    }

    /// Wrap an upstream future with the configured timeout and standardized
    /// timeout error mapping.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "candela::core::call_with_timeout",
            skip(fut),
            fields(
                connector = connector_name,
                capability = %capability,
                timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            ),
        )
    )]
    pub(crate) async fn call_with_timeout<T, Fut>(
        connector_name: &'static str,
        capability: Capability,
        timeout: Duration,
        fut: Fut,
    ) -> Result<T, CandelaError>
    where
        Fut: core::future::Future<Output = Result<T, CandelaError>>,
    {
        (tokio::time::timeout(timeout, fut).await).unwrap_or_else(|_| {
            Err(CandelaError::fetch_timeout(
                connector_name,
                capability.as_str(),
            ))
        })
    }
}

/// Attach the connector name to errors that do not already identify their origin.
pub(crate) fn tag_err(connector: &str, e: CandelaError) -> CandelaError {
    match e {
        e @ (CandelaError::Connector { .. }
        | CandelaError::FetchTimeout { .. }
        | CandelaError::MissingCredentials
        | CandelaError::Unsupported { .. }) => e,
        e @ (CandelaError::Http { .. }
        | CandelaError::RateLimitExceeded { .. }
        | CandelaError::NotFound { .. }) => e,
        other => CandelaError::Connector {
            connector: connector.to_string(),
            msg: other.to_string(),
        },
    }
}
