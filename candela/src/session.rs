use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use candela_core::{CandelaError, InstanceParams, PipelineReport};

use crate::{Candela, ChartBundle};

/// Destination of finished chart bundles (a chart widget, a file, a test probe).
#[async_trait]
pub trait RenderSink: Send {
    /// Release every resource held for the previously rendered chart.
    async fn teardown(&mut self);

    /// Render one bundle. The bundle is immutable from here on.
    ///
    /// # Errors
    /// Sink-specific; the session passes the error through unchanged.
    async fn render(&mut self, bundle: ChartBundle) -> Result<(), CandelaError>;
}

/// Identity of one run inside a [`ChartSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RunToken {
    generation: u64,
}

impl RunToken {
    /// Monotonic generation number, starting at 1.
    #[must_use]
    pub const fn generation(self) -> u64 {
        self.generation
    }
}

/// Drives pipeline runs into a single sink, one chart at a time.
///
/// Each run takes a fresh [`RunToken`] and tears down the previous chart
/// before fetching. A run whose token is no longer the newest when its data
/// arrives is superseded: its bundle is dropped and never reaches the sink.
pub struct ChartSession<S> {
    candela: Arc<Candela>,
    sink: Mutex<S>,
    generation: AtomicU64,
}

impl<S: RenderSink> ChartSession<S> {
    /// Session rendering into `sink`.
    pub fn new(candela: Arc<Candela>, sink: S) -> Self {
        Self {
            candela,
            sink: Mutex::new(sink),
            generation: AtomicU64::new(0),
        }
    }

    /// Orchestrator backing the session.
    #[must_use]
    pub fn candela(&self) -> &Candela {
        &self.candela
    }

    /// Token of the newest run started so far, if any.
    #[must_use]
    pub fn current(&self) -> Option<RunToken> {
        match self.generation.load(Ordering::Acquire) {
            0 => None,
            generation => Some(RunToken { generation }),
        }
    }

    /// True while no newer run has started.
    #[must_use]
    pub fn is_current(&self, token: RunToken) -> bool {
        self.generation.load(Ordering::Acquire) == token.generation
    }

    /// Run the pipeline for `params` and hand the bundle to the sink.
    ///
    /// # Errors
    /// - Any fatal pipeline error (`InvalidArg`, `MissingCredentials`,
    ///   `DataUnavailable`); the sink stays torn down.
    /// - `Superseded` when a newer run started while this one was fetching.
    /// - Whatever the sink's `render` returns.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "candela::session::show",
            skip(self, params),
            fields(instance = %params.instance_id, symbol = %params.symbol),
        )
    )]
    pub async fn show(&self, params: &InstanceParams) -> Result<PipelineReport, CandelaError> {
        let token = RunToken {
            generation: self.generation.fetch_add(1, Ordering::AcqRel) + 1,
        };
        self.sink.lock().await.teardown().await;

        let bundle = self
            .candela
            .run_generation(params, token.generation)
            .await?;

        let mut sink = self.sink.lock().await;
        if !self.is_current(token) {
            #[cfg(feature = "tracing")]
            tracing::warn!(
                generation = token.generation,
                "discarding bundle of superseded run"
            );
            return Err(CandelaError::Superseded {
                generation: token.generation,
            });
        }
        let report = bundle.report.clone();
        sink.render(bundle).await?;
        Ok(report)
    }

    /// Tear down whatever is rendered and invalidate every in-flight run.
    pub async fn clear(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.sink.lock().await.teardown().await;
    }

    /// Consume the session and return its sink.
    pub fn into_sink(self) -> S {
        self.sink.into_inner()
    }
}
