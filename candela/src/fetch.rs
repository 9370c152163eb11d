use candela_core::connector::CandleRequest;
use candela_core::{
    Candle, CandelaError, Capability, Credentials, Pacer, Resolution, SeriesReport,
    merge_fragments, plan_fragments,
};

use crate::Candela;
use crate::core::tag_err;

/// A merged candle series together with how it was obtained.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchedSeries {
    /// Merged candles, strictly increasing and unique by `time`.
    pub candles: Vec<Candle>,
    /// Fragment, merge and gap statistics.
    pub report: SeriesReport,
    /// Recovered failures (skipped fragments) encountered on the way.
    pub warnings: Vec<CandelaError>,
}

impl Candela {
    /// Fetch `[start_ms, end_ms)` of `symbol` at `resolution` in capped
    /// fragments and merge them into one series.
    ///
    /// Behavior:
    /// - The range is split into windows of at most the request cap (the
    ///   smaller of the configured cap and the connector's own limit).
    /// - Windows are requested strictly one after another, each bounded by
    ///   the request timeout; the next one starts a full pacing interval
    ///   after the previous one finished.
    /// - A failed window is skipped and reported as a `PartialFetch` warning;
    ///   its bars show up as gaps in the merged series.
    ///
    /// # Errors
    /// - `MissingCredentials` before any request when no token is configured.
    /// - `InvalidArg` for an empty range.
    /// - `Unsupported` when no connector serves candles.
    /// - `DataUnavailable` when every window failed.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "candela::fetch::fetch_series",
            skip(self),
            fields(resolution = %resolution),
        )
    )]
    pub async fn fetch_series(
        &self,
        symbol: &str,
        resolution: Resolution,
        start_ms: i64,
        end_ms: i64,
    ) -> Result<FetchedSeries, CandelaError> {
        let auth = self.credentials()?;
        self.fetch_series_with(auth, symbol, resolution, start_ms, end_ms)
            .await
    }

    pub(crate) async fn fetch_series_with(
        &self,
        auth: &Credentials,
        symbol: &str,
        resolution: Resolution,
        start_ms: i64,
        end_ms: i64,
    ) -> Result<FetchedSeries, CandelaError> {
        let connector = self
            .provider_for(Capability::Candles)
            .ok_or_else(|| CandelaError::unsupported(Capability::Candles.as_str()))?;
        let provider = connector
            .as_candle_provider()
            .ok_or_else(|| CandelaError::unsupported(Capability::Candles.as_str()))?;

        let cap = self
            .cfg
            .fetch
            .max_bars_per_request
            .min(provider.max_bars_per_request())
            .max(1);
        let fragments = plan_fragments(start_ms, end_ms, resolution, cap)?;
        let label = format!("candles/{symbol}/{resolution}");

        let pacer = Pacer::new(self.cfg.fetch.pacing);
        let mut pages: Vec<Vec<Candle>> = Vec::with_capacity(fragments.len());
        let mut errors: Vec<CandelaError> = Vec::new();
        for fragment in &fragments {
            pacer.ready().await;
            let req = CandleRequest::for_fragment(symbol, fragment, cap);
            let result = Self::call_with_timeout(
                connector.name(),
                Capability::Candles,
                self.cfg.fetch.request_timeout,
                provider.candles(auth, &req),
            )
            .await;
            pacer.done().await;
            match result {
                Ok(page) => pages.push(page),
                Err(e) => {
                    let e = tag_err(connector.name(), e);
                    #[cfg(feature = "tracing")]
                    tracing::warn!(
                        series = %label,
                        start_ms = fragment.start_ms,
                        end_ms = fragment.end_ms,
                        error = %e,
                        "fragment failed; skipping"
                    );
                    if matches!(e, CandelaError::MissingCredentials) {
                        return Err(e);
                    }
                    errors.push(e);
                }
            }
        }

        if pages.is_empty() {
            let last = errors
                .last()
                .map_or_else(|| "no response".to_string(), ToString::to_string);
            return Err(CandelaError::data_unavailable(format!(
                "{label}: all {} fragments failed (last error: {last})",
                fragments.len()
            )));
        }

        let merged = merge_fragments(pages, resolution);
        let report = merged.report(fragments.len(), errors.len());
        let mut warnings = Vec::new();
        if !errors.is_empty() {
            warnings.push(CandelaError::partial_fetch(
                label,
                errors.len(),
                fragments.len(),
            ));
        }
        #[cfg(feature = "tracing")]
        tracing::debug!(
            candles = report.candles,
            gaps = report.gaps.len(),
            failed = report.fragments_failed,
            "series merged"
        );
        Ok(FetchedSeries {
            candles: merged.candles,
            report,
            warnings,
        })
    }
}
