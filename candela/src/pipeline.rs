use serde::Serialize;

use candela_core::{
    CandelaError, Capability, ChannelPoint, Credentials, InstanceParams, LinePoint, Marker,
    PipelineReport, Position, PositionPayload, PositionsSource, PriceBar, ReferenceAxis,
    SeriesReport, align_points, build_markers, compute_ema, normalize_positions,
    resample_candles,
};

use crate::Candela;
use crate::core::tag_err;
use crate::fetch::FetchedSeries;

/// Everything the rendering sink needs for one chart, keyed to the price axis.
///
/// Every series has strictly increasing, unique `time` values; markers are
/// sorted by time and may share a bar.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartBundle {
    /// Reference-resolution OHLC bars.
    pub price_series: Vec<PriceBar>,
    /// Upper channel band, aligned to the price axis.
    pub upper_band: Vec<LinePoint>,
    /// Lower channel band, aligned to the price axis.
    pub lower_band: Vec<LinePoint>,
    /// EMA of the coarse series, aligned to the price axis.
    pub indicator: Vec<LinePoint>,
    /// Entry and exit markers.
    pub markers: Vec<Marker>,
    /// How the bundle was built.
    pub report: PipelineReport,
}

struct PositionsOutcome {
    positions: Vec<Position>,
    source: PositionsSource,
    warnings: Vec<CandelaError>,
}

impl Candela {
    /// Fetch, merge, compute and align everything one chart needs.
    ///
    /// Behavior:
    /// - Fine candles, coarse candles, position history and channel history
    ///   are fetched concurrently; each fetch is guarded on its own.
    /// - The coarse fetch starts `ema_periods` coarse bars early so the EMA is
    ///   seeded when the visible range begins.
    /// - Position history falls back to raw signals when it fails or is empty.
    /// - Position or channel failures degrade to empty markers or bands and
    ///   are carried as warnings in the report.
    ///
    /// # Errors
    /// - `InvalidArg` for malformed parameters.
    /// - `MissingCredentials` before any network call when no token is set.
    /// - `DataUnavailable` when the reference-resolution series is empty.
    pub async fn run_pipeline(&self, params: &InstanceParams) -> Result<ChartBundle, CandelaError> {
        self.run_generation(params, 0).await
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "candela::pipeline::run",
            skip(self, params),
            fields(
                instance = %params.instance_id,
                symbol = %params.symbol,
                fine = %params.fine,
                coarse = %params.coarse,
                generation = generation,
            ),
        )
    )]
    pub(crate) async fn run_generation(
        &self,
        params: &InstanceParams,
        generation: u64,
    ) -> Result<ChartBundle, CandelaError> {
        params.validate()?;
        let auth = self.credentials()?;

        let (fine, coarse, positions, channel) = futures::join!(
            self.fetch_series_with(
                auth,
                &params.symbol,
                params.fine,
                params.range_start_ms,
                params.range_end_ms,
            ),
            self.fetch_series_with(
                auth,
                &params.symbol,
                params.coarse,
                params.coarse_start_ms(),
                params.range_end_ms,
            ),
            self.fetch_positions(auth, &params.instance_id),
            self.fetch_channel(auth, &params.instance_id, params.channel_days),
        );

        let mut report = PipelineReport {
            generation,
            ..PipelineReport::default()
        };

        let fine = fine.map_err(|e| match e {
            e @ (CandelaError::DataUnavailable { .. } | CandelaError::MissingCredentials) => e,
            other => CandelaError::data_unavailable(format!(
                "candles/{}/{}: {other}",
                params.symbol, params.fine
            )),
        })?;
        if fine.candles.is_empty() {
            return Err(CandelaError::data_unavailable(format!(
                "candles/{}/{}: no candles in range",
                params.symbol, params.fine
            )));
        }
        let FetchedSeries {
            candles: fine_candles,
            report: fine_report,
            warnings: fine_warnings,
        } = fine;
        report.fine = fine_report;
        report.warnings.extend(fine_warnings);

        let coarse_candles = match coarse {
            Ok(series) if !series.candles.is_empty() => {
                report.coarse = series.report;
                report.warnings.extend(series.warnings);
                series.candles
            }
            outcome => {
                let e = outcome.err().unwrap_or_else(|| {
                    CandelaError::data_unavailable(format!(
                        "candles/{}/{}: no candles in range",
                        params.symbol, params.coarse
                    ))
                });
                #[cfg(feature = "tracing")]
                tracing::warn!(error = %e, "coarse series unavailable");
                report.warnings.push(e);
                let resample =
                    self.cfg.coarse_fallback_resample && params.coarse.is_multiple_of(params.fine);
                if resample {
                    let resampled = resample_candles(&fine_candles, params.coarse);
                    report.coarse_resampled = true;
                    report.coarse = SeriesReport {
                        candles: resampled.len(),
                        ..SeriesReport::default()
                    };
                    resampled
                } else {
                    Vec::new()
                }
            }
        };

        let tolerance = self.cfg.alignment.tolerance_ms;
        let axis = ReferenceAxis::from_candles(&fine_candles);

        let ema = compute_ema(&coarse_candles, params.ema_periods);
        let indicator = align_points(&axis, &ema, tolerance);
        report.indicator = indicator.stats;

        let (upper_band, lower_band) = match channel {
            Ok(points) => {
                let aligned = align_points(&axis, &points, tolerance);
                report.channel = aligned.stats;
                (
                    aligned.line(|p: &ChannelPoint| p.upper_band),
                    aligned.line(|p: &ChannelPoint| p.lower_band),
                )
            }
            Err(e) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(error = %e, "channel history unavailable; bands left empty");
                report.warnings.push(e);
                (Vec::new(), Vec::new())
            }
        };

        let PositionsOutcome {
            positions,
            source,
            warnings,
        } = positions;
        report.warnings.extend(warnings);
        report.positions_source = source;
        report.positions = positions.len();
        let (markers, marker_stats) = build_markers(&axis, &positions, tolerance);
        report.markers = marker_stats;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            bars = fine_candles.len(),
            indicator_matched = report.indicator.matched,
            channel_matched = report.channel.matched,
            markers = markers.len(),
            warnings = report.warnings.len(),
            "pipeline complete"
        );

        Ok(ChartBundle {
            price_series: fine_candles.iter().map(|c| c.as_price_bar()).collect(),
            upper_band,
            lower_band,
            indicator: indicator.line(|p| p.value),
            markers,
            report,
        })
    }

    /// Position history first; raw signals when history fails or is empty.
    async fn fetch_positions(&self, auth: &Credentials, instance_id: &str) -> PositionsOutcome {
        let timeout = self.cfg.fetch.request_timeout;
        let mut warnings = Vec::new();

        if let Some(c) = self.provider_for(Capability::PositionHistory)
            && let Some(p) = c.as_position_history_provider()
        {
            let call = p.position_history(auth, instance_id);
            match Self::call_with_timeout(c.name(), Capability::PositionHistory, timeout, call)
                .await
            {
                Ok(payload) => {
                    let positions = normalize_positions(&payload);
                    if !positions.is_empty() {
                        return PositionsOutcome {
                            positions,
                            source: PositionsSource::History,
                            warnings,
                        };
                    }
                    #[cfg(feature = "tracing")]
                    tracing::debug!(
                        records = payload.len(),
                        "position history empty; falling back to signals"
                    );
                }
                Err(e) => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(error = %e, "position history failed; falling back to signals");
                    warnings.push(tag_err(c.name(), e));
                }
            }
        }

        if let Some(c) = self.provider_for(Capability::Signals)
            && let Some(p) = c.as_signal_provider()
        {
            let call = p.signals(auth, instance_id);
            match Self::call_with_timeout(c.name(), Capability::Signals, timeout, call).await {
                Ok(records) => {
                    let positions = normalize_positions(&PositionPayload::Signals(records));
                    if !positions.is_empty() {
                        return PositionsOutcome {
                            positions,
                            source: PositionsSource::Signals,
                            warnings,
                        };
                    }
                }
                Err(e) => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(error = %e, "signals failed; no markers");
                    warnings.push(tag_err(c.name(), e));
                }
            }
        }

        PositionsOutcome {
            positions: Vec::new(),
            source: PositionsSource::None,
            warnings,
        }
    }

    async fn fetch_channel(
        &self,
        auth: &Credentials,
        instance_id: &str,
        days: u32,
    ) -> Result<Vec<ChannelPoint>, CandelaError> {
        let c = self
            .provider_for(Capability::ChannelHistory)
            .ok_or_else(|| CandelaError::unsupported(Capability::ChannelHistory.as_str()))?;
        let p = c
            .as_channel_history_provider()
            .ok_or_else(|| CandelaError::unsupported(Capability::ChannelHistory.as_str()))?;
        Self::call_with_timeout(
            c.name(),
            Capability::ChannelHistory,
            self.cfg.fetch.request_timeout,
            p.channel_history(auth, instance_id, days),
        )
        .await
        .map_err(|e| tag_err(c.name(), e))
    }
}
