//! One refresh cycle: fetch every indicator, derive metrics, classify.

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::calendar::upcoming_events;
use crate::clock::Clock;
use crate::data_source::IndicatorSource;
use crate::domain::{
    LatestValue, LiquidityPoint, MacroMetrics, MacroPayload, Series, SeriesStatus,
};
use crate::metrics::{curve_spread, liquidity_series, rolling_average};
use crate::normalize::align_to_grid;
use crate::regime::{classify, RegimeInputs, TrendSignal};
use crate::source::IndicatorId;

pub const LIQUIDITY_WINDOW: usize = 260;
pub const REGIME_WINDOW: usize = 30;
pub const CALENDAR_LIMIT: usize = 6;

pub type PayloadFuture<'a> = Pin<Box<dyn Future<Output = MacroPayload> + Send + 'a>>;

/// Anything able to produce a fresh payload. The cache manager refreshes
/// through this seam.
///
/// Never fails: indicator failures are reported inside the payload.
pub trait PayloadSource: Send + Sync {
    fn build_payload<'a>(&'a self) -> PayloadFuture<'a>;
}

pub struct MacroAggregator {
    source: Arc<dyn IndicatorSource>,
    clock: Arc<dyn Clock>,
}

impl MacroAggregator {
    pub fn new(source: Arc<dyn IndicatorSource>, clock: Arc<dyn Clock>) -> Self {
        Self { source, clock }
    }

    pub async fn aggregate(&self) -> MacroPayload {
        let generated_at = self.clock.now();

        let outcomes = join_all(IndicatorId::ALL.into_iter().map(|id| async move {
            (id, self.source.fetch_series(id).await)
        }))
        .await;

        let mut statuses = BTreeMap::new();
        let mut series = BTreeMap::new();
        for (id, outcome) in outcomes {
            match outcome {
                Ok(fetched) => {
                    debug!(indicator = %id, points = fetched.len(), "indicator fetched");
                    statuses.insert(id, SeriesStatus::healthy());
                    series.insert(id, fetched);
                }
                Err(error) => {
                    warn!(indicator = %id, %error, "indicator fetch failed");
                    statuses.insert(id, SeriesStatus::failed(error.to_string()));
                }
            }
        }

        let mut payload = MacroPayload::empty(generated_at, statuses);
        if !payload.has_healthy_indicator() {
            warn!("every indicator failed, returning empty payload");
            return payload;
        }

        let liquidity = build_liquidity(&series);
        let nli_values: Vec<f64> = liquidity.iter().map(|p| p.net_liquidity_index).collect();

        payload.metrics = MacroMetrics {
            latest: series
                .iter()
                .filter_map(|(id, s)| {
                    s.latest().map(|p| {
                        (
                            *id,
                            LatestValue {
                                date: p.date,
                                value: p.value,
                            },
                        )
                    })
                })
                .collect(),
            curve_spread: curve_spread(
                latest_value(&series, IndicatorId::Yield10y),
                latest_value(&series, IndicatorId::Yield2y),
            ),
            net_liquidity_index: nli_values.last().copied(),
        };

        payload.regime = classify(&RegimeInputs {
            net_liquidity: TrendSignal::from_options(
                nli_values.last().copied(),
                rolling_average(&nli_values, REGIME_WINDOW),
            ),
            nominal_yield: trend(&series, IndicatorId::Yield10y),
            real_yield: trend(&series, IndicatorId::RealYield10y),
            dollar_index: trend(&series, IndicatorId::DollarIndex),
        });

        let start = liquidity.len().saturating_sub(LIQUIDITY_WINDOW);
        payload.liquidity_series = liquidity[start..].to_vec();
        payload.calendar = upcoming_events(generated_at.date(), CALENDAR_LIMIT);

        info!(
            ok = payload.ok_count,
            total = payload.total_count,
            liquidity_rows = payload.liquidity_series.len(),
            "macro payload aggregated"
        );
        payload
    }
}

impl PayloadSource for MacroAggregator {
    fn build_payload<'a>(&'a self) -> PayloadFuture<'a> {
        Box::pin(self.aggregate())
    }
}

fn latest_value(series: &BTreeMap<IndicatorId, Series>, id: IndicatorId) -> Option<f64> {
    series.get(&id).and_then(Series::latest).map(|p| p.value)
}

fn trend(series: &BTreeMap<IndicatorId, Series>, id: IndicatorId) -> TrendSignal {
    let values = series.get(&id).map(Series::values).unwrap_or_default();
    TrendSignal::from_options(values.last().copied(), rolling_average(&values, REGIME_WINDOW))
}

/// Composite series on the balance-sheet grid with reverse repo and TGA
/// forward-filled onto it. Empty when any leg is missing or nothing overlaps.
fn build_liquidity(series: &BTreeMap<IndicatorId, Series>) -> Vec<LiquidityPoint> {
    let (Some(walcl), Some(rrp), Some(tga)) = (
        series.get(&IndicatorId::FedBalanceSheet),
        series.get(&IndicatorId::ReverseRepo),
        series.get(&IndicatorId::TreasuryAccount),
    ) else {
        debug!("liquidity series skipped, a component is unavailable");
        return Vec::new();
    };

    match align_to_grid(walcl, &[rrp, tga]) {
        Ok(rows) => {
            let tuples: Vec<_> = rows
                .iter()
                .map(|row| (row.date, row.values[0], row.values[1], row.values[2]))
                .collect();
            liquidity_series(&tuples)
        }
        Err(error) => {
            warn!(%error, "liquidity components do not overlap");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::data_source::SourceFuture;
    use crate::domain::{CalendarDate, Observation};
    use crate::regime::{LiquidityRegime, Regime};
    use crate::EngineError;

    struct FixedSource {
        series: BTreeMap<IndicatorId, Vec<(&'static str, f64)>>,
    }

    impl IndicatorSource for FixedSource {
        fn fetch_series<'a>(&'a self, id: IndicatorId) -> SourceFuture<'a, Series> {
            let outcome = match self.series.get(&id) {
                Some(points) => Ok(Series::new(
                    id.as_str(),
                    points.iter().filter_map(|(date, value)| {
                        Observation::new(CalendarDate::parse(date).ok()?, *value)
                    }),
                )),
                None => Err(EngineError::transport("not configured")),
            };
            Box::pin(async move { outcome })
        }
    }

    fn aggregator(series: BTreeMap<IndicatorId, Vec<(&'static str, f64)>>) -> MacroAggregator {
        // 2026-01-01T00:00:00Z
        let clock = Arc::new(ManualClock::new(1_767_225_600_000));
        MacroAggregator::new(Arc::new(FixedSource { series }), clock)
    }

    #[tokio::test]
    async fn all_failures_yield_empty_unknown_payload() {
        let payload = aggregator(BTreeMap::new()).aggregate().await;

        assert_eq!(payload.ok_count, 0);
        assert_eq!(payload.total_count, 7);
        assert_eq!(payload.regime, Regime::unknown());
        assert!(payload.liquidity_series.is_empty());
        assert!(payload.series_status.values().all(|s| s.error.is_some()));
    }

    #[tokio::test]
    async fn partial_failures_keep_healthy_metrics() {
        let mut series = BTreeMap::new();
        series.insert(IndicatorId::Yield10y, vec![("2025-12-30", 4.25)]);
        series.insert(IndicatorId::Yield2y, vec![("2025-12-30", 3.5)]);

        let payload = aggregator(series).aggregate().await;

        assert_eq!(payload.ok_count, 2);
        assert_eq!(payload.metrics.curve_spread, Some(0.75));
        assert_eq!(payload.metrics.latest[&IndicatorId::Yield10y].value, 4.25);
        assert!(payload.metrics.net_liquidity_index.is_none());
        assert_eq!(payload.regime.liquidity, LiquidityRegime::Unknown);
        assert_eq!(payload.calendar[0].date.to_string(), "2026-01-28");
        assert!(!payload.series_status[&IndicatorId::DollarIndex].ok);
    }

    #[tokio::test]
    async fn liquidity_rows_start_once_every_leg_has_data() {
        let mut series = BTreeMap::new();
        series.insert(
            IndicatorId::FedBalanceSheet,
            vec![("2025-01-01", 100.0), ("2025-01-08", 110.0), ("2025-01-15", 120.0)],
        );
        series.insert(IndicatorId::ReverseRepo, vec![("2025-01-07", 10.0)]);
        series.insert(IndicatorId::TreasuryAccount, vec![("2025-01-02", 5.0)]);

        let payload = aggregator(series).aggregate().await;

        let dates: Vec<String> = payload
            .liquidity_series
            .iter()
            .map(|p| p.date.to_string())
            .collect();
        assert_eq!(dates, vec!["2025-01-08", "2025-01-15"]);
        assert_eq!(payload.liquidity_series[1].rrp, 10.0);
        assert_eq!(payload.metrics.net_liquidity_index, Some(100.0));
    }
}
