//! Multi-source BTC daily history.
//!
//! Providers are queried concurrently with independent deadlines. Their
//! points are merged by calendar date in precedence order, so on a shared
//! date the highest-precedence provider's value survives.

use std::collections::BTreeMap;
use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use time::macros::date;
use tracing::{debug, warn};

use crate::adapters::{BinanceAdapter, CoinGeckoAdapter, CryptoCompareAdapter};
use crate::data_source::{DailyPriceSource, SpotPriceSource};
use crate::domain::{CalendarDate, Observation};
use crate::http_client::HttpClient;
use crate::source::BtcProviderId;
use crate::EngineError;

/// Merged history must reach back at least this far.
pub fn default_coverage_floor() -> CalendarDate {
    CalendarDate::from_date(date!(2015 - 01 - 01))
}

/// Concatenates batches into one date-keyed map, later batches overwriting
/// earlier ones, and returns the result in ascending date order.
pub fn merge_provider_points<I>(batches: I) -> Vec<Observation>
where
    I: IntoIterator<Item = Vec<Observation>>,
{
    let mut by_date = BTreeMap::new();
    for batch in batches {
        for point in batch {
            by_date.insert(point.date, point.value);
        }
    }
    by_date
        .into_iter()
        .map(|(date, value)| Observation { date, value })
        .collect()
}

/// Fails with `InsufficientHistory` when the merged series is empty or
/// starts after `floor`.
pub fn check_coverage(points: &[Observation], floor: CalendarDate) -> Result<(), EngineError> {
    let Some(first) = points.first() else {
        return Err(EngineError::InsufficientHistory(String::from(
            "no provider returned any BTC observations",
        )));
    };
    if first.date > floor {
        return Err(EngineError::InsufficientHistory(format!(
            "merged BTC history starts {} which is after the {floor} coverage floor",
            first.date
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SpotOrigin {
    Exchange,
    MergedHistory,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SpotPrice {
    pub price: f64,
    pub origin: SpotOrigin,
}

pub struct BtcHistoryResolver {
    providers: Vec<Arc<dyn DailyPriceSource>>,
    spot: Option<Arc<dyn SpotPriceSource>>,
    coverage_floor: CalendarDate,
}

impl BtcHistoryResolver {
    /// Providers are reordered by [`BtcProviderId::PRECEDENCE`] so the merge
    /// outcome never depends on registration order.
    pub fn new(mut providers: Vec<Arc<dyn DailyPriceSource>>, coverage_floor: CalendarDate) -> Self {
        providers.sort_by_key(|provider| precedence_rank(provider.id()));
        Self {
            providers,
            spot: None,
            coverage_floor,
        }
    }

    /// The three public providers plus the Binance ticker for spot quotes.
    pub fn with_http_client(http_client: Arc<dyn HttpClient>) -> Self {
        let binance = Arc::new(BinanceAdapter::new(http_client.clone()));
        let providers: Vec<Arc<dyn DailyPriceSource>> = vec![
            binance.clone(),
            Arc::new(CryptoCompareAdapter::new(http_client.clone())),
            Arc::new(CoinGeckoAdapter::new(http_client)),
        ];
        Self::new(providers, default_coverage_floor()).with_spot_source(binance)
    }

    pub fn with_spot_source(mut self, spot: Arc<dyn SpotPriceSource>) -> Self {
        self.spot = Some(spot);
        self
    }

    pub fn coverage_floor(&self) -> CalendarDate {
        self.coverage_floor
    }

    /// Deduplicated, date-ascending daily closes.
    pub async fn resolve(&self) -> Result<Vec<Observation>, EngineError> {
        let outcomes = join_all(
            self.providers
                .iter()
                .map(|provider| async move { (provider.id(), provider.daily_closes().await) }),
        )
        .await;

        let mut batches = Vec::with_capacity(outcomes.len());
        for (id, outcome) in outcomes {
            match outcome {
                Ok(points) => {
                    debug!(provider = %id, points = points.len(), "BTC provider returned history");
                    batches.push(points);
                }
                Err(error) => warn!(provider = %id, %error, "BTC provider failed"),
            }
        }

        let merged = merge_provider_points(batches);
        check_coverage(&merged, self.coverage_floor)?;
        Ok(merged)
    }

    /// Latest price from the exchange ticker, falling back to the last close
    /// of the merged history.
    pub async fn spot_price(&self) -> Result<SpotPrice, EngineError> {
        if let Some(spot) = &self.spot {
            match spot.spot_price().await {
                Ok(price) => {
                    return Ok(SpotPrice {
                        price,
                        origin: SpotOrigin::Exchange,
                    })
                }
                Err(error) => warn!(%error, "spot ticker failed, using merged history"),
            }
        }

        let history = self.resolve().await?;
        let last = history.last().ok_or_else(|| {
            EngineError::InsufficientHistory(String::from("merged BTC history is empty"))
        })?;
        Ok(SpotPrice {
            price: last.value,
            origin: SpotOrigin::MergedHistory,
        })
    }
}

fn precedence_rank(id: BtcProviderId) -> usize {
    BtcProviderId::PRECEDENCE
        .iter()
        .position(|candidate| *candidate == id)
        .unwrap_or(usize::MAX)
}
