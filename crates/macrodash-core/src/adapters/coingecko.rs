use std::sync::Arc;

use serde::Deserialize;

use crate::data_source::{DailyPriceSource, SourceFuture};
use crate::domain::{CalendarDate, Observation};
use crate::fetch::fetch_json;
use crate::http_client::HttpClient;
use crate::source::BtcProviderId;
use crate::EngineError;

const MARKET_CHART_URL: &str =
    "https://api.coingecko.com/api/v3/coins/bitcoin/market_chart?vs_currency=usd&days=max&interval=daily";

pub const DEFAULT_TIMEOUT_MS: u64 = 14_000;

const MILLIS_PER_DAY: i64 = 86_400_000;

#[derive(Clone)]
pub struct CoinGeckoAdapter {
    http_client: Arc<dyn HttpClient>,
    timeout_ms: u64,
}

impl CoinGeckoAdapter {
    pub fn new(http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            http_client,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    async fn fetch_market_chart(&self) -> Result<Vec<Observation>, EngineError> {
        let body: MarketChartResponse =
            fetch_json(self.http_client.as_ref(), MARKET_CHART_URL, self.timeout_ms).await?;

        let mut points = Vec::with_capacity(body.prices.len());
        for [millis, price] in body.prices {
            if !millis.is_finite() || price <= 0.0 {
                continue;
            }
            points.extend(Observation::new(close_date(millis as i64)?, price));
        }
        Ok(points)
    }
}

impl DailyPriceSource for CoinGeckoAdapter {
    fn id(&self) -> BtcProviderId {
        BtcProviderId::CoinGecko
    }

    fn daily_closes<'a>(&'a self) -> SourceFuture<'a, Vec<Observation>> {
        Box::pin(self.fetch_market_chart())
    }
}

/// A midnight UTC sample is the close of the day before it. The trailing
/// intraday sample stays on its own day.
fn close_date(millis: i64) -> Result<CalendarDate, EngineError> {
    let date = CalendarDate::from_unix_millis(millis)?;
    if millis.rem_euclid(MILLIS_PER_DAY) != 0 {
        return Ok(date);
    }
    date.into_inner()
        .previous_day()
        .map(CalendarDate::from_date)
        .ok_or_else(|| EngineError::InvalidDate {
            value: format!("unix_ms:{millis}"),
        })
}

/// `prices` is a list of `[unix_ms, price]` pairs.
#[derive(Debug, Deserialize)]
struct MarketChartResponse {
    prices: Vec<[f64; 2]>,
}
