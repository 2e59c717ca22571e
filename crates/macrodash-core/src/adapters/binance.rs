//! Binance spot adapter: daily klines and the single-exchange ticker.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use crate::data_source::{DailyPriceSource, SourceFuture, SpotPriceSource};
use crate::domain::{CalendarDate, Observation};
use crate::fetch::fetch_json;
use crate::http_client::HttpClient;
use crate::source::BtcProviderId;
use crate::EngineError;

const KLINES_URL: &str = "https://api.binance.com/api/v3/klines?symbol=BTCUSDT&interval=1d&limit=1000";
const TICKER_URL: &str = "https://api.binance.com/api/v3/ticker/price?symbol=BTCUSDT";

pub const DEFAULT_TIMEOUT_MS: u64 = 9_000;

#[derive(Clone)]
pub struct BinanceAdapter {
    http_client: Arc<dyn HttpClient>,
    timeout_ms: u64,
}

impl BinanceAdapter {
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

    async fn fetch_klines(&self) -> Result<Vec<Observation>, EngineError> {
        let rows: Vec<Vec<Value>> =
            fetch_json(self.http_client.as_ref(), KLINES_URL, self.timeout_ms).await?;

        let mut points = Vec::with_capacity(rows.len());
        for row in &rows {
            points.extend(parse_kline(row)?);
        }
        Ok(points)
    }

    async fn fetch_ticker(&self) -> Result<f64, EngineError> {
        let ticker: TickerResponse =
            fetch_json(self.http_client.as_ref(), TICKER_URL, self.timeout_ms).await?;
        ticker
            .price
            .parse::<f64>()
            .ok()
            .filter(|price| price.is_finite() && *price > 0.0)
            .ok_or_else(|| {
                EngineError::transport(format!("binance ticker price '{}' is invalid", ticker.price))
            })
    }
}

impl DailyPriceSource for BinanceAdapter {
    fn id(&self) -> BtcProviderId {
        BtcProviderId::Binance
    }

    fn daily_closes<'a>(&'a self) -> SourceFuture<'a, Vec<Observation>> {
        Box::pin(self.fetch_klines())
    }
}

impl SpotPriceSource for BinanceAdapter {
    fn spot_price<'a>(&'a self) -> SourceFuture<'a, f64> {
        Box::pin(self.fetch_ticker())
    }
}

#[derive(Debug, Deserialize)]
struct TickerResponse {
    price: String,
}

/// Kline rows are positional: `[openTime(ms), open, high, low, close, ...]`
/// with prices as decimal strings.
fn parse_kline(row: &[Value]) -> Result<Option<Observation>, EngineError> {
    let mismatch = || EngineError::transport("binance kline row does not match expected schema");

    let open_time = row.first().and_then(Value::as_i64).ok_or_else(mismatch)?;
    let close = row
        .get(4)
        .and_then(Value::as_str)
        .and_then(|raw| raw.parse::<f64>().ok())
        .ok_or_else(mismatch)?;

    let date = CalendarDate::from_unix_millis(open_time)?;
    Ok(Observation::new(date, close).filter(|point| point.value > 0.0))
}
