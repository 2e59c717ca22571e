//! Provider contracts consumed by the engine.
//!
//! | Trait | Implemented by | Yields |
//! |-------|----------------|--------|
//! | [`IndicatorSource`] | [`FredAdapter`](crate::adapters::FredAdapter) | one [`Series`] per [`IndicatorId`] |
//! | [`DailyPriceSource`] | Binance, CryptoCompare, CoinGecko adapters | daily BTC closes |
//! | [`SpotPriceSource`] | Binance adapter | latest BTC price |
//!
//! Every implementation maps a provider-specific response schema into
//! [`Observation`]s and fails fast with `TransportFailure` on a mismatch.

use std::future::Future;
use std::pin::Pin;

use crate::domain::{Observation, Series};
use crate::source::{BtcProviderId, IndicatorId};
use crate::EngineError;

pub type SourceFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, EngineError>> + Send + 'a>>;

/// Key-value source of macro indicator observations.
pub trait IndicatorSource: Send + Sync {
    /// Fetches the full configured history for `id`.
    ///
    /// Implementations run their own fallback chain; an error here means
    /// every retrieval path for the indicator failed.
    fn fetch_series<'a>(&'a self, id: IndicatorId) -> SourceFuture<'a, Series>;
}

/// Provider of daily BTC/USD closes.
pub trait DailyPriceSource: Send + Sync {
    fn id(&self) -> BtcProviderId;

    fn daily_closes<'a>(&'a self) -> SourceFuture<'a, Vec<Observation>>;
}

/// Single-exchange latest price.
pub trait SpotPriceSource: Send + Sync {
    fn spot_price<'a>(&'a self) -> SourceFuture<'a, f64>;
}
