//! # Macrodash Core
//!
//! Data engine behind the macro / Bitcoin dashboard.
//!
//! ## Overview
//!
//! - **Fetch utility** with per-call deadlines over a pluggable HTTP transport
//! - **Provider adapters** for FRED and three BTC price providers
//! - **Series alignment** by forward-fill onto a target date grid
//! - **Derived metrics**: net liquidity index, curve spread, RSI, SMA, stock-to-flow
//! - **Regime classifier** for liquidity, rates and macro risk
//! - **Stale-while-revalidate cache** with single-flight refresh
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adapters`] | FRED, Binance, CryptoCompare and CoinGecko adapters |
//! | [`aggregate`] | One refresh cycle producing a [`MacroPayload`] |
//! | [`btc_history`] | Multi-provider BTC daily history and spot price |
//! | [`btc_model`] | Monthly RSI / stock-to-flow view and 200-day SMA |
//! | [`cache`] | Snapshot stores, single-flight coordinator, cache manager |
//! | [`calendar`] | Scheduled FOMC decisions |
//! | [`clock`] | Wall clock abstraction |
//! | [`config`] | Environment-backed [`EngineConfig`] |
//! | [`data_source`] | Provider traits |
//! | [`domain`] | Dates, observations, series and payload types |
//! | [`engine`] | Facade wiring everything together |
//! | [`error`] | [`EngineError`] taxonomy |
//! | [`fetch`] | Fetch-with-timeout helpers |
//! | [`http_client`] | HTTP transport contract, reqwest and canned implementations |
//! | [`metrics`] | Pure derived-metric functions |
//! | [`normalize`] | Forward-fill alignment |
//! | [`regime`] | Regime classification |
//! | [`source`] | Indicator and provider identifiers |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use macrodash_core::{Engine, EngineConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let engine = Engine::from_config(&EngineConfig::from_env());
//!     let payload = engine.get_macro_payload().await;
//!     println!("{:?} ({} of {} indicators)", payload.regime.macro_risk, payload.ok_count, payload.total_count);
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  CLI / Caller   │
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │  Cache Manager  │────▶│ Snapshot Store   │
//! └────────┬────────┘     └──────────────────┘
//!          │ single-flight refresh
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ Macro Aggregator│────▶│ Metrics / Regime │
//! └────────┬────────┘     └──────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ Provider Adapter│────▶│ HTTP Client      │
//! └─────────────────┘     └──────────────────┘
//! ```
//!
//! ## Error Handling
//!
//! Per-indicator failures are reported inside the payload. Only capabilities
//! without a partial-data fallback return an error:
//!
//! ```rust
//! use macrodash_core::EngineError;
//!
//! fn describe(error: &EngineError) -> String {
//!     format!("{}: {error}", error.code())
//! }
//! ```

pub mod adapters;
pub mod aggregate;
pub mod btc_history;
pub mod btc_model;
pub mod cache;
pub mod calendar;
pub mod clock;
pub mod config;
pub mod data_source;
pub mod domain;
pub mod engine;
pub mod error;
pub mod fetch;
pub mod http_client;
pub mod metrics;
pub mod normalize;
pub mod regime;
pub mod source;

// Adapter implementations
pub use adapters::{BinanceAdapter, CoinGeckoAdapter, CryptoCompareAdapter, FredAdapter};

// Aggregation
pub use aggregate::{MacroAggregator, PayloadSource};

// BTC history and model
pub use btc_history::{BtcHistoryResolver, SpotOrigin, SpotPrice};
pub use btc_model::{build_model_view, ModelView};

// Caching
pub use cache::{
    CacheManager, CacheSnapshot, FileSnapshotStore, MemorySnapshotStore, SingleFlight,
    SnapshotStore,
};
pub use clock::{Clock, ManualClock, SystemClock};

// Configuration and facade
pub use config::EngineConfig;
pub use engine::Engine;

// Provider traits
pub use data_source::{DailyPriceSource, IndicatorSource, SpotPriceSource};

// Domain models
pub use domain::{
    CacheState, CalendarDate, LatestValue, LiquidityPoint, MacroMetrics, MacroPayload,
    Observation, Series, SeriesStatus, UtcDateTime,
};

// Error types
pub use error::EngineError;

// HTTP client types
pub use http_client::{
    HttpClient, HttpError, HttpRequest, HttpResponse, ReqwestHttpClient, StaticHttpClient,
};

// Regime
pub use regime::{LiquidityRegime, RatesRegime, Regime, RiskLevel};

// Identifiers
pub use source::{BtcProviderId, IndicatorId};
