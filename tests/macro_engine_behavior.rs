//! Behaviour tests for the consumer-facing engine.
//!
//! Every scenario runs against canned upstream responses so the observable
//! payload is deterministic.

use std::sync::Arc;
use std::time::Duration;

use macrodash_core::regime::{LiquidityRegime, RatesRegime, RiskLevel};
use macrodash_core::btc_history::default_coverage_floor;
use macrodash_core::{
    BinanceAdapter, BtcHistoryResolver, CacheState, CoinGeckoAdapter, CryptoCompareAdapter,
    DailyPriceSource, Engine, EngineConfig, EngineError, HttpError, IndicatorId, ManualClock,
    MemorySnapshotStore, SpotOrigin, StaticHttpClient,
};
use tokio::time::Instant;

/// 2025-03-01T00:00:00Z
const NOW_MS: i64 = 1_740_787_200_000;

fn day(index: usize) -> String {
    if index < 31 {
        format!("2025-01-{:02}", index + 1)
    } else {
        format!("2025-02-{:02}", index - 30)
    }
}

fn fred_csv(series_id: &str, value: impl Fn(usize) -> f64) -> String {
    let mut body = format!("observation_date,{series_id}\n");
    for index in 0..40 {
        body.push_str(&format!("{},{}\n", day(index), value(index)));
    }
    body
}

fn with_indicator(client: StaticHttpClient, id: IndicatorId, body: String) -> StaticHttpClient {
    client.with_json(format!("id={}&", id.fred_series_id()), body)
}

/// Balance sheet, yields and the dollar all rising; reverse repo and TGA flat.
fn rising_macro_client() -> StaticHttpClient {
    let mut client = StaticHttpClient::new();
    for id in IndicatorId::ALL {
        let body = match id {
            IndicatorId::FedBalanceSheet => fred_csv("WALCL", |i| 7_000_000.0 + i as f64 * 1_000.0),
            IndicatorId::ReverseRepo => fred_csv("RRPONTSYD", |_| 100.0),
            IndicatorId::TreasuryAccount => fred_csv("WTREGEN", |_| 750_000.0),
            IndicatorId::Yield10y => fred_csv("DGS10", |i| 4.0 + i as f64 * 0.01),
            IndicatorId::Yield2y => fred_csv("DGS2", |_| 3.9),
            IndicatorId::RealYield10y => fred_csv("DFII10", |i| 1.8 + i as f64 * 0.01),
            IndicatorId::DollarIndex => fred_csv("DTWEXBGS", |i| 120.0 + i as f64 * 0.1),
        };
        client = with_indicator(client, id, body);
    }
    client
}

fn engine_with(client: StaticHttpClient) -> (Engine, Arc<StaticHttpClient>) {
    let client = Arc::new(client);
    let engine = Engine::with_parts(
        &EngineConfig::new(),
        client.clone(),
        Arc::new(MemorySnapshotStore::new()),
        Arc::new(ManualClock::new(NOW_MS)),
    );
    (engine, client)
}

// =============================================================================
// Macro payload
// =============================================================================

#[tokio::test]
async fn when_every_indicator_is_available_system_serves_complete_fresh_payload() {
    // Given: all seven indicators answer with 40 daily observations
    let (engine, client) = engine_with(rising_macro_client());

    // When: the payload is requested with no snapshot on hand
    let payload = engine.get_macro_payload().await;

    // Then: it was fetched inline, one request per indicator, and tagged fresh
    assert_eq!(client.request_count(), 7);
    assert_eq!(payload.cache_state, Some(CacheState::Fresh));
    assert_eq!(payload.cache_age_minutes, Some(0));
    assert_eq!((payload.ok_count, payload.total_count), (7, 7));
    assert_eq!(payload.generated_at.format_rfc3339(), "2025-03-01T00:00:00Z");

    // And: the derived metrics reflect the inputs
    assert_eq!(payload.metrics.curve_spread, Some(0.49));
    assert_eq!(payload.metrics.net_liquidity_index, Some(100.0));
    let latest_dxy = payload.metrics.latest[&IndicatorId::DollarIndex];
    assert_eq!(latest_dxy.date.to_string(), "2025-02-09");
    assert_eq!(payload.liquidity_series.len(), 40);
    assert_eq!(payload.liquidity_series[0].net_liquidity_index, 0.0);

    // And: the regime reads expanding liquidity against tightening rates
    assert_eq!(payload.regime.liquidity, LiquidityRegime::Expanding);
    assert_eq!(payload.regime.rates, RatesRegime::Tightening);
    assert_eq!(payload.regime.macro_risk, RiskLevel::High);
    assert_eq!(payload.regime.rationale.len(), 4);

    // And: upcoming FOMC decisions are listed from the generation date
    assert_eq!(payload.calendar.len(), 6);
    assert_eq!(payload.calendar[0].date.to_string(), "2025-03-19");
    assert_eq!(payload.calendar[0].days_until, 18);
}

#[tokio::test]
async fn when_some_indicators_fail_system_isolates_failures_in_series_status() {
    // Given: only the two Treasury yields are reachable
    let client = StaticHttpClient::new()
        .with_failure("id=WALCL&", HttpError::transport("connection reset"));
    let client = with_indicator(client, IndicatorId::Yield10y, fred_csv("DGS10", |_| 4.5));
    let client = with_indicator(client, IndicatorId::Yield2y, fred_csv("DGS2", |_| 4.0));
    let (engine, _client) = engine_with(client);

    // When: the payload is requested
    let payload = engine.get_macro_payload().await;

    // Then: it is well formed and reports each indicator separately
    assert_eq!((payload.ok_count, payload.total_count), (2, 7));
    assert!(payload.series_status[&IndicatorId::Yield10y].ok);
    let walcl = &payload.series_status[&IndicatorId::FedBalanceSheet];
    assert!(!walcl.ok);
    assert!(walcl.error.as_deref().unwrap_or_default().contains("connection reset"));
    assert!(!payload.series_status[&IndicatorId::DollarIndex].ok);

    // And: metrics needing the missing legs are absent, the rest present
    assert_eq!(payload.metrics.curve_spread, Some(0.5));
    assert!(payload.liquidity_series.is_empty());
    assert_eq!(payload.regime.macro_risk, RiskLevel::Unknown);
    assert!(payload.regime.rationale[0].contains("Insufficient data"));
    assert_eq!(payload.cache_state, Some(CacheState::Fresh));
}

#[tokio::test]
async fn when_every_indicator_fails_system_returns_error_tagged_empty_payload() {
    // Given: no upstream answers
    let (engine, _client) = engine_with(StaticHttpClient::new());

    // When: the payload is requested
    let payload = engine.get_macro_payload().await;

    // Then: a well-formed empty payload is returned instead of an error
    assert_eq!(payload.cache_state, Some(CacheState::Error));
    assert_eq!((payload.ok_count, payload.total_count), (0, 7));
    assert!(payload.metrics.latest.is_empty());
    assert_eq!(payload.regime.liquidity, LiquidityRegime::Unknown);

    let json = serde_json::to_value(&payload).expect("serializable");
    assert_eq!(json["cacheState"], "error");
    assert_eq!(json["seriesStatus"]["us10y"]["ok"], false);
}

// =============================================================================
// BTC history
// =============================================================================

const KLINES: &str = r#"[
    [1704067200000,"1","1","1","42000.0","1",0,"0",0,"0","0","0"],
    [1704153600000,"1","1","1","43000.0","1",0,"0",0,"0","0","0"]
]"#;

/// 2014-12-01 and 2024-01-02.
const HISTODAY: &str = r#"{"Response":"Success","Data":{"Data":[
    {"time":1417392000,"close":378.0},
    {"time":1704153600,"close":43100.0}
]}}"#;

#[tokio::test]
async fn when_one_btc_provider_fails_system_merges_the_rest_by_precedence() {
    // Given: Binance and CryptoCompare answer, CoinGecko is down
    let client = StaticHttpClient::new()
        .with_json("klines", KLINES)
        .with_json("histoday", HISTODAY)
        .with_failure("market_chart", HttpError::timeout("upstream stalled"));
    let (engine, _client) = engine_with(client);

    // When: the daily history is resolved
    let history = engine.btc_daily_history().await.expect("coverage satisfied");

    // Then: dates are unique and ascending
    let dates: Vec<String> = history.iter().map(|p| p.date.to_string()).collect();
    assert_eq!(dates, vec!["2014-12-01", "2024-01-01", "2024-01-02"]);

    // And: the higher-precedence provider wins the shared date
    assert_eq!(history[2].value, 43_100.0);
    assert_eq!(history[1].value, 42_000.0);
}

#[tokio::test]
async fn when_no_provider_reaches_the_floor_system_reports_insufficient_history() {
    // Given: only recent Binance data is available
    let (engine, _client) = engine_with(StaticHttpClient::new().with_json("klines", KLINES));

    // When: the daily history is resolved
    let error = engine
        .btc_daily_history()
        .await
        .expect_err("recent data alone is not enough");

    // Then: the failure is explicit
    assert!(matches!(error, EngineError::InsufficientHistory(_)));
    assert_eq!(error.code(), "history.insufficient");
}

#[tokio::test]
async fn when_the_ticker_fails_system_falls_back_to_merged_history_for_spot() {
    // Given: the ticker is down but history is available
    let client = StaticHttpClient::new()
        .with_failure("ticker/price", HttpError::transport("503"))
        .with_json("klines", KLINES)
        .with_json("histoday", HISTODAY);
    let (engine, _client) = engine_with(client);

    // When: the spot price is requested
    let spot = engine.btc_spot_price().await.expect("fallback succeeds");

    // Then: the last merged close is served
    assert_eq!(spot.origin, SpotOrigin::MergedHistory);
    assert_eq!(spot.price, 43_100.0);
}

#[tokio::test]
async fn when_the_ticker_answers_system_serves_exchange_spot() {
    // Given: a healthy ticker
    let client = StaticHttpClient::new().with_json("ticker/price", r#"{"price":"65000.10"}"#);
    let (engine, client) = engine_with(client);

    // When: the spot price is requested
    let spot = engine.btc_spot_price().await.expect("ticker succeeds");

    // Then: history was never needed
    assert_eq!(spot.origin, SpotOrigin::Exchange);
    assert_eq!(spot.price, 65_000.1);
    assert_eq!(client.request_count(), 1);
}

#[tokio::test]
async fn when_history_resolves_system_builds_model_view() {
    // Given: merged history spanning 2014 to 2024
    let client = StaticHttpClient::new()
        .with_json("klines", KLINES)
        .with_json("histoday", HISTODAY);
    let (engine, _client) = engine_with(client);

    // When: the model view is requested
    let view = engine.btc_model_view().await.expect("history resolves");

    // Then: one monthly row per calendar month present, with stock-to-flow
    assert_eq!(view.monthly.len(), 2);
    assert_eq!(view.monthly[0].date.to_string(), "2014-12-01");
    assert_eq!(view.monthly[1].close, 43_100.0);
    assert!(view.monthly.iter().all(|p| p.model_price.is_some()));
    assert!(view.monthly.iter().all(|p| p.rsi.is_none()));

    // And: the daily SMA is aligned to the history and not yet filled
    assert_eq!(view.daily_sma.len(), 3);
    assert!(view.daily_sma.iter().all(|p| p.sma.is_none()));
}

// =============================================================================
// Concurrency
// =============================================================================

#[tokio::test(start_paused = true)]
async fn when_every_indicator_is_slow_system_waits_for_one_round_trip_not_seven() {
    // Given: each indicator takes 50ms to answer
    let (engine, client) =
        engine_with(rising_macro_client().with_delay(Duration::from_millis(50)));

    // When: the payload is built
    let started = Instant::now();
    let payload = engine.refresh_macro_payload().await;
    let elapsed = started.elapsed();

    // Then: the seven fetches overlapped instead of queueing
    assert_eq!(client.request_count(), 7);
    assert_eq!(payload.ok_count, 7);
    assert!(elapsed >= Duration::from_millis(50), "elapsed {elapsed:?}");
    assert!(elapsed < Duration::from_millis(100), "elapsed {elapsed:?}");
}

#[tokio::test(start_paused = true)]
async fn when_one_btc_provider_hangs_system_resolves_at_its_deadline() {
    // Given: two providers answering in one second and Binance hanging past
    // its two-second deadline
    let hanging = Arc::new(
        StaticHttpClient::new()
            .with_json("klines", KLINES)
            .with_delay(Duration::from_secs(60)),
    );
    let answering = Arc::new(
        StaticHttpClient::new()
            .with_json("histoday", HISTODAY)
            .with_json(
                "market_chart",
                r#"{"prices":[[1704153600000,43200.0],[1704240000000,44000.0]]}"#,
            )
            .with_delay(Duration::from_secs(1)),
    );
    let providers: Vec<Arc<dyn DailyPriceSource>> = vec![
        Arc::new(BinanceAdapter::new(hanging).with_timeout_ms(2_000)),
        Arc::new(CryptoCompareAdapter::new(answering.clone())),
        Arc::new(CoinGeckoAdapter::new(answering)),
    ];
    let resolver = BtcHistoryResolver::new(providers, default_coverage_floor());

    // When: the history is resolved
    let started = Instant::now();
    let history = resolver.resolve().await.expect("remaining providers cover the floor");
    let elapsed = started.elapsed();

    // Then: the hung provider cost only its own deadline
    assert!(elapsed >= Duration::from_secs(2), "elapsed {elapsed:?}");
    assert!(elapsed < Duration::from_secs(3), "elapsed {elapsed:?}");
    assert_eq!(history[0].date.to_string(), "2014-12-01");
    assert!(history.iter().all(|p| p.value != 42_000.0 && p.value != 43_000.0));
}
