use std::sync::Arc;
use std::time::Duration;

use macrodash_core::{
    BinanceAdapter, BtcProviderId, CalendarDate, CoinGeckoAdapter, CryptoCompareAdapter,
    DailyPriceSource, EngineError, FredAdapter, HttpError, IndicatorId, IndicatorSource,
    SpotPriceSource, StaticHttpClient,
};

const KLINES: &str = r#"[
    [1704067200000,"42283.58","44184.10","42180.77","44179.55","27174.3",1704153599999,"0",0,"0","0","0"],
    [1704153600000,"44179.55","45879.63","44148.34","44946.91","65146.4",1704239999999,"0",0,"0","0","0"]
]"#;

const HISTODAY: &str = r#"{"Response":"Success","Data":{"Data":[
    {"time":1704067200,"close":44179.55},
    {"time":1704153600,"close":44946.91}
]}}"#;

/// Midnight samples of 2024-01-02 and 2024-01-03 carry the closes of the
/// preceding days.
const MARKET_CHART: &str = r#"{"prices":[[1704153600000,44187.1],[1704240000000,44961.6]]}"#;

#[derive(Clone)]
struct ProviderCase {
    id: BtcProviderId,
    fragment: &'static str,
    body: &'static str,
    build: fn(Arc<StaticHttpClient>, Option<u64>) -> Arc<dyn DailyPriceSource>,
}

fn provider_cases() -> Vec<ProviderCase> {
    vec![
        ProviderCase {
            id: BtcProviderId::Binance,
            fragment: "klines",
            body: KLINES,
            build: |client, timeout| {
                let adapter = BinanceAdapter::new(client);
                Arc::new(match timeout {
                    Some(ms) => adapter.with_timeout_ms(ms),
                    None => adapter,
                })
            },
        },
        ProviderCase {
            id: BtcProviderId::CryptoCompare,
            fragment: "histoday",
            body: HISTODAY,
            build: |client, timeout| {
                let adapter = CryptoCompareAdapter::new(client);
                Arc::new(match timeout {
                    Some(ms) => adapter.with_timeout_ms(ms),
                    None => adapter,
                })
            },
        },
        ProviderCase {
            id: BtcProviderId::CoinGecko,
            fragment: "market_chart",
            body: MARKET_CHART,
            build: |client, timeout| {
                let adapter = CoinGeckoAdapter::new(client);
                Arc::new(match timeout {
                    Some(ms) => adapter.with_timeout_ms(ms),
                    None => adapter,
                })
            },
        },
    ]
}

#[tokio::test]
async fn daily_closes_are_dated_positive_and_finite_for_all_providers() {
    for case in provider_cases() {
        let client = Arc::new(StaticHttpClient::new().with_json(case.fragment, case.body));
        let source = (case.build)(client, None);

        assert_eq!(source.id(), case.id);
        let closes = source
            .daily_closes()
            .await
            .unwrap_or_else(|error| panic!("provider '{}' failed: {error}", case.id));

        assert_eq!(closes.len(), 2, "provider '{}': close count", case.id);
        assert_eq!(closes[0].date.to_string(), "2024-01-01", "provider '{}'", case.id);
        assert_eq!(closes[1].date.to_string(), "2024-01-02", "provider '{}'", case.id);
        assert!(
            closes.iter().all(|p| p.value.is_finite() && p.value > 0.0),
            "provider '{}': closes must be positive",
            case.id
        );
    }
}

#[tokio::test]
async fn schema_mismatch_is_transport_failure_for_all_providers() {
    for case in provider_cases() {
        let client = Arc::new(StaticHttpClient::new().with_json(case.fragment, r#"{"unexpected":true}"#));
        let error = (case.build)(client, None)
            .daily_closes()
            .await
            .expect_err("schema mismatch must fail");

        assert!(
            matches!(error, EngineError::TransportFailure(_)),
            "provider '{}': expected transport failure, got {error:?}",
            case.id
        );
    }
}

#[tokio::test]
async fn slow_provider_trips_its_own_deadline() {
    for case in provider_cases() {
        let client = Arc::new(
            StaticHttpClient::new()
                .with_json(case.fragment, case.body)
                .with_delay(Duration::from_millis(200)),
        );
        let error = (case.build)(client, Some(20))
            .daily_closes()
            .await
            .expect_err("deadline must fire");

        assert!(error.is_timeout(), "provider '{}': got {error:?}", case.id);
        assert_eq!(error.code(), "fetch.timeout");
    }
}

#[tokio::test]
async fn transport_errors_are_not_reported_as_timeouts() {
    for case in provider_cases() {
        let client = Arc::new(
            StaticHttpClient::new().with_failure(case.fragment, HttpError::transport("connection reset")),
        );
        let error = (case.build)(client, None)
            .daily_closes()
            .await
            .expect_err("transport failure");

        assert!(!error.is_timeout(), "provider '{}'", case.id);
        assert!(error.to_string().contains("connection reset"));
    }
}

#[tokio::test]
async fn binance_ticker_reports_spot_price() {
    let client = Arc::new(
        StaticHttpClient::new().with_json("ticker/price", r#"{"symbol":"BTCUSDT","price":"67012.50"}"#),
    );

    let price = BinanceAdapter::new(client)
        .spot_price()
        .await
        .expect("ticker succeeds");
    assert_eq!(price, 67_012.5);
}

#[tokio::test]
async fn fred_source_serves_every_indicator_from_csv_without_key() {
    let client = Arc::new(StaticHttpClient::new().with_json(
        "fredgraph.csv",
        "observation_date,VALUE\n2024-01-02,1.5\n2024-01-03,.\n2024-01-04,1.75\n",
    ));
    let start = CalendarDate::parse("2018-01-01").expect("valid");
    let source = FredAdapter::new(client.clone(), None, start);

    for id in IndicatorId::ALL {
        let series = source
            .fetch_series(id)
            .await
            .unwrap_or_else(|error| panic!("indicator '{id}' failed: {error}"));
        assert_eq!(series.name(), id.as_str());
        assert_eq!(series.values(), vec![1.5, 1.75], "indicator '{id}'");
    }

    let urls = client.requested_urls();
    assert_eq!(urls.len(), IndicatorId::ALL.len());
    for id in IndicatorId::ALL {
        let fragment = format!("id={}&", id.fred_series_id());
        assert!(urls.iter().any(|url| url.contains(&fragment)), "no request for {id}");
    }
}

#[tokio::test]
async fn fred_api_observations_respect_missing_marker() {
    let client = Arc::new(StaticHttpClient::new().with_json(
        "api.stlouisfed.org",
        r#"{"observations":[{"date":"2024-01-02","value":"4.01"},{"date":"2024-01-03","value":"."}]}"#,
    ));
    let start = CalendarDate::parse("2018-01-01").expect("valid");
    let source = FredAdapter::new(client.clone(), Some(String::from("secret")), start);

    let series = source
        .fetch_series(IndicatorId::Yield2y)
        .await
        .expect("api succeeds");

    assert_eq!(series.len(), 1);
    assert_eq!(series.latest().map(|p| p.value), Some(4.01));
    assert!(client.requested_urls()[0].contains("observation_start=2018-01-01"));
}
