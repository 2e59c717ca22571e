//! Read-only slices of the cached macro payload.

use std::collections::BTreeMap;

use macrodash_core::aggregate::LIQUIDITY_WINDOW;
use macrodash_core::{CacheState, Engine, IndicatorId, LatestValue, LiquidityPoint, Regime};
use serde::Serialize;
use serde_json::Value;

use crate::error::CliError;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LatestView {
    latest: BTreeMap<IndicatorId, LatestValue>,
    curve_spread: Option<f64>,
    net_liquidity_index: Option<f64>,
    cache_state: Option<CacheState>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RegimeView {
    regime: Regime,
    cache_state: Option<CacheState>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LiquidityView<'a> {
    window: usize,
    points: &'a [LiquidityPoint],
    cache_state: Option<CacheState>,
}

pub async fn latest(engine: &Engine) -> Result<Value, CliError> {
    let payload = engine.get_macro_payload().await;
    Ok(serde_json::to_value(LatestView {
        latest: payload.metrics.latest,
        curve_spread: payload.metrics.curve_spread,
        net_liquidity_index: payload.metrics.net_liquidity_index,
        cache_state: payload.cache_state,
    })?)
}

pub async fn regime(engine: &Engine) -> Result<Value, CliError> {
    let payload = engine.get_macro_payload().await;
    Ok(serde_json::to_value(RegimeView {
        regime: payload.regime,
        cache_state: payload.cache_state,
    })?)
}

pub async fn liquidity(engine: &Engine) -> Result<Value, CliError> {
    let payload = engine.get_macro_payload().await;
    Ok(serde_json::to_value(LiquidityView {
        window: LIQUIDITY_WINDOW,
        points: payload.liquidity_window(LIQUIDITY_WINDOW),
        cache_state: payload.cache_state,
    })?)
}
