//! BTC endpoints. None of these has a partial-data fallback, so exhausted
//! providers surface as an error object.

use macrodash_core::{Engine, Observation};
use serde::Serialize;
use serde_json::Value;

use crate::cli::BtcHistoryArgs;
use crate::error::CliError;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HistoryView<'a> {
    total: usize,
    points: &'a [Observation],
}

pub async fn history(engine: &Engine, args: &BtcHistoryArgs) -> Result<Value, CliError> {
    let history = engine.btc_daily_history().await?;
    let start = args
        .tail
        .map(|tail| history.len().saturating_sub(tail))
        .unwrap_or(0);
    Ok(serde_json::to_value(HistoryView {
        total: history.len(),
        points: &history[start..],
    })?)
}

pub async fn model(engine: &Engine) -> Result<Value, CliError> {
    let view = engine.btc_model_view().await?;
    Ok(serde_json::to_value(view)?)
}

pub async fn spot(engine: &Engine) -> Result<Value, CliError> {
    let spot = engine.btc_spot_price().await?;
    Ok(serde_json::to_value(spot)?)
}
