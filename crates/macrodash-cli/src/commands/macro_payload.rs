use macrodash_core::Engine;
use serde_json::Value;
use tracing::info;

use crate::error::CliError;

pub async fn run(engine: &Engine) -> Result<Value, CliError> {
    let payload = engine.get_macro_payload().await;
    info!(
        cache_state = ?payload.cache_state,
        ok = payload.ok_count,
        total = payload.total_count,
        "macro payload served"
    );
    Ok(serde_json::to_value(payload)?)
}

pub async fn refresh(engine: &Engine) -> Result<Value, CliError> {
    let payload = engine.refresh_macro_payload().await;
    info!(cache_state = ?payload.cache_state, "macro payload refreshed");
    Ok(serde_json::to_value(payload)?)
}
