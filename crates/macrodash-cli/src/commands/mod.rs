mod btc;
mod macro_payload;
mod views;

use macrodash_core::{Engine, EngineConfig};
use serde_json::Value;

use crate::cli::{Cli, Command};
use crate::error::CliError;

pub fn engine_config(cli: &Cli) -> EngineConfig {
    let mut config = EngineConfig::from_env();
    if let Some(path) = &cli.cache_path {
        config = config.with_cache_path(path.clone());
    }
    if let Some(minutes) = cli.ttl_minutes {
        config = config.with_ttl_minutes(minutes);
    }
    if cli.no_fred_key {
        config = config.without_fred_api_key();
    }
    config
}

pub async fn run(cli: &Cli, engine: &Engine) -> Result<Value, CliError> {
    match &cli.command {
        Command::Macro => macro_payload::run(engine).await,
        Command::Refresh => macro_payload::refresh(engine).await,
        Command::Latest => views::latest(engine).await,
        Command::Regime => views::regime(engine).await,
        Command::Liquidity => views::liquidity(engine).await,
        Command::BtcHistory(args) => btc::history(engine, args).await,
        Command::BtcModel => btc::model(engine).await,
        Command::BtcSpot => btc::spot(engine).await,
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use clap::Parser;

    use super::*;

    #[test]
    fn oversized_ttl_flag_saturates_instead_of_overflowing() {
        let cli = Cli::try_parse_from(["macrodash", "--ttl-minutes", "18446744073709551615", "macro"])
            .expect("valid args");

        let config = engine_config(&cli);

        assert_eq!(config.ttl(), Duration::from_secs(u64::MAX));
    }
}
