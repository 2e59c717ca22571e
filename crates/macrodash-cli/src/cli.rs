//! CLI argument definitions for macrodash.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `macro` | Full macro payload (served from cache when possible) |
//! | `refresh` | Force a refresh of the macro snapshot |
//! | `latest` | Latest value and date per indicator |
//! | `regime` | Liquidity / rates / risk regime |
//! | `liquidity` | Net liquidity series window |
//! | `btc-history` | Merged BTC daily closes |
//! | `btc-model` | Monthly RSI / stock-to-flow view and 200-day SMA |
//! | `btc-spot` | Latest BTC price |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--cache-path` | env or `.cache/macro-snapshot.json` | Snapshot file |
//! | `--ttl-minutes` | env or `15` | Snapshot freshness window |
//! | `--no-fred-key` | `false` | Ignore any configured FRED key |
//!
//! # Examples
//!
//! ```bash
//! macrodash macro --pretty
//! macrodash regime
//! macrodash btc-history --tail 30
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Macro liquidity and Bitcoin dashboard data engine.
#[derive(Debug, Parser)]
#[command(
    name = "macrodash",
    author,
    version,
    about = "Macro liquidity and Bitcoin dashboard data engine",
    long_about = "Fetches Fed balance sheet, reverse repo, Treasury account, yields and the dollar \
index, derives a net liquidity index and regime, and serves BTC history and valuation \
models. Output is always JSON on stdout; logs go to stderr (RUST_LOG)."
)]
pub struct Cli {
    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Location of the macro snapshot file.
    #[arg(long, global = true)]
    pub cache_path: Option<PathBuf>,

    /// Minutes before the snapshot is considered stale.
    #[arg(long, global = true)]
    pub ttl_minutes: Option<u64>,

    /// Use the public CSV export even if a FRED API key is configured.
    #[arg(long, global = true, default_value_t = false)]
    pub no_fred_key: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Full macro payload.
    Macro,
    /// Force a refresh and print the resulting payload.
    Refresh,
    /// Latest value and date per indicator.
    Latest,
    /// Regime classification with rationale.
    Regime,
    /// Most recent net liquidity rows.
    Liquidity,
    /// Merged BTC daily history.
    BtcHistory(BtcHistoryArgs),
    /// BTC monthly model view and daily SMA.
    BtcModel,
    /// Latest BTC price.
    BtcSpot,
}

#[derive(Debug, Args)]
pub struct BtcHistoryArgs {
    /// Only print the most recent N observations.
    #[arg(long)]
    pub tail: Option<usize>,
}
