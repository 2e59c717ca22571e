use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::EngineError;

/// The seven macro indicators fetched on every refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum IndicatorId {
    /// Fed total assets (weekly, millions USD).
    #[serde(rename = "walcl")]
    FedBalanceSheet,
    /// Overnight reverse repo (daily, billions USD).
    #[serde(rename = "rrp")]
    ReverseRepo,
    /// Treasury general account (weekly, millions USD).
    #[serde(rename = "tga")]
    TreasuryAccount,
    #[serde(rename = "us10y")]
    Yield10y,
    #[serde(rename = "us2y")]
    Yield2y,
    #[serde(rename = "real10y")]
    RealYield10y,
    #[serde(rename = "dxy")]
    DollarIndex,
}

impl IndicatorId {
    pub const ALL: [Self; 7] = [
        Self::FedBalanceSheet,
        Self::ReverseRepo,
        Self::TreasuryAccount,
        Self::Yield10y,
        Self::Yield2y,
        Self::RealYield10y,
        Self::DollarIndex,
    ];

    /// Key used in payload maps.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FedBalanceSheet => "walcl",
            Self::ReverseRepo => "rrp",
            Self::TreasuryAccount => "tga",
            Self::Yield10y => "us10y",
            Self::Yield2y => "us2y",
            Self::RealYield10y => "real10y",
            Self::DollarIndex => "dxy",
        }
    }

    /// Upstream FRED series identifier.
    pub const fn fred_series_id(self) -> &'static str {
        match self {
            Self::FedBalanceSheet => "WALCL",
            Self::ReverseRepo => "RRPONTSYD",
            Self::TreasuryAccount => "WTREGEN",
            Self::Yield10y => "DGS10",
            Self::Yield2y => "DGS2",
            Self::RealYield10y => "DFII10",
            Self::DollarIndex => "DTWEXBGS",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::FedBalanceSheet => "Fed balance sheet",
            Self::ReverseRepo => "Reverse repo",
            Self::TreasuryAccount => "Treasury general account",
            Self::Yield10y => "10-year Treasury yield",
            Self::Yield2y => "2-year Treasury yield",
            Self::RealYield10y => "10-year real yield",
            Self::DollarIndex => "Broad dollar index",
        }
    }
}

impl Display for IndicatorId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Independent providers of daily BTC closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BtcProviderId {
    Binance,
    CryptoCompare,
    CoinGecko,
}

impl BtcProviderId {
    /// Merge precedence, lowest first. A later provider overwrites an earlier
    /// one on a shared date.
    pub const PRECEDENCE: [Self; 3] = [Self::Binance, Self::CryptoCompare, Self::CoinGecko];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Binance => "binance",
            Self::CryptoCompare => "cryptocompare",
            Self::CoinGecko => "coingecko",
        }
    }
}

impl Display for BtcProviderId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BtcProviderId {
    type Err = EngineError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "binance" => Ok(Self::Binance),
            "cryptocompare" => Ok(Self::CryptoCompare),
            "coingecko" => Ok(Self::CoinGecko),
            other => Err(EngineError::transport(format!(
                "unknown BTC provider '{other}'"
            ))),
        }
    }
}
