mod binance;
mod coingecko;
mod cryptocompare;
mod fred;

pub use binance::BinanceAdapter;
pub use coingecko::CoinGeckoAdapter;
pub use cryptocompare::CryptoCompareAdapter;
pub use fred::FredAdapter;
