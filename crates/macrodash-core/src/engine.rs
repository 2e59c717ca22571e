//! Consumer-facing facade wiring sources, cache and BTC resolver together.

use std::sync::Arc;

use crate::adapters::FredAdapter;
use crate::aggregate::MacroAggregator;
use crate::btc_history::{BtcHistoryResolver, SpotPrice};
use crate::btc_model::{build_model_view, ModelView};
use crate::cache::{CacheManager, FileSnapshotStore, SnapshotStore};
use crate::clock::{Clock, SystemClock};
use crate::config::EngineConfig;
use crate::domain::{MacroPayload, Observation};
use crate::http_client::{HttpClient, ReqwestHttpClient};
use crate::EngineError;

pub struct Engine {
    cache: CacheManager,
    btc: BtcHistoryResolver,
}

impl Engine {
    /// Production wiring: reqwest transport, system clock, file snapshot.
    pub fn from_config(config: &EngineConfig) -> Self {
        let store = Arc::new(FileSnapshotStore::new(config.cache_path()));
        Self::with_parts(
            config,
            Arc::new(ReqwestHttpClient::new()),
            store,
            Arc::new(SystemClock),
        )
    }

    pub fn with_parts(
        config: &EngineConfig,
        http_client: Arc<dyn HttpClient>,
        store: Arc<dyn SnapshotStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let fred = FredAdapter::new(
            Arc::clone(&http_client),
            config.fred_api_key().map(str::to_owned),
            config.observation_start(),
        );
        let aggregator = MacroAggregator::new(Arc::new(fred), Arc::clone(&clock));
        let cache = CacheManager::new(Arc::new(aggregator), store, clock).with_ttl(config.ttl());

        Self {
            cache,
            btc: BtcHistoryResolver::with_http_client(http_client),
        }
    }

    pub fn cache(&self) -> &CacheManager {
        &self.cache
    }

    pub async fn get_macro_payload(&self) -> MacroPayload {
        self.cache.get_macro_payload().await
    }

    pub async fn refresh_macro_payload(&self) -> MacroPayload {
        self.cache.refresh().await
    }

    pub async fn btc_daily_history(&self) -> Result<Vec<Observation>, EngineError> {
        self.btc.resolve().await
    }

    pub async fn btc_model_view(&self) -> Result<ModelView, EngineError> {
        let history = self.btc.resolve().await?;
        Ok(build_model_view(&history))
    }

    pub async fn btc_spot_price(&self) -> Result<SpotPrice, EngineError> {
        self.btc.spot_price().await
    }
}
