use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::calendar::CalendarEvent;
use crate::domain::{CalendarDate, UtcDateTime};
use crate::regime::Regime;
use crate::source::IndicatorId;

/// One row of the composite liquidity series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiquidityPoint {
    pub date: CalendarDate,
    pub net_liquidity_index: f64,
    pub walcl: f64,
    pub rrp: f64,
    pub tga: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatestValue {
    pub date: CalendarDate,
    pub value: f64,
}

/// Fetch outcome for one indicator in one refresh cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesStatus {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SeriesStatus {
    pub const fn healthy() -> Self {
        Self {
            ok: true,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheState {
    Fresh,
    Stale,
    Error,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MacroMetrics {
    pub latest: BTreeMap<IndicatorId, LatestValue>,
    pub curve_spread: Option<f64>,
    pub net_liquidity_index: Option<f64>,
}

/// Aggregate root handed to consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MacroPayload {
    pub generated_at: UtcDateTime,
    pub metrics: MacroMetrics,
    pub liquidity_series: Vec<LiquidityPoint>,
    pub regime: Regime,
    pub calendar: Vec<CalendarEvent>,
    pub series_status: BTreeMap<IndicatorId, SeriesStatus>,
    pub ok_count: usize,
    pub total_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_state: Option<CacheState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_age_minutes: Option<u64>,
}

impl MacroPayload {
    /// Well-formed payload with no data, used when nothing could be fetched.
    pub fn empty(generated_at: UtcDateTime, series_status: BTreeMap<IndicatorId, SeriesStatus>) -> Self {
        let ok_count = series_status.values().filter(|s| s.ok).count();
        Self {
            generated_at,
            metrics: MacroMetrics::default(),
            liquidity_series: Vec::new(),
            regime: Regime::unknown(),
            calendar: Vec::new(),
            total_count: series_status.len(),
            ok_count,
            series_status,
            cache_state: None,
            cache_age_minutes: None,
        }
    }

    pub fn has_healthy_indicator(&self) -> bool {
        self.ok_count > 0
    }

    pub fn tagged(mut self, state: CacheState, age_minutes: u64) -> Self {
        self.cache_state = Some(state);
        self.cache_age_minutes = Some(age_minutes);
        self
    }

    /// Most recent `limit` rows of the liquidity series.
    pub fn liquidity_window(&self, limit: usize) -> &[LiquidityPoint] {
        let start = self.liquidity_series.len().saturating_sub(limit);
        &self.liquidity_series[start..]
    }
}
