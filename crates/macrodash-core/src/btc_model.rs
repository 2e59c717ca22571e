//! BTC valuation model view: monthly closes with RSI and stock-to-flow,
//! plus a long daily moving average.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::macros::date;
use time::Date;

use crate::domain::{CalendarDate, Observation};
use crate::metrics::{relative_strength_index, round2, simple_moving_average};

pub const BLOCKS_PER_DAY: f64 = 144.0;
pub const RSI_PERIOD: usize = 14;
pub const SMA_WINDOW: usize = 200;

const MODEL_INTERCEPT: f64 = -1.84;
const MODEL_SLOPE: f64 = 3.36;

/// One block-subsidy era, `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HalvingEpoch {
    pub start: CalendarDate,
    pub end: CalendarDate,
    pub reward: f64,
}

const fn epoch(start: Date, end: Date, reward: f64) -> HalvingEpoch {
    HalvingEpoch {
        start: CalendarDate::from_date(start),
        end: CalendarDate::from_date(end),
        reward,
    }
}

pub const HALVING_EPOCHS: [HalvingEpoch; 5] = [
    epoch(date!(2009 - 01 - 03), date!(2012 - 11 - 28), 50.0),
    epoch(date!(2012 - 11 - 28), date!(2016 - 07 - 09), 25.0),
    epoch(date!(2016 - 07 - 09), date!(2020 - 05 - 11), 12.5),
    epoch(date!(2020 - 05 - 11), date!(2024 - 04 - 20), 6.25),
    epoch(date!(2024 - 04 - 20), date!(2028 - 04 - 20), 3.125),
];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockToFlow {
    pub stock: f64,
    pub annual_flow: f64,
    pub ratio: f64,
    pub model_price: f64,
}

/// Estimated supply, issuance and model price at `on`.
///
/// `None` outside the halving table or when flow or ratio is non-positive.
pub fn stock_to_flow(on: CalendarDate) -> Option<StockToFlow> {
    let current = HALVING_EPOCHS
        .iter()
        .find(|epoch| epoch.start <= on && on < epoch.end)?;

    let stock: f64 = HALVING_EPOCHS
        .iter()
        .filter(|epoch| epoch.start <= on)
        .map(|epoch| {
            let elapsed = on.min(epoch.end).days_since(epoch.start) as f64;
            elapsed * BLOCKS_PER_DAY * epoch.reward
        })
        .sum();
    let annual_flow = current.reward * BLOCKS_PER_DAY * 365.0;
    if annual_flow <= 0.0 {
        return None;
    }

    let ratio = stock / annual_flow;
    if ratio <= 0.0 {
        return None;
    }

    Some(StockToFlow {
        stock,
        annual_flow,
        ratio,
        model_price: (MODEL_INTERCEPT + MODEL_SLOPE * ratio.ln()).exp(),
    })
}

/// Last observation of each calendar month, ascending.
pub fn monthly_closes(daily: &[Observation]) -> Vec<Observation> {
    let mut by_month: BTreeMap<(i32, u8), Observation> = BTreeMap::new();
    for point in daily {
        let key = (point.date.year(), point.date.month());
        match by_month.get(&key) {
            Some(existing) if existing.date > point.date => {}
            _ => {
                by_month.insert(key, *point);
            }
        }
    }
    by_month.into_values().collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyModelPoint {
    pub date: CalendarDate,
    pub close: f64,
    pub rsi: Option<f64>,
    pub stock_to_flow: Option<f64>,
    pub model_price: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmaPoint {
    pub date: CalendarDate,
    pub close: f64,
    pub sma: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelView {
    pub monthly: Vec<MonthlyModelPoint>,
    pub daily_sma: Vec<SmaPoint>,
    pub sma_window: usize,
}

impl ModelView {
    pub fn latest_monthly(&self) -> Option<&MonthlyModelPoint> {
        self.monthly.last()
    }
}

/// Builds the model view from date-ascending daily closes.
pub fn build_model_view(daily: &[Observation]) -> ModelView {
    let monthly = monthly_closes(daily);
    let monthly_values: Vec<f64> = monthly.iter().map(|point| point.value).collect();
    let rsi = relative_strength_index(&monthly_values, RSI_PERIOD);

    let monthly = monthly
        .iter()
        .zip(rsi)
        .map(|(point, rsi)| {
            let s2f = stock_to_flow(point.date);
            MonthlyModelPoint {
                date: point.date,
                close: point.value,
                rsi: rsi.map(round2),
                stock_to_flow: s2f.map(|s| round2(s.ratio)),
                model_price: s2f.map(|s| round2(s.model_price)),
            }
        })
        .collect();

    let daily_values: Vec<f64> = daily.iter().map(|point| point.value).collect();
    let daily_sma = daily
        .iter()
        .zip(simple_moving_average(&daily_values, SMA_WINDOW))
        .map(|(point, sma)| SmaPoint {
            date: point.date,
            close: point.value,
            sma: sma.map(round2),
        })
        .collect();

    ModelView {
        monthly,
        daily_sma,
        sma_window: SMA_WINDOW,
    }
}
