//! Derived metrics computed from aligned series.
//!
//! All functions are pure and recompute from scratch; nothing is
//! incremental across aggregations.

use crate::domain::{CalendarDate, LiquidityPoint};

/// Rounds to two decimal places, half away from zero.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Min-max normalization onto 0–100 within the slice.
///
/// A flat slice (max == min) divides by 1 instead of 0, so every value maps
/// to 0.
pub fn min_max_normalize(values: &[f64]) -> Vec<f64> {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = if max - min == 0.0 { 1.0 } else { max - min };
    values.iter().map(|v| (v - min) / span * 100.0).collect()
}

/// Net liquidity index over the common tail of three aligned series.
///
/// The inputs are truncated to the shortest length, keeping the most recent
/// end, then each is normalized independently and combined as
/// `balance_sheet - reverse_repo - treasury_account`.
pub fn net_liquidity_index(
    balance_sheet: &[f64],
    reverse_repo: &[f64],
    treasury_account: &[f64],
) -> Vec<f64> {
    let len = balance_sheet
        .len()
        .min(reverse_repo.len())
        .min(treasury_account.len());
    if len == 0 {
        return Vec::new();
    }

    let tail = |values: &[f64]| values[values.len() - len..].to_vec();
    let walcl = min_max_normalize(&tail(balance_sheet));
    let rrp = min_max_normalize(&tail(reverse_repo));
    let tga = min_max_normalize(&tail(treasury_account));

    walcl
        .iter()
        .zip(&rrp)
        .zip(&tga)
        .map(|((w, r), t)| round2(w - r - t))
        .collect()
}

/// Builds composite rows from `(date, walcl, rrp, tga)` aligned tuples.
pub fn liquidity_series(rows: &[(CalendarDate, f64, f64, f64)]) -> Vec<LiquidityPoint> {
    let walcl: Vec<f64> = rows.iter().map(|r| r.1).collect();
    let rrp: Vec<f64> = rows.iter().map(|r| r.2).collect();
    let tga: Vec<f64> = rows.iter().map(|r| r.3).collect();
    let index = net_liquidity_index(&walcl, &rrp, &tga);

    rows.iter()
        .zip(index)
        .map(|(&(date, walcl, rrp, tga), net_liquidity_index)| LiquidityPoint {
            date,
            net_liquidity_index,
            walcl,
            rrp,
            tga,
        })
        .collect()
}

/// Mean of the most recent `window` samples, `None` if there are fewer.
pub fn rolling_average(values: &[f64], window: usize) -> Option<f64> {
    if window == 0 || values.len() < window {
        return None;
    }
    let recent = &values[values.len() - window..];
    Some(recent.iter().sum::<f64>() / window as f64)
}

/// Latest 10-year minus latest 2-year yield.
pub fn curve_spread(yield_10y: Option<f64>, yield_2y: Option<f64>) -> Option<f64> {
    match (yield_10y, yield_2y) {
        (Some(long), Some(short)) if long.is_finite() && short.is_finite() => {
            Some(round2(long - short))
        }
        _ => None,
    }
}

/// Simple moving average aligned to the input, `None` until the window fills.
///
/// Maintained with a running sum, so each point costs O(1).
pub fn simple_moving_average(values: &[f64], window: usize) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; values.len()];
    }
    let mut out = Vec::with_capacity(values.len());
    let mut sum = 0.0;
    for (index, value) in values.iter().enumerate() {
        sum += value;
        if index >= window {
            sum -= values[index - window];
        }
        if index + 1 >= window {
            out.push(Some(sum / window as f64));
        } else {
            out.push(None);
        }
    }
    out
}

/// Wilder RSI aligned to the input.
///
/// The first value appears at index `period` (once `period` deltas exist);
/// seeded with simple averages of the first `period` gains and losses, then
/// smoothed as `(prev * (period - 1) + current) / period`.
pub fn relative_strength_index(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; closes.len()];
    if period == 0 || closes.len() <= period {
        return out;
    }

    let rsi = |gain: f64, loss: f64| {
        if loss == 0.0 {
            100.0
        } else {
            100.0 - 100.0 / (1.0 + gain / loss)
        }
    };

    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;
    for i in 1..=period {
        let delta = closes[i] - closes[i - 1];
        if delta > 0.0 {
            avg_gain += delta;
        } else {
            avg_loss -= delta;
        }
    }
    avg_gain /= period as f64;
    avg_loss /= period as f64;
    out[period] = Some(rsi(avg_gain, avg_loss));

    let weight = (period - 1) as f64;
    for i in (period + 1)..closes.len() {
        let delta = closes[i] - closes[i - 1];
        let (gain, loss) = if delta > 0.0 { (delta, 0.0) } else { (0.0, -delta) };
        avg_gain = (avg_gain * weight + gain) / period as f64;
        avg_loss = (avg_loss * weight + loss) / period as f64;
        out[i] = Some(rsi(avg_gain, avg_loss));
    }

    out
}
