//! Qualitative liquidity / rates / risk regime from trailing-average trends.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LiquidityRegime {
    Expanding,
    Contracting,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RatesRegime {
    Easing,
    Tightening,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Unknown,
}

impl RiskLevel {
    /// Maps a 0–4 risk score: 0–1 low, 2 medium, 3–4 high.
    pub const fn from_score(score: u8) -> Self {
        match score {
            0 | 1 => Self::Low,
            2 => Self::Medium,
            _ => Self::High,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Regime {
    pub liquidity: LiquidityRegime,
    pub rates: RatesRegime,
    pub macro_risk: RiskLevel,
    pub rationale: Vec<String>,
}

impl Regime {
    pub fn unknown() -> Self {
        Self {
            liquidity: LiquidityRegime::Unknown,
            rates: RatesRegime::Unknown,
            macro_risk: RiskLevel::Unknown,
            rationale: vec![String::from(
                "Insufficient data: at least one signal lacks a current value or a 30-sample average.",
            )],
        }
    }
}

/// Current value against its trailing average.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendSignal {
    pub current: f64,
    pub average: f64,
}

impl TrendSignal {
    pub const fn new(current: f64, average: f64) -> Self {
        Self { current, average }
    }

    /// Missing legs become NaN so the classifier reports `Unknown`.
    pub fn from_options(current: Option<f64>, average: Option<f64>) -> Self {
        Self::new(current.unwrap_or(f64::NAN), average.unwrap_or(f64::NAN))
    }

    pub fn is_finite(self) -> bool {
        self.current.is_finite() && self.average.is_finite()
    }

    pub fn delta(self) -> f64 {
        self.current - self.average
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegimeInputs {
    pub net_liquidity: TrendSignal,
    pub nominal_yield: TrendSignal,
    pub real_yield: TrendSignal,
    pub dollar_index: TrendSignal,
}

pub fn classify(inputs: &RegimeInputs) -> Regime {
    let signals = [
        inputs.net_liquidity,
        inputs.nominal_yield,
        inputs.real_yield,
        inputs.dollar_index,
    ];
    if !signals.iter().all(|signal| signal.is_finite()) {
        return Regime::unknown();
    }

    let liquidity_delta = inputs.net_liquidity.delta();
    let nominal_delta = inputs.nominal_yield.delta();
    let real_delta = inputs.real_yield.delta();
    let dollar_delta = inputs.dollar_index.delta();

    let liquidity = if inputs.net_liquidity.current >= inputs.net_liquidity.average {
        LiquidityRegime::Expanding
    } else {
        LiquidityRegime::Contracting
    };
    let rates = if inputs.nominal_yield.current <= inputs.nominal_yield.average {
        RatesRegime::Easing
    } else {
        RatesRegime::Tightening
    };

    let score = [
        liquidity_delta < 0.0,
        nominal_delta > 0.0,
        real_delta > 0.0,
        dollar_delta > 0.0,
    ]
    .iter()
    .filter(|hit| **hit)
    .count() as u8;

    Regime {
        liquidity,
        rates,
        macro_risk: RiskLevel::from_score(score),
        rationale: vec![
            format!("Net liquidity vs 30-sample average: {liquidity_delta:+.2}"),
            format!("10Y yield vs 30-sample average: {nominal_delta:+.2}"),
            format!("10Y real yield vs 30-sample average: {real_delta:+.2}"),
            format!("Dollar index vs 30-sample average: {dollar_delta:+.2}"),
        ],
    }
}
