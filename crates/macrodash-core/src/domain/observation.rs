use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::CalendarDate;

/// One dated observation of an indicator or price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub date: CalendarDate,
    pub value: f64,
}

impl Observation {
    /// Returns `None` for non-finite values so they never enter a series.
    pub fn new(date: CalendarDate, value: f64) -> Option<Self> {
        value.is_finite().then_some(Self { date, value })
    }
}

/// Date-ordered observations for one named indicator.
///
/// Construction sorts by date and resolves duplicate dates last-write-wins,
/// so every `Series` is strictly increasing in date.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Series {
    name: String,
    points: Vec<Observation>,
}

impl Series {
    pub fn new(name: impl Into<String>, points: impl IntoIterator<Item = Observation>) -> Self {
        let mut by_date = BTreeMap::new();
        for point in points {
            if point.value.is_finite() {
                by_date.insert(point.date, point.value);
            }
        }
        Self {
            name: name.into(),
            points: by_date
                .into_iter()
                .map(|(date, value)| Observation { date, value })
                .collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn points(&self) -> &[Observation] {
        &self.points
    }

    pub fn into_points(self) -> Vec<Observation> {
        self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn latest(&self) -> Option<Observation> {
        self.points.last().copied()
    }

    pub fn first(&self) -> Option<Observation> {
        self.points.first().copied()
    }

    pub fn dates(&self) -> Vec<CalendarDate> {
        self.points.iter().map(|p| p.date).collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }
}
