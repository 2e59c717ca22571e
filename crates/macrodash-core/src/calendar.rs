//! Scheduled macro events shown alongside the payload.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::CalendarDate;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    pub date: CalendarDate,
    pub title: String,
    pub kind: EventKind,
    pub days_until: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    FomcDecision,
}

/// FOMC rate decision days (second day of each two-day meeting), as
/// published by the Federal Reserve. Extend when the next year's schedule is
/// announced; [`schedule_end`] reports the last covered date.
const FOMC_DECISIONS: [(i32, u8, u8); 16] = [
    (2025, 1, 29),
    (2025, 3, 19),
    (2025, 5, 7),
    (2025, 6, 18),
    (2025, 7, 30),
    (2025, 9, 17),
    (2025, 10, 29),
    (2025, 12, 10),
    (2026, 1, 28),
    (2026, 3, 18),
    (2026, 4, 29),
    (2026, 6, 17),
    (2026, 7, 29),
    (2026, 9, 16),
    (2026, 10, 28),
    (2026, 12, 9),
];

/// Last decision date the built-in schedule knows about.
pub fn schedule_end() -> Option<CalendarDate> {
    FOMC_DECISIONS
        .last()
        .and_then(|&(year, month, day)| CalendarDate::from_ymd(year, month, day).ok())
}

/// The next `limit` events on or after `today`, soonest first.
///
/// Returns fewer than `limit` once `today` nears [`schedule_end`].
pub fn upcoming_events(today: CalendarDate, limit: usize) -> Vec<CalendarEvent> {
    let events: Vec<CalendarEvent> = FOMC_DECISIONS
        .iter()
        .filter_map(|&(year, month, day)| CalendarDate::from_ymd(year, month, day).ok())
        .filter(|date| *date >= today)
        .take(limit)
        .map(|date| CalendarEvent {
            date,
            title: String::from("FOMC rate decision"),
            kind: EventKind::FomcDecision,
            days_until: date.days_since(today),
        })
        .collect();

    if events.len() < limit {
        if let Some(end) = schedule_end() {
            warn!(
                %today,
                schedule_end = %end,
                found = events.len(),
                limit,
                "FOMC schedule is running out"
            );
        }
    }
    events
}
