//! # Domain Models
//!
//! | Type | Description |
//! |------|-------------|
//! | [`CalendarDate`] | Day-precision date, `YYYY-MM-DD` on the wire |
//! | [`UtcDateTime`] | UTC timestamp for generation times |
//! | [`Observation`] | One dated value |
//! | [`Series`] | Date-ordered, de-duplicated observations for one indicator |
//! | [`MacroPayload`] | Aggregate root served to consumers |
//!
//! Series invariants are enforced at construction: non-finite values are
//! dropped and duplicate dates resolve last-write-wins.

mod date;
mod observation;
mod payload;
mod timestamp;

pub use date::CalendarDate;
pub use observation::{Observation, Series};
pub use payload::{
    CacheState, LatestValue, LiquidityPoint, MacroMetrics, MacroPayload, SeriesStatus,
};
pub use timestamp::UtcDateTime;
