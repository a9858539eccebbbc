//! Time source for calendar days and timestamps.
//!
//! "Today" is the local calendar date under a fixed UTC offset, truncated to
//! midnight. Engine code never reads the system clock directly.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Offset, Utc};
use std::cell::Cell;

pub trait Clock {
    /// Current instant as Unix epoch milliseconds.
    fn now_ms(&self) -> i64;
    /// Current local calendar day.
    fn today(&self) -> NaiveDate;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_ms(&self) -> i64 {
        (**self).now_ms()
    }

    fn today(&self) -> NaiveDate {
        (**self).today()
    }
}

/// Wall clock with a configured UTC offset.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    offset: FixedOffset,
}

impl SystemClock {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    pub fn utc() -> Self {
        Self::new(utc_offset())
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        Utc::now().timestamp_millis()
    }

    fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.offset).date_naive()
    }
}

/// Manually advanced clock for tests and replays.
#[derive(Debug, Clone)]
pub struct FixedClock {
    now: Cell<DateTime<Utc>>,
    offset: FixedOffset,
}

impl FixedClock {
    /// Starts at noon UTC of `day`.
    pub fn at(day: NaiveDate) -> Self {
        let noon = day
            .and_hms_opt(12, 0, 0)
            .unwrap_or_default()
            .and_utc();
        Self {
            now: Cell::new(noon),
            offset: utc_offset(),
        }
    }

    pub fn with_offset(mut self, offset: FixedOffset) -> Self {
        self.offset = offset;
        self
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    pub fn advance_days(&self, days: i64) {
        self.advance(Duration::days(days));
    }
}

impl Clock for FixedClock {
    fn now_ms(&self) -> i64 {
        self.now.get().timestamp_millis()
    }

    fn today(&self) -> NaiveDate {
        self.now.get().with_timezone(&self.offset).date_naive()
    }
}

fn utc_offset() -> FixedOffset {
    Utc.fix()
}

#[cfg(test)]
mod tests {
    use super::{Clock, FixedClock};
    use chrono::{Duration, FixedOffset, NaiveDate};

    #[test]
    fn offset_moves_calendar_day() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        let clock = FixedClock::at(day);
        clock.advance(Duration::hours(11));
        assert_eq!(clock.today(), day);

        let east = clock.clone().with_offset(FixedOffset::east_opt(2 * 3600).unwrap());
        assert_eq!(east.today(), NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
    }

    #[test]
    fn advance_days_moves_now() {
        let clock = FixedClock::at(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        let before = clock.now_ms();
        clock.advance_days(2);
        assert_eq!(clock.now_ms() - before, 2 * 24 * 3600 * 1000);
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2024, 5, 3).unwrap());
    }
}
