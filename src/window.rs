//! Current-month time window
//!
//! The month boundary is the sole criterion for which plays are in scope
//! for a run. It is computed in a fixed reference offset (the user's
//! locale) and carried alongside its UTC equivalent: the fetcher compares
//! item timestamps against the local boundary and page cursors against the
//! UTC one.

use chrono::{DateTime, Datelike, FixedOffset, NaiveTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthWindow {
    /// Midnight on the first day of the month in the reference offset.
    pub start_local: DateTime<FixedOffset>,
    /// The same instant expressed in UTC.
    pub start_utc: DateTime<Utc>,
    pub offset: FixedOffset,
}

impl MonthWindow {
    /// Resolve the window for the month containing `now`, as seen from
    /// `offset`. Pure function of the clock.
    pub fn current(now: DateTime<Utc>, offset: FixedOffset) -> Self {
        let local = now.with_timezone(&offset);
        let first = local.date_naive().with_day(1).unwrap_or(local.date_naive());
        let start_local = first
            .and_time(NaiveTime::MIN)
            .and_local_timezone(offset)
            .single()
            // fixed offsets have no gaps or folds
            .unwrap_or(local);

        Self {
            start_local,
            start_utc: start_local.with_timezone(&Utc),
            offset,
        }
    }

    /// Year-month key of the window, e.g. `2024-05`.
    pub fn year_month(&self) -> String {
        self.start_local.format("%Y-%m").to_string()
    }
}
