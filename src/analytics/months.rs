//! Calendar-month windows for the trailing growth series.
//!
//! Bounds are computed in the caller's local UTC offset and rendered as
//! canonical `YYYY-MM-DDTHH:MM:SS.sssZ` strings. Membership is a lexical
//! range check on the raw `created_at` strings.

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, TimeZone};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::timestamp::to_iso_millis;

/// One calendar month with inclusive ISO-string bounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct MonthWindow {
    /// Short month name (`Jan`, `Feb`, ...).
    pub label: String,
    /// Calendar year.
    pub year: i32,
    /// First instant of the month.
    pub start: String,
    /// Last millisecond of the month.
    pub end: String,
}

impl MonthWindow {
    /// The month that lies `months_back` months before `now`'s month.
    ///
    /// Returns `None` only for dates outside chrono's supported range.
    #[must_use]
    pub fn before(now: DateTime<FixedOffset>, months_back: u32) -> Option<Self> {
        let index = i64::from(now.year()) * 12 + i64::from(now.month0()) - i64::from(months_back);
        let (year, month0) = (index.div_euclid(12), index.rem_euclid(12));
        let year = i32::try_from(year).ok()?;
        let month = u32::try_from(month0).ok()? + 1;

        let first = NaiveDate::from_ymd_opt(year, month, 1)?;
        let next_first = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)?
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)?
        };
        let offset = *now.offset();
        let start = offset
            .from_local_datetime(&first.and_hms_opt(0, 0, 0)?)
            .single()?;
        let end = offset
            .from_local_datetime(&next_first.and_hms_opt(0, 0, 0)?)
            .single()?
            - Duration::milliseconds(1);

        Some(Self {
            label: start.format("%b").to_string(),
            year,
            start: to_iso_millis(&start),
            end: to_iso_millis(&end),
        })
    }

    /// Inclusive lexical range check on an ISO timestamp string.
    #[must_use]
    pub fn contains(&self, created_at: &str) -> bool {
        created_at >= self.start.as_str() && created_at <= self.end.as_str()
    }
}

/// The `count` calendar months ending with `now`'s month, oldest first.
#[must_use]
pub fn trailing_months(now: DateTime<FixedOffset>, count: u32) -> Vec<MonthWindow> {
    (0..count)
        .rev()
        .filter_map(|back| MonthWindow::before(now, back))
        .collect()
}
