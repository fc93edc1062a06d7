//! Inclusive date ranges for summaries, exports and transaction filters.

use serde::Serialize;
use time::{
    Date, Duration, Month,
    util::{days_in_year, is_leap_year},
};

use crate::Error;

/// An inclusive range of dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    /// The first date in the range.
    pub start: Date,
    /// The last date in the range.
    pub end: Date,
}

impl DateRange {
    /// Create a range from user supplied bounds.
    ///
    /// # Errors
    /// Returns an [Error::Validation] if `start` is after `end`.
    pub fn new(start: Date, end: Date) -> Result<Self, Error> {
        if start > end {
            return Err(Error::Validation(format!(
                "the start date {start} must not be after the end date {end}"
            )));
        }

        Ok(Self { start, end })
    }

    /// The range from the first to the last day of the month containing `date`.
    pub fn month_of(date: Date) -> Self {
        let start = date - Duration::days(i64::from(date.day()) - 1);
        let days_in_month = last_day_of_month(date.year(), date.month());

        Self {
            start,
            end: start + Duration::days(i64::from(days_in_month) - 1),
        }
    }

    /// The range from the 1st of January to the 31st of December of the year containing `date`.
    pub fn year_of(date: Date) -> Self {
        let start = date - Duration::days(i64::from(date.ordinal()) - 1);

        Self {
            start,
            end: start + Duration::days(i64::from(days_in_year(date.year())) - 1),
        }
    }

    /// The range from the same day `months` months before `date` up to and including `date`.
    ///
    /// If the earlier month is shorter, the start is clamped to its last day,
    /// e.g. three months before the 31st of May is the 28th or 29th of February.
    pub fn months_up_to(date: Date, months: u8) -> Self {
        let mut start = date;

        for _ in 0..months {
            let end_of_previous_month = start - Duration::days(i64::from(start.day()));
            let overshoot = end_of_previous_month.day().saturating_sub(date.day());
            start = end_of_previous_month - Duration::days(i64::from(overshoot));
        }

        Self { start, end: date }
    }

    /// Create a range from optional query parameters where both bounds are required.
    ///
    /// # Errors
    /// Returns an [Error::Validation] if either bound is missing or if `start` is after `end`.
    pub fn from_required_bounds(start: Option<Date>, end: Option<Date>) -> Result<Self, Error> {
        match (start, end) {
            (Some(start), Some(end)) => Self::new(start, end),
            _ => Err(Error::Validation(
                "startDate and endDate are required for a custom period".to_owned(),
            )),
        }
    }
}

fn last_day_of_month(year: i32, month: Month) -> u8 {
    match month {
        Month::January
        | Month::March
        | Month::May
        | Month::July
        | Month::August
        | Month::October
        | Month::December => 31,
        Month::April | Month::June | Month::September | Month::November => 30,
        Month::February => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
    }
}
