//! Periods are the calendar units covered by one remote archive, and
//! [`PeriodRange`] enumerates the periods covering an inclusive date span.

use crate::types::dataset::Granularity;
use chrono::{Datelike, NaiveDate};
use std::fmt;
use std::fmt::{Display, Formatter};

/// One remote archive / one cache slot: an anchor date plus its granularity.
///
/// Monthly periods are always anchored at the first day of their month.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Ord, PartialOrd, Hash)]
pub struct Period {
    anchor: NaiveDate,
    granularity: Granularity,
}

impl Period {
    /// Creates the period containing `date`.
    pub fn containing(date: NaiveDate, granularity: Granularity) -> Self {
        let anchor = match granularity {
            Granularity::Daily => date,
            Granularity::Monthly => first_of_month(date),
        };
        Self {
            anchor,
            granularity,
        }
    }

    pub fn anchor(&self) -> NaiveDate {
        self.anchor
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    /// `YYYYMMDD` of the anchor; used in archive names and cache keys.
    pub fn token(&self) -> String {
        self.anchor.format("%Y%m%d").to_string()
    }

    /// The following period, or `None` past the end of the calendar.
    pub fn next(&self) -> Option<Period> {
        let anchor = match self.granularity {
            Granularity::Daily => self.anchor.succ_opt()?,
            Granularity::Monthly => {
                let (year, month) = if self.anchor.month() == 12 {
                    (self.anchor.year().checked_add(1)?, 1)
                } else {
                    (self.anchor.year(), self.anchor.month() + 1)
                };
                NaiveDate::from_ymd_opt(year, month, 1)?
            }
        };
        Some(Period {
            anchor,
            granularity: self.granularity,
        })
    }
}

impl Display for Period {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.granularity {
            Granularity::Daily => write!(f, "{}", self.anchor.format("%Y-%m-%d")),
            Granularity::Monthly => write!(f, "{}", self.anchor.format("%Y-%m")),
        }
    }
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Lazy, finite sequence of the periods covering `[start, end]` (inclusive).
///
/// The range is `Clone`, so restarting is a matter of iterating a fresh copy.
/// Iteration stops once the current anchor passes `end`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodRange {
    current: Option<Period>,
    end: NaiveDate,
}

impl PeriodRange {
    pub fn new(granularity: Granularity, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            current: Some(Period::containing(start, granularity)),
            end,
        }
    }
}

impl Iterator for PeriodRange {
    type Item = Period;

    fn next(&mut self) -> Option<Period> {
        let period = self.current?;
        if period.anchor > self.end {
            self.current = None;
            return None;
        }
        self.current = period.next();
        Some(period)
    }
}
