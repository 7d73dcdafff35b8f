use std::fmt;
use std::iter;

use thiserror::Error;

use crate::model::{Locale, RangeId};

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CalendarError {
    #[error("month {0} is outside 1..=12")]
    InvalidMonth(u8),
    #[error("day {day} does not exist in {year}-{month:02}")]
    InvalidDay { day: u8, month: u8, year: u16 },
}

// Plain `year % 4`; the date editor only spans 2000..=2060.
pub fn is_leap_year(year: u16) -> bool {
    year % 4 == 0
}

pub fn days_in_month(month: u8, year: u16) -> u8 {
    match month {
        2 if is_leap_year(year) => 29,
        2 => 28,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rollover {
    Day,
    Month,
    Year,
}

impl Rollover {
    pub fn range_for(self, locale: Locale) -> RangeId {
        match self {
            Rollover::Day => RangeId::DayStep(locale),
            Rollover::Month => RangeId::MonthStep(locale),
            Rollover::Year => RangeId::YearStep(locale),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CalendarDate {
    day: u8,
    month: u8,
    year: u16,
}

impl CalendarDate {
    pub fn new(day: u8, month: u8, year: u16) -> Result<Self, CalendarError> {
        if !(1..=12).contains(&month) {
            return Err(CalendarError::InvalidMonth(month));
        }
        if day == 0 || day > days_in_month(month, year) {
            return Err(CalendarError::InvalidDay { day, month, year });
        }
        Ok(Self { day, month, year })
    }

    pub fn day(&self) -> u8 {
        self.day
    }

    pub fn month(&self) -> u8 {
        self.month
    }

    pub fn year(&self) -> u16 {
        self.year
    }

    pub fn rollover(&self) -> Rollover {
        if self.day < days_in_month(self.month, self.year) {
            Rollover::Day
        } else if self.month == 12 {
            Rollover::Year
        } else {
            Rollover::Month
        }
    }

    pub fn next_day(&self) -> Self {
        self.advanced(self.rollover())
    }

    fn advanced(&self, rollover: Rollover) -> Self {
        match rollover {
            Rollover::Day => Self {
                day: self.day + 1,
                ..*self
            },
            Rollover::Month => Self {
                day: 1,
                month: self.month + 1,
                year: self.year,
            },
            Rollover::Year => Self {
                day: 1,
                month: 1,
                year: self.year.saturating_add(1),
            },
        }
    }
}

impl fmt::Display for CalendarDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

// Day-skip budget. `Pending(0)` still owes the return-to-game range.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipCountdown {
    Pending(u32),
    Finished,
}

impl SkipCountdown {
    pub fn as_signed(self) -> i64 {
        match self {
            SkipCountdown::Pending(remaining) => i64::from(remaining),
            SkipCountdown::Finished => -1,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CalendarState {
    pub date: CalendarDate,
    pub countdown: SkipCountdown,
    pub locale: Locale,
}

impl CalendarState {
    pub fn new(date: CalendarDate, skips: u32, locale: Locale) -> Self {
        Self {
            date,
            countdown: SkipCountdown::Pending(skips),
            locale,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlannedStep {
    pub range: RangeId,
    pub state_after: CalendarState,
}

#[derive(Clone, Debug)]
pub struct CalendarAdvancer {
    state: CalendarState,
}

impl CalendarAdvancer {
    pub fn new(state: CalendarState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &CalendarState {
        &self.state
    }

    pub fn next_range(&mut self) -> Option<RangeId> {
        match self.state.countdown {
            SkipCountdown::Finished => None,
            SkipCountdown::Pending(0) => {
                self.state.countdown = SkipCountdown::Finished;
                Some(RangeId::Teardown)
            }
            SkipCountdown::Pending(remaining) => {
                let rollover = self.state.date.rollover();
                self.state.date = self.state.date.next_day();
                self.state.countdown = SkipCountdown::Pending(remaining - 1);
                Some(rollover.range_for(self.state.locale))
            }
        }
    }

    pub fn required_ranges(&self) -> Vec<RangeId> {
        let mut ranges = vec![RangeId::Teardown];
        ranges.extend(RangeId::steps_for(self.state.locale));
        ranges
    }

    pub fn plan(&self) -> impl Iterator<Item = PlannedStep> {
        let mut preview = self.clone();
        iter::from_fn(move || {
            let range = preview.next_range()?;
            Some(PlannedStep {
                range,
                state_after: preview.state,
            })
        })
    }
}
