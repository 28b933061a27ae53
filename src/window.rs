use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use thiserror::Error;

use crate::domain::Event;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WindowError {
    #[error("month must be within 1..=12, got {0}")]
    InvalidMonth(i64),
    #[error("year {0} is outside the supported calendar range")]
    UnsupportedYear(i32),
}

/// A calendar month viewed in list mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VisibleWindow {
    year: i32,
    month: u32,
}

impl VisibleWindow {
    pub fn new(year: i32, month: i64) -> Result<Self, WindowError> {
        if !(1..=12).contains(&month) {
            return Err(WindowError::InvalidMonth(month));
        }
        let month = month as u32;
        if NaiveDate::from_ymd_opt(year, month, 1).is_none() {
            return Err(WindowError::UnsupportedYear(year));
        }
        Ok(Self { year, month })
    }

    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn first_day(&self) -> NaiveDate {
        // Constructors only admit representable months.
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    pub fn last_day(&self) -> NaiveDate {
        let days = days_in_month(self.year, self.month);
        NaiveDate::from_ymd_opt(self.year, self.month, days).unwrap_or(NaiveDate::MAX)
    }

    pub fn start(&self) -> NaiveDateTime {
        self.first_day().and_time(NaiveTime::MIN)
    }

    /// Last second of the month, inclusive.
    pub fn end(&self) -> NaiveDateTime {
        self.last_day().and_time(end_of_day())
    }

    /// Overlap test: a multi-day event that only touches the month still counts.
    pub fn overlaps(&self, event: &Event) -> bool {
        TemporalWindow::Range {
            start: self.start(),
            end: self.end(),
        }
        .admits(event)
    }

    /// Month and year, e.g. `July 2024`.
    pub fn label(&self) -> String {
        self.first_day().format("%B %Y").to_string()
    }
}

/// Presentation mode a window is computed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    Calendar,
    Month(VisibleWindow),
    Upcoming,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemporalWindow {
    Unbounded,
    Range {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },
    From(NaiveDateTime),
}

impl TemporalWindow {
    pub fn for_mode(mode: ViewMode, reference: NaiveDateTime) -> Self {
        match mode {
            ViewMode::Calendar => TemporalWindow::Unbounded,
            ViewMode::Month(window) => TemporalWindow::Range {
                start: window.start(),
                end: window.end(),
            },
            ViewMode::Upcoming => TemporalWindow::From(reference.date().and_time(NaiveTime::MIN)),
        }
    }

    pub fn admits(&self, event: &Event) -> bool {
        match *self {
            TemporalWindow::Unbounded => true,
            TemporalWindow::Range { start, end } => event.end >= start && event.start <= end,
            TemporalWindow::From(start) => event.end >= start,
        }
    }
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    if month == 12 {
        return 31;
    }
    NaiveDate::from_ymd_opt(year, month + 1, 1)
        .and_then(|first_of_next| first_of_next.pred_opt())
        .map(|last| last.day())
        .unwrap_or(31)
}

fn end_of_day() -> NaiveTime {
    NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN)
}
