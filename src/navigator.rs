use chrono::{Datelike, NaiveDate};

use crate::window::{VisibleWindow, WindowError};

/// Cursor over the visible `(year, month)` in list mode.
///
/// Transitions return a new cursor. There is no terminal state; the cursor only
/// stops at the edges of the representable calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthNavigator {
    year: i32,
    month: u32,
}

impl MonthNavigator {
    /// Starts on the month containing `today`. Callers read the clock; this does not.
    pub fn starting_at(today: NaiveDate) -> Self {
        Self {
            year: today.year(),
            month: today.month(),
        }
    }

    pub fn at(year: i32, month: i64) -> Result<Self, WindowError> {
        let window = VisibleWindow::new(year, month)?;
        Ok(Self {
            year: window.year(),
            month: window.month(),
        })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn current(&self) -> (i32, u32) {
        (self.year, self.month)
    }

    pub fn previous(self) -> Self {
        let (year, month) = if self.month == 1 {
            (self.year - 1, 12)
        } else {
            (self.year, self.month - 1)
        };
        if year < NaiveDate::MIN.year() {
            return self;
        }
        Self { year, month }
    }

    pub fn next(self) -> Self {
        let (year, month) = if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        };
        if year > NaiveDate::MAX.year() {
            return self;
        }
        Self { year, month }
    }

    pub fn window(&self) -> VisibleWindow {
        VisibleWindow::containing(
            NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN),
        )
    }
}
