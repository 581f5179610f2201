//! The 7-column cell layout of one month.

use chrono::NaiveDate;

use super::month::YearMonth;

pub const DAYS_PER_WEEK: usize = 7;

/// Column headers, Sunday first.
pub const WEEKDAY_LABELS: [&str; DAYS_PER_WEEK] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// Cells of a month laid out in complete weeks.
///
/// `None` cells are the blanks before the 1st and after the last day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthGrid {
    month: YearMonth,
    cells: Vec<Option<u32>>,
}

impl MonthGrid {
    pub fn build(month: YearMonth) -> Self {
        let leading = month.first_weekday_index() as usize;
        let days = month.days_in_month();

        let mut cells: Vec<Option<u32>> = std::iter::repeat_n(None, leading)
            .chain((1..=days).map(Some))
            .collect();
        while cells.len() % DAYS_PER_WEEK != 0 {
            cells.push(None);
        }

        MonthGrid { month, cells }
    }

    pub fn month(&self) -> YearMonth {
        self.month
    }

    pub fn cells(&self) -> &[Option<u32>] {
        &self.cells
    }

    pub fn weeks(&self) -> impl Iterator<Item = &[Option<u32>]> {
        self.cells.chunks(DAYS_PER_WEEK)
    }

    pub fn row_count(&self) -> usize {
        self.cells.len() / DAYS_PER_WEEK
    }

    pub fn row_of(cell_index: usize) -> usize {
        cell_index / DAYS_PER_WEEK
    }

    /// Cell index holding `day`, if the day exists in this month.
    pub fn cell_of(&self, day: u32) -> Option<usize> {
        if day == 0 || day > self.month.days_in_month() {
            return None;
        }
        Some(self.month.first_weekday_index() as usize + day as usize - 1)
    }

    /// Tooltips in the last two rows open upward so they stay on screen.
    pub fn tooltip_above(&self, cell_index: usize) -> bool {
        Self::row_of(cell_index) + 2 >= self.row_count()
    }

    pub fn is_today(&self, day: u32, today: NaiveDate) -> bool {
        self.month.contains(today) && chrono::Datelike::day(&today) == day
    }
}
