//! Month calendar view.
//!
//! `CalendarView` owns the display state (viewed month, selected and hovered
//! day, zone mode) and the day buckets derived from it. The event list is
//! borrowed; the buckets are rebuilt whenever the list, the month or the zone
//! mode changes, and reused otherwise.

mod bucket;
mod grid;
mod month;

pub use bucket::{DayBuckets, bucket_events};
pub use grid::{DAYS_PER_WEEK, MonthGrid, WEEKDAY_LABELS};
pub use month::{MonthStep, YearMonth};

use chrono::NaiveDate;

use crate::clock::{Clock, SystemClock};
use crate::event::{Chronological, Event};
use crate::zone::{DisplayZones, TimeZoneMode};

/// Mutable display state of a calendar view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayState {
    pub month: YearMonth,
    pub selected: Option<u32>,
    pub hovered: Option<u32>,
    pub mode: TimeZoneMode,
}

impl DisplayState {
    pub fn new(today: NaiveDate, mode: TimeZoneMode) -> Self {
        DisplayState {
            month: YearMonth::of(today),
            selected: None,
            hovered: None,
            mode,
        }
    }
}

/// One grid cell with everything needed to draw it.
#[derive(Debug, Clone)]
pub struct DayCell<'v, 'a> {
    pub index: usize,
    /// `None` for padding cells
    pub day: Option<u32>,
    pub events: &'v [&'a Event],
    pub is_today: bool,
    pub is_selected: bool,
    pub is_hovered: bool,
    pub tooltip_above: bool,
}

/// Hover preview for a day.
#[derive(Debug, Clone)]
pub struct Tooltip<'v, 'a> {
    pub day: u32,
    pub cell_index: usize,
    pub above: bool,
    pub events: &'v [&'a Event],
}

pub struct CalendarView<'a, C: Clock = SystemClock> {
    events: &'a Chronological,
    zones: &'a DisplayZones,
    clock: C,
    state: DisplayState,
    buckets: DayBuckets<'a>,
}

impl<'a, C: Clock> CalendarView<'a, C> {
    /// Open on the current month as seen in `mode`'s zone.
    pub fn new(events: &'a Chronological, zones: &'a DisplayZones, clock: C, mode: TimeZoneMode) -> Self {
        let today = zones.civil_date(clock.now(), mode);
        Self::with_state(events, zones, clock, DisplayState::new(today, mode))
    }

    pub fn with_state(events: &'a Chronological, zones: &'a DisplayZones, clock: C, state: DisplayState) -> Self {
        let mut view = CalendarView {
            events,
            zones,
            clock,
            state,
            buckets: DayBuckets::default(),
        };
        view.rebuild();
        view
    }

    pub fn state(&self) -> DisplayState {
        self.state
    }

    pub fn month(&self) -> YearMonth {
        self.state.month
    }

    pub fn mode(&self) -> TimeZoneMode {
        self.state.mode
    }

    pub fn zones(&self) -> &DisplayZones {
        self.zones
    }

    pub fn selected(&self) -> Option<u32> {
        self.state.selected
    }

    pub fn hovered(&self) -> Option<u32> {
        self.state.hovered
    }

    pub fn buckets(&self) -> &DayBuckets<'a> {
        &self.buckets
    }

    /// Move one month forward or back. The selection belongs to the old month
    /// and is dropped.
    pub fn shift_month(&mut self, step: MonthStep) {
        self.state.month = self.state.month.step(step);
        self.state.selected = None;
        self.rebuild();
    }

    /// Jump straight to `month`, dropping the selection.
    pub fn show_month(&mut self, month: YearMonth) {
        if month == self.state.month {
            return;
        }
        self.state.month = month;
        self.state.selected = None;
        self.rebuild();
    }

    pub fn set_mode(&mut self, mode: TimeZoneMode) {
        if mode == self.state.mode {
            return;
        }
        self.state.mode = mode;
        self.rebuild();
    }

    pub fn set_events(&mut self, events: &'a Chronological) {
        if std::ptr::eq(events, self.events) {
            return;
        }
        self.events = events;
        self.rebuild();
    }

    /// Toggle selection of `day`. Days without events can't be selected.
    /// Returns whether the selection changed.
    pub fn select_day(&mut self, day: u32) -> bool {
        if !self.buckets.has_events(day) {
            return false;
        }
        self.state.selected = if self.state.selected == Some(day) {
            None
        } else {
            Some(day)
        };
        true
    }

    pub fn clear_selection(&mut self) {
        self.state.selected = None;
    }

    pub fn hover_day(&mut self, day: u32) {
        self.state.hovered = Some(day);
    }

    pub fn clear_hover(&mut self) {
        self.state.hovered = None;
    }

    /// Events of the selected day, empty when nothing is selected.
    pub fn selected_events(&self) -> &[&'a Event] {
        match self.state.selected {
            Some(day) => self.buckets.events_on(day),
            None => &[],
        }
    }

    /// Today's civil date in the active zone, read from the clock each call.
    pub fn today(&self) -> NaiveDate {
        self.zones.civil_date(self.clock.now(), self.state.mode)
    }

    pub fn grid(&self) -> MonthGrid {
        MonthGrid::build(self.state.month)
    }

    pub fn cells(&self) -> Vec<DayCell<'_, 'a>> {
        let grid = self.grid();
        let today = self.today();

        grid.cells()
            .iter()
            .enumerate()
            .map(|(index, day)| {
                let events = day.map(|d| self.buckets.events_on(d)).unwrap_or(&[]);
                DayCell {
                    index,
                    day: *day,
                    events,
                    is_today: day.is_some_and(|d| grid.is_today(d, today)),
                    is_selected: day.is_some() && *day == self.state.selected,
                    is_hovered: day.is_some() && *day == self.state.hovered,
                    tooltip_above: grid.tooltip_above(index),
                }
            })
            .collect()
    }

    /// Tooltip for the hovered day. Hidden for empty days and for the day
    /// whose detail panel is already open.
    pub fn tooltip(&self) -> Option<Tooltip<'_, 'a>> {
        let day = self.state.hovered?;
        if self.state.selected == Some(day) {
            return None;
        }
        let events = self.buckets.events_on(day);
        if events.is_empty() {
            return None;
        }
        let grid = self.grid();
        let cell_index = grid.cell_of(day)?;
        Some(Tooltip {
            day,
            cell_index,
            above: grid.tooltip_above(cell_index),
            events,
        })
    }

    fn rebuild(&mut self) {
        let zone = self.zones.zone(self.state.mode);
        self.buckets = bucket_events(self.events, self.state.month, zone);

        // A re-bucketed day may have lost its events
        if let Some(day) = self.state.selected {
            if !self.buckets.has_events(day) {
                self.state.selected = None;
            }
        }
    }
}
