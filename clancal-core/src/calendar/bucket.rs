//! Grouping events by day of the viewed month.

use std::collections::BTreeMap;

use chrono::Datelike;
use chrono_tz::Tz;

use super::month::YearMonth;
use crate::event::{Chronological, Event};

/// Events of one month keyed by day number, in input order within each day.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DayBuckets<'a> {
    days: BTreeMap<u32, Vec<&'a Event>>,
}

impl<'a> DayBuckets<'a> {
    pub fn events_on(&self, day: u32) -> &[&'a Event] {
        self.days.get(&day).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_events(&self, day: u32) -> bool {
        self.days.contains_key(&day)
    }

    /// Days that hold at least one event, ascending.
    pub fn days(&self) -> impl Iterator<Item = u32> + '_ {
        self.days.keys().copied()
    }

    pub fn event_count(&self) -> usize {
        self.days.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}

/// Bucket `events` by their civil day in `zone`, keeping only those whose
/// civil year and month equal `month`.
pub fn bucket_events<'a>(events: &'a Chronological, month: YearMonth, zone: Tz) -> DayBuckets<'a> {
    let mut days: BTreeMap<u32, Vec<&'a Event>> = BTreeMap::new();

    for event in events {
        let date = event.start_time.with_timezone(&zone).date_naive();
        if month.contains(date) {
            days.entry(date.day()).or_default().push(event);
        }
    }

    DayBuckets { days }
}
