//! Event filtering and the upcoming/past split used by the card list.

use chrono::{DateTime, Utc};

use crate::constants::upcoming_grace;
use crate::event::{Chronological, Event, EventCategory, EventStatus};

/// Toolbar filters. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventFilter {
    pub category: Option<EventCategory>,
    pub status: Option<EventStatus>,
    /// Case-insensitive substring of the title
    pub search: Option<String>,
}

impl EventFilter {
    pub fn matches(&self, event: &Event) -> bool {
        if self.category.is_some_and(|c| c != event.category) {
            return false;
        }
        if self.status.is_some_and(|s| s != event.status) {
            return false;
        }
        match self.search.as_deref().map(str::trim) {
            Some(needle) if !needle.is_empty() => event
                .title
                .to_lowercase()
                .contains(&needle.to_lowercase()),
            _ => true,
        }
    }

    pub fn apply(&self, events: &Chronological) -> Chronological {
        events.retain(|e| self.matches(e))
    }
}

/// Events split for the card list.
#[derive(Debug, Default)]
pub struct RecencyGroups<'a> {
    pub upcoming: Vec<&'a Event>,
    pub past: Vec<&'a Event>,
}

/// Split events into upcoming and past.
///
/// An event stays upcoming until an hour after it starts, unless it is
/// already marked Completed.
pub fn group_by_recency(events: &Chronological, now: DateTime<Utc>) -> RecencyGroups<'_> {
    let cutoff = now - upcoming_grace();
    let (upcoming, past) = events
        .iter()
        .partition(|e| e.status != EventStatus::Completed && e.start_time >= cutoff);
    RecencyGroups { upcoming, past }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::tests::make_event;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 20, 18, 0, 0).unwrap()
    }

    #[test]
    fn search_is_case_insensitive() {
        let event = make_event("1", "Blood Moon Rite", now());
        let filter = EventFilter {
            search: Some("moon".into()),
            ..Default::default()
        };
        assert!(filter.matches(&event));

        let filter = EventFilter {
            search: Some("sun".into()),
            ..Default::default()
        };
        assert!(!filter.matches(&event));

        let blank = EventFilter {
            search: Some("  ".into()),
            ..Default::default()
        };
        assert!(blank.matches(&event));
    }

    #[test]
    fn category_and_status_must_all_match() {
        let mut event = make_event("1", "Sparring", now());
        event.category = EventCategory::Combat;
        event.status = EventStatus::Delayed;

        let filter = EventFilter {
            category: Some(EventCategory::Combat),
            status: Some(EventStatus::Delayed),
            search: None,
        };
        assert!(filter.matches(&event));

        let filter = EventFilter {
            category: Some(EventCategory::Combat),
            status: Some(EventStatus::Scheduled),
            search: None,
        };
        assert!(!filter.matches(&event));
    }

    #[test]
    fn apply_keeps_order() {
        let events = Chronological::sorted(vec![
            make_event("a", "Lesson one", now()),
            make_event("b", "Duel", now() + Duration::hours(1)),
            make_event("c", "Lesson two", now() + Duration::hours(2)),
        ]);
        let filter = EventFilter {
            search: Some("lesson".into()),
            ..Default::default()
        };
        let ids: Vec<_> = filter.apply(&events).iter().map(|e| e.id.clone()).collect();
        assert_eq!(ids, ["a", "c"]);
    }

    #[test]
    fn grace_window_keeps_recent_events_upcoming() {
        let mut done = make_event("done", "Done", now() + Duration::days(1));
        done.status = EventStatus::Completed;

        let events = Chronological::sorted(vec![
            make_event("old", "Old", now() - Duration::minutes(61)),
            make_event("recent", "Recent", now() - Duration::minutes(59)),
            make_event("edge", "Edge", now() - Duration::hours(1)),
            make_event("future", "Future", now() + Duration::hours(5)),
            done,
        ]);

        let groups = group_by_recency(&events, now());
        let upcoming: Vec<_> = groups.upcoming.iter().map(|e| e.id.as_str()).collect();
        let past: Vec<_> = groups.past.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(upcoming, ["edge", "recent", "future"]);
        assert_eq!(past, ["old", "done"]);
    }
}
