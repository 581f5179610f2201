//! Event model shared by the store, the calendar grid and the notifier.
//!
//! Events are owned by the hosted store; everything in this crate only reads
//! them. The wire format is the store's JSON row shape (snake_case fields,
//! RFC 3339 instants, enum values spelled the way the community spells them).

use std::fmt;
use std::ops::Deref;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ClanCalError, ClanCalResult};

/// What kind of gathering an event is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventCategory {
    Education,
    Combat,
    Ceremony,
}

impl EventCategory {
    pub const ALL: [EventCategory; 3] = [
        EventCategory::Education,
        EventCategory::Combat,
        EventCategory::Ceremony,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventCategory::Education => "Education",
            EventCategory::Combat => "Combat",
            EventCategory::Ceremony => "Ceremony",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            EventCategory::Education => "📖",
            EventCategory::Combat => "⚔️",
            EventCategory::Ceremony => "🕯️",
        }
    }
}

/// Lifecycle status of an event. Mutable independently of the other fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventStatus {
    #[serde(rename = "To-Do")]
    ToDo,
    Scheduled,
    Delayed,
    Completed,
}

impl EventStatus {
    pub const ALL: [EventStatus; 4] = [
        EventStatus::ToDo,
        EventStatus::Scheduled,
        EventStatus::Delayed,
        EventStatus::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::ToDo => "To-Do",
            EventStatus::Scheduled => "Scheduled",
            EventStatus::Delayed => "Delayed",
            EventStatus::Completed => "Completed",
        }
    }
}

/// A member's standing within the community.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Sovereign,
    Priest,
    Trainer,
    Member,
    #[serde(rename = "Queens Hand")]
    QueensHand,
    Liaison,
}

impl Role {
    pub const ALL: [Role; 6] = [
        Role::Sovereign,
        Role::Priest,
        Role::Trainer,
        Role::Member,
        Role::QueensHand,
        Role::Liaison,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Sovereign => "Sovereign",
            Role::Priest => "Priest",
            Role::Trainer => "Trainer",
            Role::Member => "Member",
            Role::QueensHand => "Queens Hand",
            Role::Liaison => "Liaison",
        }
    }
}

macro_rules! display_and_parse {
    ($ty:ident, $what:literal) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = ClanCalError;

            /// Case-insensitive; spaces, dashes and underscores are ignored.
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = normalize(s);
                $ty::ALL
                    .into_iter()
                    .find(|v| normalize(v.as_str()) == wanted)
                    .ok_or_else(|| {
                        let allowed: Vec<_> = $ty::ALL.iter().map(|v| v.as_str()).collect();
                        ClanCalError::Validation(format!(
                            "Unknown {} '{}'. Expected one of: {}",
                            $what,
                            s,
                            allowed.join(", ")
                        ))
                    })
            }
        }
    };
}

fn normalize(s: &str) -> String {
    s.chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_'))
        .flat_map(char::to_lowercase)
        .collect()
}

display_and_parse!(EventCategory, "category");
display_and_parse!(EventStatus, "status");
display_and_parse!(Role, "role");

/// A calendar event as read from the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    /// Owner (user id) of the event
    pub created_by: String,
    pub title: String,
    pub description: Option<String>,
    /// Teleport link or other location string
    pub location: Option<String>,
    /// Absolute start instant
    pub start_time: DateTime<Utc>,
    pub category: EventCategory,
    pub status: EventStatus,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,

    // Denormalized author fields, only present on read paths
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_role: Option<Role>,
}

impl Event {
    /// The start instant in its wire format.
    pub fn start_rfc3339(&self) -> String {
        self.start_time.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
    }

    /// Only the creator edits an event.
    pub fn can_edit(&self, profile: &Profile) -> bool {
        self.created_by == profile.id
    }

    /// Status changes are open to the creator and to admins.
    pub fn can_change_status(&self, profile: &Profile) -> bool {
        self.created_by == profile.id || profile.is_admin
    }

    pub fn can_delete(&self, profile: &Profile) -> bool {
        self.created_by == profile.id || profile.is_admin
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.category.icon(), self.title)
    }
}

/// A member profile, keyed by the identity provider's user id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub username: String,
    pub role: Role,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Fields for a new event. The owner is filled in by the action layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEvent {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub start_time: DateTime<Utc>,
    pub category: EventCategory,
    pub status: EventStatus,
}

impl NewEvent {
    pub fn new(title: impl Into<String>, start_time: DateTime<Utc>) -> Self {
        NewEvent {
            title: title.into(),
            description: None,
            location: None,
            start_time,
            category: EventCategory::Ceremony,
            status: EventStatus::Scheduled,
        }
    }

    pub fn validate(&self) -> ClanCalResult<()> {
        if self.title.trim().is_empty() {
            return Err(ClanCalError::Validation(
                "Title and start time are required.".into(),
            ));
        }
        Ok(())
    }

    /// Build the stored row for `owner`, as an in-memory store would.
    pub fn into_event(self, id: String, owner: &str, now: DateTime<Utc>) -> Event {
        Event {
            id,
            created_by: owner.to_string(),
            title: self.title,
            description: self.description,
            location: self.location,
            start_time: self.start_time,
            category: self.category,
            status: self.status,
            created_at: Some(now),
            updated_at: Some(now),
            author_username: None,
            author_role: None,
        }
    }
}

/// A partial update. Unset fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// An empty string clears the field.
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "clearable")]
    pub description: Option<String>,
    /// An empty string clears the field.
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "clearable")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<EventCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<EventStatus>,
}

/// Blank text goes over the wire as `null` so the column is cleared.
fn clearable<S: serde::Serializer>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error> {
    match value.as_deref() {
        Some(text) if !text.is_empty() => serializer.serialize_str(text),
        _ => serializer.serialize_none(),
    }
}

impl EventPatch {
    pub fn is_empty(&self) -> bool {
        *self == EventPatch::default()
    }

    pub fn validate(&self) -> ClanCalResult<()> {
        if self.is_empty() {
            return Err(ClanCalError::Validation("Nothing to update.".into()));
        }
        if self.title.as_ref().is_some_and(|t| t.trim().is_empty()) {
            return Err(ClanCalError::Validation(
                "Title and start time are required.".into(),
            ));
        }
        Ok(())
    }

    pub fn apply_to(&self, event: &mut Event) {
        if let Some(title) = &self.title {
            event.title = title.clone();
        }
        if let Some(description) = &self.description {
            event.description = Some(description.clone()).filter(|d| !d.is_empty());
        }
        if let Some(location) = &self.location {
            event.location = Some(location.clone()).filter(|l| !l.is_empty());
        }
        if let Some(start) = self.start_time {
            event.start_time = start;
        }
        if let Some(category) = self.category {
            event.category = category;
        }
        if let Some(status) = self.status {
            event.status = status;
        }
    }
}

/// Events in ascending start-time order.
///
/// Day buckets and card lists keep the order they are handed, so that order
/// is carried by this type instead of being re-derived downstream. Build one
/// with [`Chronological::from_ordered`] when the source already promises the
/// order (the store's list endpoint does), or with [`Chronological::sorted`]
/// when it doesn't.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Chronological(Vec<Event>);

impl Chronological {
    /// Sort once by start instant. Ties keep their input order.
    pub fn sorted(mut events: Vec<Event>) -> Self {
        events.sort_by_key(|e| e.start_time);
        Chronological(events)
    }

    /// Accept events that are already in order, rejecting any that are not.
    pub fn from_ordered(events: Vec<Event>) -> ClanCalResult<Self> {
        if let Some(pos) = events
            .windows(2)
            .position(|pair| pair[0].start_time > pair[1].start_time)
        {
            return Err(ClanCalError::Unordered(pos + 1));
        }
        Ok(Chronological(events))
    }

    /// Keep only the events matching `keep`. Order is preserved.
    pub fn retain(&self, mut keep: impl FnMut(&Event) -> bool) -> Self {
        Chronological(self.0.iter().filter(|e| keep(e)).cloned().collect())
    }

    pub fn into_inner(self) -> Vec<Event> {
        self.0
    }
}

impl Deref for Chronological {
    type Target = [Event];

    fn deref(&self) -> &[Event] {
        &self.0
    }
}

impl<'a> IntoIterator for &'a Chronological {
    type Item = &'a Event;
    type IntoIter = std::slice::Iter<'a, Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::TimeZone;

    pub(crate) fn make_event(id: &str, title: &str, start: DateTime<Utc>) -> Event {
        Event {
            id: id.to_string(),
            created_by: "owner-1".to_string(),
            title: title.to_string(),
            description: None,
            location: None,
            start_time: start,
            category: EventCategory::Ceremony,
            status: EventStatus::Scheduled,
            created_at: None,
            updated_at: None,
            author_username: Some("Renaissance".to_string()),
            author_role: Some(Role::Sovereign),
        }
    }

    fn profile(id: &str, is_admin: bool) -> Profile {
        Profile {
            id: id.to_string(),
            username: "someone".to_string(),
            role: Role::Member,
            is_admin,
            created_at: None,
        }
    }

    #[test]
    fn deserializes_store_row() {
        let json = r#"{
            "id": "7f1c",
            "created_by": "u1",
            "title": "Blood Moon Rite",
            "description": null,
            "location": "secondlife://Region/1/2/3",
            "start_time": "2024-03-15T03:00:00+00:00",
            "category": "Ceremony",
            "status": "To-Do",
            "created_at": "2024-03-01T10:00:00.123456+00:00",
            "updated_at": "2024-03-01T10:00:00.123456+00:00",
            "author_username": "Renaissance",
            "author_role": "Queens Hand"
        }"#;

        let event: Event = serde_json::from_str(json).unwrap();
        assert_eq!(event.status, EventStatus::ToDo);
        assert_eq!(event.author_role, Some(Role::QueensHand));
        assert_eq!(
            event.start_time,
            Utc.with_ymd_and_hms(2024, 3, 15, 3, 0, 0).unwrap()
        );
        assert_eq!(event.start_rfc3339(), "2024-03-15T03:00:00Z");
    }

    #[test]
    fn rejects_unknown_category() {
        let json = r#"{
            "id": "1", "created_by": "u1", "title": "x", "description": null,
            "location": null, "start_time": "2024-03-15T03:00:00Z",
            "category": "Dancing", "status": "Scheduled"
        }"#;
        assert!(serde_json::from_str::<Event>(json).is_err());
    }

    #[test]
    fn parses_enums_loosely() {
        assert_eq!("to-do".parse::<EventStatus>().unwrap(), EventStatus::ToDo);
        assert_eq!("todo".parse::<EventStatus>().unwrap(), EventStatus::ToDo);
        assert_eq!("COMBAT".parse::<EventCategory>().unwrap(), EventCategory::Combat);
        assert_eq!("queens_hand".parse::<Role>().unwrap(), Role::QueensHand);
        assert!("later".parse::<EventStatus>().is_err());
    }

    #[test]
    fn permissions_follow_ownership() {
        let event = make_event("1", "Sparring", Utc::now());
        assert!(event.can_edit(&profile("owner-1", false)));
        assert!(!event.can_edit(&profile("other", true)));
        assert!(event.can_change_status(&profile("other", true)));
        assert!(!event.can_change_status(&profile("other", false)));
        assert!(event.can_delete(&profile("other", true)));
        assert!(!event.can_delete(&profile("other", false)));
    }

    #[test]
    fn new_event_requires_title() {
        let fields = NewEvent::new("  ", Utc::now());
        assert!(fields.validate().is_err());
        assert!(NewEvent::new("Lecture", Utc::now()).validate().is_ok());
    }

    #[test]
    fn patch_serializes_only_set_fields() {
        let patch = EventPatch {
            status: Some(EventStatus::Delayed),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&patch).unwrap(),
            serde_json::json!({ "status": "Delayed" })
        );
        assert!(EventPatch::default().validate().is_err());
    }

    #[test]
    fn clearing_patch_sends_null() {
        let patch = EventPatch {
            location: Some(String::new()),
            description: Some("Bring a blade.".into()),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&patch).unwrap(),
            serde_json::json!({ "location": null, "description": "Bring a blade." })
        );
    }

    #[test]
    fn patch_applies_and_clears_optional_text() {
        let mut event = make_event("1", "Old", Utc::now());
        event.location = Some("somewhere".into());
        let patch = EventPatch {
            title: Some("New".into()),
            location: Some(String::new()),
            ..Default::default()
        };
        patch.apply_to(&mut event);
        assert_eq!(event.title, "New");
        assert_eq!(event.location, None);
    }

    #[test]
    fn from_ordered_rejects_out_of_order_input() {
        let early = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let late = Utc.with_ymd_and_hms(2024, 3, 2, 0, 0, 0).unwrap();

        let ok = Chronological::from_ordered(vec![
            make_event("a", "A", early),
            make_event("b", "B", early),
            make_event("c", "C", late),
        ]);
        assert_eq!(ok.unwrap().len(), 3);

        let err = Chronological::from_ordered(vec![
            make_event("c", "C", late),
            make_event("a", "A", early),
        ]);
        assert!(matches!(err, Err(ClanCalError::Unordered(1))));
    }

    #[test]
    fn sorted_is_stable_for_equal_starts() {
        let t = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let events = Chronological::sorted(vec![
            make_event("late", "Late", t + chrono::Duration::hours(1)),
            make_event("first", "First", t),
            make_event("second", "Second", t),
        ]);
        let ids: Vec<_> = events.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["first", "second", "late"]);
    }
}
