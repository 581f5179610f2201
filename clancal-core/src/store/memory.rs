//! In-process event store, used for tests and offline previews.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;

use super::EventStore;
use crate::error::{ClanCalError, ClanCalResult};
use crate::event::{Chronological, Event, EventPatch, EventStatus, NewEvent, Profile};

#[derive(Default)]
pub struct InMemoryEventStore {
    events: Mutex<Vec<Event>>,
    profiles: Mutex<HashMap<String, Profile>>,
    /// When set, the next write fails with this message
    fail_next: Mutex<Option<String>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_events(events: Vec<Event>) -> Self {
        let store = Self::default();
        *lock(&store.events) = events;
        store
    }

    pub fn add_profile(&self, profile: Profile) {
        lock(&self.profiles).insert(profile.id.clone(), profile);
    }

    /// Make the next write fail with `message`, as a rejected request would.
    pub fn fail_next_write(&self, message: impl Into<String>) {
        *lock(&self.fail_next) = Some(message.into());
    }

    fn take_failure(&self) -> ClanCalResult<()> {
        match lock(&self.fail_next).take() {
            Some(message) => Err(ClanCalError::Backend {
                status: 400,
                message,
            }),
            None => Ok(()),
        }
    }

    /// Fill in author fields the way the store's read view does.
    fn with_author(&self, mut event: Event) -> Event {
        if let Some(profile) = lock(&self.profiles).get(&event.created_by) {
            event.author_username = Some(profile.username.clone());
            event.author_role = Some(profile.role);
        }
        event
    }

    fn modify(&self, id: &str, patch: &EventPatch) -> ClanCalResult<Event> {
        self.take_failure()?;
        let mut events = lock(&self.events);
        let event = events
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| ClanCalError::EventNotFound(id.to_string()))?;
        patch.apply_to(event);
        event.updated_at = Some(Utc::now());
        Ok(event.clone())
    }
}

impl EventStore for InMemoryEventStore {
    async fn list(&self) -> ClanCalResult<Chronological> {
        let events: Vec<Event> = lock(&self.events).clone();
        let events = events.into_iter().map(|e| self.with_author(e)).collect();
        Ok(Chronological::sorted(events))
    }

    async fn get(&self, id: &str) -> ClanCalResult<Option<Event>> {
        let found = lock(&self.events).iter().find(|e| e.id == id).cloned();
        Ok(found.map(|e| self.with_author(e)))
    }

    async fn create(&self, owner: &str, fields: &NewEvent) -> ClanCalResult<Event> {
        self.take_failure()?;
        let event = fields
            .clone()
            .into_event(uuid::Uuid::new_v4().to_string(), owner, Utc::now());
        lock(&self.events).push(event.clone());
        Ok(event)
    }

    async fn update(&self, id: &str, patch: &EventPatch) -> ClanCalResult<Event> {
        self.modify(id, patch)
    }

    async fn update_status(&self, id: &str, status: EventStatus) -> ClanCalResult<Event> {
        let patch = EventPatch {
            status: Some(status),
            ..Default::default()
        };
        self.modify(id, &patch)
    }

    async fn delete(&self, id: &str) -> ClanCalResult<()> {
        self.take_failure()?;
        let mut events = lock(&self.events);
        let before = events.len();
        events.retain(|e| e.id != id);
        if events.len() == before {
            return Err(ClanCalError::EventNotFound(id.to_string()));
        }
        Ok(())
    }

    async fn profile(&self, user_id: &str) -> ClanCalResult<Option<Profile>> {
        Ok(lock(&self.profiles).get(user_id).cloned())
    }

    async fn rename_profile(&self, user_id: &str, username: &str) -> ClanCalResult<()> {
        self.take_failure()?;
        let mut profiles = lock(&self.profiles);
        let profile = profiles
            .get_mut(user_id)
            .ok_or_else(|| ClanCalError::Backend {
                status: 404,
                message: "Profile not found".into(),
            })?;
        profile.username = username.to_string();
        Ok(())
    }
}
