//! The event store: the hosted backend that owns events and profiles.
//!
//! The store enforces its own authorization; callers only see success or an
//! error message.

mod memory;
mod rest;

pub use memory::InMemoryEventStore;
pub use rest::RestEventStore;

use std::future::Future;

use crate::error::ClanCalResult;
use crate::event::{Chronological, Event, EventPatch, EventStatus, NewEvent, Profile};

pub trait EventStore: Send + Sync {
    /// All events with author fields, ascending by start instant.
    fn list(&self) -> impl Future<Output = ClanCalResult<Chronological>> + Send;

    /// One event with author fields.
    fn get(&self, id: &str) -> impl Future<Output = ClanCalResult<Option<Event>>> + Send;

    fn create(&self, owner: &str, fields: &NewEvent) -> impl Future<Output = ClanCalResult<Event>> + Send;

    fn update(&self, id: &str, patch: &EventPatch) -> impl Future<Output = ClanCalResult<Event>> + Send;

    fn update_status(&self, id: &str, status: EventStatus) -> impl Future<Output = ClanCalResult<Event>> + Send;

    fn delete(&self, id: &str) -> impl Future<Output = ClanCalResult<()>> + Send;

    fn profile(&self, user_id: &str) -> impl Future<Output = ClanCalResult<Option<Profile>>> + Send;

    fn rename_profile(&self, user_id: &str, username: &str) -> impl Future<Output = ClanCalResult<()>> + Send;
}
