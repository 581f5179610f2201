//! Event lifecycle notifications.
//!
//! Delivery is best-effort. A sink never reports failure to its caller, so a
//! broken webhook can't undo or block the change that triggered it.

mod discord;

pub use discord::{DEFAULT_FOOTER, DiscordWebhook, WebhookPayload};

use std::future::Future;
use std::sync::Mutex;

use serde::Serialize;

use crate::constants::UNKNOWN_AUTHOR;
use crate::event::{Event, EventCategory, EventStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationAction {
    Created,
    StatusChanged,
    Updated,
    Deleted,
}

/// What happened to which event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub event_title: String,
    pub category: EventCategory,
    pub action: NotificationAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_status: Option<EventStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_status: Option<EventStatus>,
    pub author_username: String,
    /// Raw start instant, formatted by the sink
    pub start_time: String,
}

impl Notification {
    pub fn new(event: &Event, action: NotificationAction, author: Option<&str>) -> Self {
        Notification {
            event_title: event.title.clone(),
            category: event.category,
            action,
            new_status: None,
            current_status: None,
            author_username: author.unwrap_or(UNKNOWN_AUTHOR).to_string(),
            start_time: event.start_rfc3339(),
        }
    }

    /// A status change from `previous` to `new_status`.
    pub fn status_changed(event: &Event, previous: EventStatus, new_status: EventStatus) -> Self {
        Notification {
            new_status: Some(new_status),
            current_status: Some(previous),
            ..Self::new(
                event,
                NotificationAction::StatusChanged,
                event.author_username.as_deref(),
            )
        }
    }

    pub fn with_current_status(mut self, status: EventStatus) -> Self {
        self.current_status = Some(status);
        self
    }
}

pub trait NotificationSink: Send + Sync {
    /// Deliver `notification`. Failures are logged, never returned.
    fn send(&self, notification: &Notification) -> impl Future<Output = ()> + Send;
}

/// Sink that drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl NotificationSink for NoopSink {
    async fn send(&self, _notification: &Notification) {}
}

/// Sink that keeps every notification in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingSink {
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }
}

impl NotificationSink for RecordingSink {
    async fn send(&self, notification: &Notification) {
        self.sent
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(notification.clone());
    }
}
