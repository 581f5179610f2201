//! Discord webhook sink.
//!
//! Each notification becomes one embed: a title per action, a color per
//! category, and the event's title, category, author, reference-zone start
//! time and status as fields.

use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use url::Url;

use super::{Notification, NotificationAction, NotificationSink};
use crate::constants::WEBHOOK_TIMEOUT;
use crate::event::EventCategory;
use crate::timefmt::format_notification_time;
use crate::zone::{DisplayZones, TimeZoneMode};

const WEBHOOK_USERNAME: &str = "Clan Calendar";
pub const DEFAULT_FOOTER: &str = "Progeny Vampire Clan • Second Life";

fn category_color(category: EventCategory) -> u32 {
    match category {
        EventCategory::Education => 0x7b61ff,
        EventCategory::Combat => 0xff3c3c,
        EventCategory::Ceremony => 0xc9a84c,
    }
}

fn action_title(action: NotificationAction) -> &'static str {
    match action {
        NotificationAction::Created => "🩸 New Event Created",
        NotificationAction::StatusChanged => "🔄 Event Status Updated",
        NotificationAction::Updated => "✏️ Event Updated",
        NotificationAction::Deleted => "💀 Event Deleted",
    }
}

#[derive(Debug, Serialize)]
pub struct WebhookPayload {
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    pub embeds: Vec<Embed>,
}

#[derive(Debug, Serialize)]
pub struct Embed {
    pub title: String,
    pub color: u32,
    pub fields: Vec<EmbedField>,
    pub footer: EmbedFooter,
    pub timestamp: String,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

impl EmbedField {
    fn new(name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        EmbedField {
            name: name.into(),
            value: value.into(),
            inline,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct EmbedFooter {
    pub text: String,
}

pub struct DiscordWebhook {
    http: reqwest::Client,
    /// `None` disables delivery
    url: Option<Url>,
    zones: DisplayZones,
    footer: String,
    avatar_url: Option<String>,
}

impl DiscordWebhook {
    pub fn new(url: Option<Url>, zones: DisplayZones) -> Self {
        DiscordWebhook {
            http: crate::http::client(WEBHOOK_TIMEOUT),
            url,
            zones,
            footer: DEFAULT_FOOTER.to_string(),
            avatar_url: None,
        }
    }

    /// Replace the delivery deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.http = crate::http::client(timeout);
        self
    }

    pub fn with_footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = footer.into();
        self
    }

    pub fn with_avatar_url(mut self, avatar_url: Option<String>) -> Self {
        self.avatar_url = avatar_url;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.url.is_some()
    }

    /// The message body for `notification`, stamped with `now`.
    pub fn payload(&self, notification: &Notification, now: DateTime<Utc>) -> WebhookPayload {
        let mut fields = vec![
            EmbedField::new("Event", &notification.event_title, false),
            EmbedField::new("Category", notification.category.as_str(), true),
            EmbedField::new("Created By", &notification.author_username, true),
            EmbedField::new(
                format!("🕐 Time ({})", self.zones.label(TimeZoneMode::Reference)),
                format_notification_time(&notification.start_time, &self.zones),
                false,
            ),
        ];

        match (notification.action, notification.new_status) {
            (NotificationAction::StatusChanged, Some(new_status)) => {
                let previous = notification
                    .current_status
                    .map(|s| format!("~~{s}~~ → "))
                    .unwrap_or_default();
                fields.push(EmbedField::new(
                    "Status",
                    format!("{previous}**{new_status}**"),
                    false,
                ));
            }
            _ => {
                if let Some(status) = notification.current_status {
                    fields.push(EmbedField::new("Status", status.as_str(), true));
                }
            }
        }

        WebhookPayload {
            username: WEBHOOK_USERNAME.to_string(),
            avatar_url: self.avatar_url.clone(),
            embeds: vec![Embed {
                title: action_title(notification.action).to_string(),
                color: category_color(notification.category),
                fields,
                footer: EmbedFooter {
                    text: self.footer.clone(),
                },
                timestamp: now.to_rfc3339_opts(SecondsFormat::Millis, true),
            }],
        }
    }
}

impl NotificationSink for DiscordWebhook {
    async fn send(&self, notification: &Notification) {
        let Some(url) = &self.url else {
            tracing::warn!("webhook URL is not set, skipping notification");
            return;
        };

        let payload = self.payload(notification, Utc::now());
        match self.http.post(url.clone()).json(&payload).send().await {
            Ok(resp) if resp.status().is_success() => {
                tracing::debug!(action = ?notification.action, "notification delivered");
            }
            Ok(resp) => {
                let status = resp.status();
                tracing::error!(
                    status = status.as_u16(),
                    reason = status.canonical_reason().unwrap_or(""),
                    "webhook rejected notification"
                );
            }
            Err(e) if e.is_timeout() => {
                tracing::error!(error = %e, "webhook did not answer in time");
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to send notification");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventStatus;
    use chrono::TimeZone;

    fn webhook() -> DiscordWebhook {
        DiscordWebhook::new(
            None,
            DisplayZones::new(chrono_tz::America::Los_Angeles, "SLT", None),
        )
    }

    fn notification(action: NotificationAction) -> Notification {
        Notification {
            event_title: "Blood Moon Rite".into(),
            category: EventCategory::Combat,
            action,
            new_status: None,
            current_status: None,
            author_username: "Renaissance".into(),
            start_time: "2024-03-15T03:00:00Z".into(),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn created_payload_shape() {
        let payload = webhook().payload(&notification(NotificationAction::Created), now());
        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(json["username"], "Clan Calendar");
        assert!(json.get("avatar_url").is_none());
        let embed = &json["embeds"][0];
        assert_eq!(embed["title"], "🩸 New Event Created");
        assert_eq!(embed["color"], 0xff3c3c);
        assert_eq!(embed["timestamp"], "2024-03-01T12:00:00.000Z");
        assert_eq!(embed["footer"]["text"], DEFAULT_FOOTER);

        let fields = &payload.embeds[0].fields;
        assert_eq!(fields.len(), 4);
        assert_eq!(fields[0], EmbedField::new("Event", "Blood Moon Rite", false));
        assert_eq!(fields[2], EmbedField::new("Created By", "Renaissance", true));
        assert_eq!(
            fields[3],
            EmbedField::new("🕐 Time (SLT)", "Thu, Mar 14, 2024, 8:00 PM SLT", false)
        );
    }

    #[test]
    fn status_change_strikes_through_previous() {
        let mut n = notification(NotificationAction::StatusChanged);
        n.new_status = Some(EventStatus::Delayed);
        n.current_status = Some(EventStatus::Scheduled);

        let payload = webhook().payload(&n, now());
        let status = payload.embeds[0].fields.last().unwrap();
        assert_eq!(
            *status,
            EmbedField::new("Status", "~~Scheduled~~ → **Delayed**", false)
        );
    }

    #[test]
    fn status_change_without_previous() {
        let mut n = notification(NotificationAction::StatusChanged);
        n.new_status = Some(EventStatus::Completed);

        let payload = webhook().payload(&n, now());
        let status = payload.embeds[0].fields.last().unwrap();
        assert_eq!(status.value, "**Completed**");
    }

    #[test]
    fn other_actions_show_current_status_inline() {
        let n = notification(NotificationAction::Deleted).with_current_status(EventStatus::ToDo);
        let payload = webhook().payload(&n, now());
        assert_eq!(payload.embeds[0].title, "💀 Event Deleted");
        assert_eq!(
            *payload.embeds[0].fields.last().unwrap(),
            EmbedField::new("Status", "To-Do", true)
        );
    }

    #[test]
    fn malformed_start_time_is_passed_through() {
        let mut n = notification(NotificationAction::Updated);
        n.start_time = "sometime soon".into();
        let payload = webhook().payload(&n, now());
        assert_eq!(payload.embeds[0].fields[3].value, "sometime soon");
    }

    #[tokio::test]
    async fn disabled_webhook_skips_quietly() {
        let hook = webhook();
        assert!(!hook.is_enabled());
        hook.send(&notification(NotificationAction::Created)).await;
    }

    #[tokio::test]
    async fn unreachable_webhook_does_not_fail() {
        let hook = DiscordWebhook::new(
            Some(Url::parse("http://127.0.0.1:9/webhook").unwrap()),
            DisplayZones::new(chrono_tz::America::Los_Angeles, "SLT", None),
        );
        hook.send(&notification(NotificationAction::Created)).await;
    }

    #[tokio::test]
    async fn silent_webhook_times_out() {
        // Accepts the connection but never answers
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let url = Url::parse(&format!("http://{}/webhook", listener.local_addr().unwrap())).unwrap();

        let hook = DiscordWebhook::new(
            Some(url),
            DisplayZones::new(chrono_tz::America::Los_Angeles, "SLT", None),
        )
        .with_timeout(Duration::from_millis(200));

        let delivery = tokio::time::timeout(
            Duration::from_secs(5),
            hook.send(&notification(NotificationAction::Created)),
        )
        .await;
        assert!(delivery.is_ok());
        drop(listener);
    }
}
