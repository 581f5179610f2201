//! The CRUD layer the front ends call.
//!
//! Each operation checks for a signed-in user, talks to the event store and
//! then tells the notification sink what happened. Failures come back as a
//! short message fit to show inline next to the control that caused them.

use thiserror::Error;

use crate::constants::MIN_PASSWORD_LEN;
use crate::error::ClanCalError;
use crate::event::{Chronological, Event, EventPatch, EventStatus, NewEvent, Profile};
use crate::identity::{IdentityProvider, Session, User};
use crate::notify::{Notification, NotificationAction, NotificationSink};
use crate::store::EventStore;

/// A displayable failure message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct ActionError(pub String);

impl ActionError {
    fn new(message: impl Into<String>) -> Self {
        ActionError(message.into())
    }
}

impl From<ClanCalError> for ActionError {
    fn from(err: ClanCalError) -> Self {
        ActionError(err.to_string())
    }
}

pub type ActionResult<T> = Result<T, ActionError>;

pub struct Actions<S, I, N> {
    store: S,
    identity: I,
    sink: N,
}

impl<S, I, N> Actions<S, I, N>
where
    S: EventStore,
    I: IdentityProvider,
    N: NotificationSink,
{
    pub fn new(store: S, identity: I, sink: N) -> Self {
        Actions {
            store,
            identity,
            sink,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn identity(&self) -> &I {
        &self.identity
    }

    pub fn sink(&self) -> &N {
        &self.sink
    }

    async fn require_user(&self) -> ActionResult<User> {
        self.identity
            .current_user()
            .await?
            .ok_or_else(|| ClanCalError::NotAuthenticated.into())
    }

    /// Username for notifications; `None` falls back to "Unknown".
    async fn username_of(&self, user_id: &str) -> Option<String> {
        match self.store.profile(user_id).await {
            Ok(profile) => profile.map(|p| p.username),
            Err(e) => {
                tracing::warn!(user = %user_id, error = %e, "could not load author profile");
                None
            }
        }
    }

    /// Events with author fields, ascending by start.
    pub async fn list(&self) -> ActionResult<Chronological> {
        Ok(self.store.list().await?)
    }

    pub async fn current_user(&self) -> ActionResult<Option<User>> {
        Ok(self.identity.current_user().await?)
    }

    /// Profile of the signed-in user, `None` when signed out.
    pub async fn current_profile(&self) -> ActionResult<Option<Profile>> {
        let Some(user) = self.identity.current_user().await? else {
            return Ok(None);
        };
        Ok(self.store.profile(&user.id).await?)
    }

    pub async fn create(&self, fields: NewEvent) -> ActionResult<Event> {
        let user = self.require_user().await?;
        fields.validate()?;

        let event = self.store.create(&user.id, &fields).await?;
        tracing::info!(event = %event.id, "event created");

        let author = self.username_of(&user.id).await;
        self.sink
            .send(&Notification::new(
                &event,
                NotificationAction::Created,
                author.as_deref(),
            ))
            .await;

        Ok(event)
    }

    pub async fn update_status(&self, id: &str, status: EventStatus) -> ActionResult<Event> {
        self.require_user().await?;
        let existing = self.existing(id).await;

        let updated = self.store.update_status(id, status).await?;
        tracing::info!(event = %id, to = %status, "status changed");

        if let Some(existing) = existing {
            let mut notification = Notification::status_changed(&existing, existing.status, status);
            notification.event_title = updated.title.clone();
            self.sink.send(&notification).await;
        }

        Ok(updated)
    }

    pub async fn update(&self, id: &str, patch: EventPatch) -> ActionResult<Event> {
        self.require_user().await?;
        patch.validate()?;
        let existing = self.existing(id).await;

        let mut updated = self.store.update(id, &patch).await?;
        tracing::info!(event = %id, "event updated");

        if updated.author_username.is_none()
            && let Some(existing) = existing
        {
            updated.author_username = existing.author_username;
            updated.author_role = existing.author_role;
        }
        self.sink
            .send(
                &Notification::new(
                    &updated,
                    NotificationAction::Updated,
                    updated.author_username.as_deref(),
                )
                .with_current_status(updated.status),
            )
            .await;

        Ok(updated)
    }

    pub async fn delete(&self, id: &str) -> ActionResult<()> {
        self.require_user().await?;
        let existing = self.existing(id).await;

        self.store.delete(id).await?;
        tracing::info!(event = %id, "event deleted");

        if let Some(existing) = existing {
            self.sink
                .send(
                    &Notification::new(
                        &existing,
                        NotificationAction::Deleted,
                        existing.author_username.as_deref(),
                    )
                    .with_current_status(existing.status),
                )
                .await;
        }

        Ok(())
    }

    /// The event as it was before a write, for the notification only. A failed
    /// read never stops the write itself.
    async fn existing(&self, id: &str) -> Option<Event> {
        match self.store.get(id).await {
            Ok(Some(event)) => Some(event),
            Ok(None) => {
                tracing::warn!(event = %id, "event not found before write; skipping notification");
                None
            }
            Err(e) => {
                tracing::warn!(event = %id, error = %e, "could not read event before write; skipping notification");
                None
            }
        }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> ActionResult<Session> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(ActionError::new("Email and password are required."));
        }
        Ok(self.identity.sign_in(email.trim(), password).await?)
    }

    pub async fn sign_out(&self) -> ActionResult<()> {
        Ok(self.identity.sign_out().await?)
    }

    /// Change the signed-in user's display name. Returns the trimmed name.
    pub async fn rename(&self, username: &str) -> ActionResult<String> {
        let user = self.require_user().await?;
        let username = username.trim();
        if username.is_empty() {
            return Err(ActionError::new("Username cannot be empty."));
        }
        self.store.rename_profile(&user.id, username).await?;
        Ok(username.to_string())
    }

    /// Change the password. When `current` is given it is re-verified first.
    pub async fn change_password(
        &self,
        current: Option<&str>,
        new_password: &str,
        confirm: &str,
    ) -> ActionResult<()> {
        let user = self.require_user().await?;

        if new_password.is_empty() {
            return Err(ActionError::new("Enter a new password."));
        }
        if new_password != confirm {
            return Err(ActionError::new("Passwords do not match."));
        }
        if new_password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ActionError::new(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters."
            )));
        }

        if let Some(current) = current
            && let Some(email) = user.email.as_deref()
            && self.identity.sign_in(email, current).await.is_err()
        {
            return Err(ActionError::new("Current password is incorrect."));
        }

        self.identity.update_password(new_password).await?;
        tracing::info!(user = %user.id, "password changed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::tests::make_event;
    use crate::error::ClanCalResult;
    use crate::event::{EventCategory, Role};
    use crate::identity::InMemoryIdentity;
    use crate::notify::RecordingSink;
    use crate::store::InMemoryEventStore;
    use chrono::{TimeZone, Utc};

    type TestActions = Actions<InMemoryEventStore, InMemoryIdentity, RecordingSink>;

    fn queen() -> User {
        User {
            id: "owner-1".into(),
            email: Some("queen@example.com".into()),
        }
    }

    fn profile() -> Profile {
        Profile {
            id: "owner-1".into(),
            username: "Renaissance".into(),
            role: Role::Sovereign,
            is_admin: true,
            created_at: None,
        }
    }

    fn seeded(events: Vec<Event>) -> TestActions {
        let store = InMemoryEventStore::with_events(events);
        store.add_profile(profile());
        Actions::new(
            store,
            InMemoryIdentity::signed_in_as(queen(), "hunter22"),
            RecordingSink::default(),
        )
    }

    fn signed_out() -> TestActions {
        let identity = InMemoryIdentity::new();
        identity.add_account(queen(), "hunter22");
        Actions::new(
            InMemoryEventStore::new(),
            identity,
            RecordingSink::default(),
        )
    }

    fn rite() -> Event {
        make_event(
            "e1",
            "Blood Moon Rite",
            Utc.with_ymd_and_hms(2024, 3, 15, 3, 0, 0).unwrap(),
        )
    }

    #[tokio::test]
    async fn create_notifies_with_author() {
        let actions = seeded(vec![]);
        let mut fields = NewEvent::new(
            "Sparring Night",
            Utc.with_ymd_and_hms(2024, 3, 20, 2, 0, 0).unwrap(),
        );
        fields.category = EventCategory::Combat;

        let event = actions.create(fields).await.unwrap();
        assert_eq!(event.created_by, "owner-1");

        let sent = actions.sink().sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].action, NotificationAction::Created);
        assert_eq!(sent[0].author_username, "Renaissance");
        assert_eq!(sent[0].category, EventCategory::Combat);
        assert_eq!(sent[0].start_time, "2024-03-20T02:00:00Z");
        assert_eq!(actions.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn create_without_profile_uses_unknown_author() {
        let actions = Actions::new(
            InMemoryEventStore::new(),
            InMemoryIdentity::signed_in_as(queen(), "hunter22"),
            RecordingSink::default(),
        );
        actions
            .create(NewEvent::new("Lecture", Utc::now()))
            .await
            .unwrap();
        assert_eq!(actions.sink().sent()[0].author_username, "Unknown");
    }

    #[tokio::test]
    async fn create_requires_title() {
        let actions = seeded(vec![]);
        let err = actions
            .create(NewEvent::new(" ", Utc::now()))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Title and start time are required.");
        assert!(actions.sink().sent().is_empty());
    }

    #[tokio::test]
    async fn signed_out_calls_fail() {
        let actions = signed_out();
        let err = actions
            .create(NewEvent::new("Lecture", Utc::now()))
            .await
            .unwrap_err();
        assert_eq!(err, ActionError("Not authenticated".into()));
        assert!(actions.delete("e1").await.is_err());
        assert_eq!(actions.current_profile().await.unwrap(), None);
        assert!(actions.sink().sent().is_empty());
    }

    #[tokio::test]
    async fn status_change_reports_previous_and_new() {
        let actions = seeded(vec![rite()]);
        let updated = actions
            .update_status("e1", EventStatus::Delayed)
            .await
            .unwrap();
        assert_eq!(updated.status, EventStatus::Delayed);

        let sent = actions.sink().sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].action, NotificationAction::StatusChanged);
        assert_eq!(sent[0].current_status, Some(EventStatus::Scheduled));
        assert_eq!(sent[0].new_status, Some(EventStatus::Delayed));
        assert_eq!(sent[0].event_title, "Blood Moon Rite");
    }

    #[tokio::test]
    async fn failed_write_sends_nothing() {
        let actions = seeded(vec![rite()]);
        actions.store().fail_next_write("permission denied for table events");

        let err = actions
            .update_status("e1", EventStatus::Completed)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "permission denied for table events");
        assert!(actions.sink().sent().is_empty());

        let events = actions.list().await.unwrap();
        assert_eq!(events[0].status, EventStatus::Scheduled);
    }

    #[tokio::test]
    async fn update_notifies_with_new_fields() {
        let actions = seeded(vec![rite()]);
        let patch = EventPatch {
            title: Some("Blood Moon Rite II".into()),
            ..Default::default()
        };
        let updated = actions.update("e1", patch).await.unwrap();
        assert_eq!(updated.title, "Blood Moon Rite II");

        let sent = actions.sink().sent();
        assert_eq!(sent[0].action, NotificationAction::Updated);
        assert_eq!(sent[0].event_title, "Blood Moon Rite II");
        assert_eq!(sent[0].author_username, "Renaissance");
        assert_eq!(sent[0].current_status, Some(EventStatus::Scheduled));
    }

    #[tokio::test]
    async fn empty_patch_is_rejected() {
        let actions = seeded(vec![rite()]);
        let err = actions.update("e1", EventPatch::default()).await.unwrap_err();
        assert_eq!(err.to_string(), "Nothing to update.");
    }

    #[tokio::test]
    async fn delete_reads_event_first() {
        let actions = seeded(vec![rite()]);
        actions.delete("e1").await.unwrap();
        assert!(actions.list().await.unwrap().is_empty());

        let sent = actions.sink().sent();
        assert_eq!(sent[0].action, NotificationAction::Deleted);
        assert_eq!(sent[0].event_title, "Blood Moon Rite");

        let err = actions.delete("e1").await.unwrap_err();
        assert_eq!(err.to_string(), "Event not found: e1");
        assert_eq!(actions.sink().sent().len(), 1);
    }

    /// Reads fail, writes go through to the in-memory store.
    struct UnreadableStore(InMemoryEventStore);

    impl EventStore for UnreadableStore {
        async fn list(&self) -> ClanCalResult<Chronological> {
            self.0.list().await
        }

        async fn get(&self, _id: &str) -> ClanCalResult<Option<Event>> {
            Err(ClanCalError::Backend {
                status: 503,
                message: "view unavailable".into(),
            })
        }

        async fn create(&self, owner: &str, fields: &NewEvent) -> ClanCalResult<Event> {
            self.0.create(owner, fields).await
        }

        async fn update(&self, id: &str, patch: &EventPatch) -> ClanCalResult<Event> {
            self.0.update(id, patch).await
        }

        async fn update_status(&self, id: &str, status: EventStatus) -> ClanCalResult<Event> {
            self.0.update_status(id, status).await
        }

        async fn delete(&self, id: &str) -> ClanCalResult<()> {
            self.0.delete(id).await
        }

        async fn profile(&self, user_id: &str) -> ClanCalResult<Option<Profile>> {
            self.0.profile(user_id).await
        }

        async fn rename_profile(&self, user_id: &str, username: &str) -> ClanCalResult<()> {
            self.0.rename_profile(user_id, username).await
        }
    }

    #[tokio::test]
    async fn failed_read_still_applies_the_write() {
        let actions = Actions::new(
            UnreadableStore(InMemoryEventStore::with_events(vec![rite()])),
            InMemoryIdentity::signed_in_as(queen(), "hunter22"),
            RecordingSink::default(),
        );

        let updated = actions
            .update_status("e1", EventStatus::Completed)
            .await
            .unwrap();
        assert_eq!(updated.status, EventStatus::Completed);
        assert_eq!(
            actions.list().await.unwrap()[0].status,
            EventStatus::Completed
        );

        let patch = EventPatch {
            title: Some("Blood Moon Rite II".into()),
            ..Default::default()
        };
        actions.update("e1", patch).await.unwrap();

        actions.delete("e1").await.unwrap();
        assert!(actions.list().await.unwrap().is_empty());

        // Only the update carries enough from its own write to notify
        let sent = actions.sink().sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].action, NotificationAction::Updated);
    }

    #[tokio::test]
    async fn unreachable_webhook_never_blocks_the_change() {
        use crate::notify::DiscordWebhook;
        use crate::zone::DisplayZones;

        let store = InMemoryEventStore::with_events(vec![rite()]);
        let hook = DiscordWebhook::new(
            Some(url::Url::parse("http://127.0.0.1:9/webhook").unwrap()),
            DisplayZones::new(chrono_tz::America::Los_Angeles, "SLT", None),
        );
        let actions = Actions::new(
            store,
            InMemoryIdentity::signed_in_as(queen(), "hunter22"),
            hook,
        );

        let updated = actions
            .update_status("e1", EventStatus::Completed)
            .await
            .unwrap();
        assert_eq!(updated.status, EventStatus::Completed);
        actions.delete("e1").await.unwrap();
        assert!(actions.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn sign_in_and_out() {
        let actions = signed_out();
        let err = actions
            .sign_in("queen@example.com", "wrong")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid login credentials");

        let session = actions
            .sign_in(" queen@example.com ", "hunter22")
            .await
            .unwrap();
        assert_eq!(session.user.id, "owner-1");
        assert!(actions.current_user().await.unwrap().is_some());

        actions.sign_out().await.unwrap();
        assert!(actions.current_user().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn rename_trims_and_rejects_blank() {
        let actions = seeded(vec![]);
        let err = actions.rename("   ").await.unwrap_err();
        assert_eq!(err.to_string(), "Username cannot be empty.");

        let name = actions.rename("  Lilith ").await.unwrap();
        assert_eq!(name, "Lilith");
        let profile = actions.current_profile().await.unwrap().unwrap();
        assert_eq!(profile.username, "Lilith");
    }

    #[tokio::test]
    async fn password_rules() {
        let actions = seeded(vec![]);
        let cases = [
            (None, "", "", "Enter a new password."),
            (None, "abcdef", "abcdeg", "Passwords do not match."),
            (None, "abc", "abc", "Password must be at least 6 characters."),
            (
                Some("nope"),
                "abcdef",
                "abcdef",
                "Current password is incorrect.",
            ),
        ];
        for (current, new, confirm, expected) in cases {
            let err = actions
                .change_password(current, new, confirm)
                .await
                .unwrap_err();
            assert_eq!(err.to_string(), expected);
        }

        actions
            .change_password(Some("hunter22"), "nightfall", "nightfall")
            .await
            .unwrap();
        actions.sign_out().await.unwrap();
        assert!(actions.sign_in("queen@example.com", "hunter22").await.is_err());
        assert!(actions.sign_in("queen@example.com", "nightfall").await.is_ok());
    }
}
