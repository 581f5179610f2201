//! PostgREST-style REST client for the hosted event store.
//!
//! Reads go through the `events_with_author` view so every event carries its
//! author's display name and role; writes go to the `events` table.

use reqwest::{Method, RequestBuilder, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use url::Url;

use super::EventStore;
use crate::constants::BACKEND_TIMEOUT;
use crate::error::{ClanCalError, ClanCalResult};
use crate::event::{Chronological, Event, EventPatch, EventStatus, NewEvent, Profile};

const EVENTS_TABLE: &str = "events";
const EVENTS_VIEW: &str = "events_with_author";
const PROFILES_TABLE: &str = "profiles";

/// Asks PostgREST for a single object instead of an array.
const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";

pub struct RestEventStore {
    http: reqwest::Client,
    base_url: Url,
    api_key: String,
    access_token: Option<String>,
}

/// Error body returned by PostgREST.
#[derive(Deserialize)]
struct ErrorResponse {
    message: String,
}

impl RestEventStore {
    pub fn new(base_url: Url, api_key: impl Into<String>) -> Self {
        RestEventStore {
            http: crate::http::client(BACKEND_TIMEOUT),
            base_url,
            api_key: api_key.into(),
            access_token: None,
        }
    }

    /// Act on behalf of a signed-in user rather than anonymously.
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    fn endpoint(&self, relation: &str) -> ClanCalResult<Url> {
        Ok(self.base_url.join(&format!("rest/v1/{relation}"))?)
    }

    fn request(&self, method: Method, relation: &str) -> ClanCalResult<RequestBuilder> {
        let bearer = self.access_token.as_deref().unwrap_or(&self.api_key);
        Ok(self
            .http
            .request(method, self.endpoint(relation)?)
            .header("apikey", &self.api_key)
            .bearer_auth(bearer))
    }

    async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> ClanCalResult<T> {
        let resp = check(request.send().await?).await?;
        Ok(resp.json().await?)
    }
}

/// Turn a non-success response into `ClanCalError::Backend` with the
/// backend's own message.
async fn check(resp: Response) -> ClanCalResult<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorResponse>(&body)
        .map(|e| e.message)
        .unwrap_or_else(|_| {
            if body.is_empty() {
                status.to_string()
            } else {
                body
            }
        });

    tracing::debug!(status = status.as_u16(), %message, "event store request failed");
    Err(ClanCalError::Backend {
        status: status.as_u16(),
        message,
    })
}

fn eq(id: &str) -> String {
    format!("eq.{id}")
}

impl EventStore for RestEventStore {
    async fn list(&self) -> ClanCalResult<Chronological> {
        let request = self
            .request(Method::GET, EVENTS_VIEW)?
            .query(&[("select", "*"), ("order", "start_time.asc")]);
        let events: Vec<Event> = Self::send_json(request).await?;
        tracing::debug!(count = events.len(), "fetched events");
        Chronological::from_ordered(events)
    }

    async fn get(&self, id: &str) -> ClanCalResult<Option<Event>> {
        let request = self
            .request(Method::GET, EVENTS_VIEW)?
            .query(&[("select", "*".to_string()), ("id", eq(id))]);
        let events: Vec<Event> = Self::send_json(request).await?;
        Ok(events.into_iter().next())
    }

    async fn create(&self, owner: &str, fields: &NewEvent) -> ClanCalResult<Event> {
        let mut body = serde_json::to_value(fields)
            .map_err(|e| ClanCalError::Serialization(e.to_string()))?;
        body["created_by"] = serde_json::Value::String(owner.to_string());

        let request = self
            .request(Method::POST, EVENTS_TABLE)?
            .header("Prefer", "return=representation")
            .header("Accept", SINGLE_OBJECT)
            .json(&body);
        Self::send_json(request).await
    }

    async fn update(&self, id: &str, patch: &EventPatch) -> ClanCalResult<Event> {
        let request = self
            .request(Method::PATCH, EVENTS_TABLE)?
            .query(&[("id", eq(id))])
            .header("Prefer", "return=representation")
            .header("Accept", SINGLE_OBJECT)
            .json(patch);
        Self::send_json(request).await
    }

    async fn update_status(&self, id: &str, status: EventStatus) -> ClanCalResult<Event> {
        let patch = EventPatch {
            status: Some(status),
            ..Default::default()
        };
        self.update(id, &patch).await
    }

    async fn delete(&self, id: &str) -> ClanCalResult<()> {
        let request = self
            .request(Method::DELETE, EVENTS_TABLE)?
            .query(&[("id", eq(id))]);
        check(request.send().await?).await?;
        Ok(())
    }

    async fn profile(&self, user_id: &str) -> ClanCalResult<Option<Profile>> {
        let request = self
            .request(Method::GET, PROFILES_TABLE)?
            .query(&[("select", "*".to_string()), ("id", eq(user_id))]);
        let profiles: Vec<Profile> = Self::send_json(request).await?;
        Ok(profiles.into_iter().next())
    }

    async fn rename_profile(&self, user_id: &str, username: &str) -> ClanCalResult<()> {
        let request = self
            .request(Method::PATCH, PROFILES_TABLE)?
            .query(&[("id", eq(user_id))])
            .json(&serde_json::json!({ "username": username }));
        check(request.send().await?).await?;
        Ok(())
    }
}
