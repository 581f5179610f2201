//! The identity provider: sign-in, sign-out and credential changes.

mod memory;
mod rest;

pub use memory::InMemoryIdentity;
pub use rest::RestIdentity;

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ClanCalResult;

/// An authenticated account as the identity provider reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Tokens returned by a successful sign-in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    pub user: User,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

pub trait IdentityProvider: Send + Sync {
    /// The signed-in user, or `None` when there is no valid session.
    fn current_user(&self) -> impl Future<Output = ClanCalResult<Option<User>>> + Send;

    fn sign_in(&self, email: &str, password: &str) -> impl Future<Output = ClanCalResult<Session>> + Send;

    fn sign_out(&self) -> impl Future<Output = ClanCalResult<()>> + Send;

    fn update_password(&self, new_password: &str) -> impl Future<Output = ClanCalResult<()>> + Send;
}
