//! In-process identity provider with fixed accounts.

use std::collections::HashMap;
use std::sync::Mutex;

use super::{IdentityProvider, Session, User};
use crate::error::{ClanCalError, ClanCalResult};

#[derive(Default)]
pub struct InMemoryIdentity {
    /// email -> (user, password)
    accounts: Mutex<HashMap<String, (User, String)>>,
    current: Mutex<Option<User>>,
}

impl InMemoryIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_account(&self, user: User, password: impl Into<String>) {
        let email = user.email.clone().unwrap_or_else(|| user.id.clone());
        self.accounts
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .insert(email, (user, password.into()));
    }

    /// Start signed in as `user`.
    pub fn signed_in_as(user: User, password: impl Into<String>) -> Self {
        let identity = Self::default();
        identity.add_account(user.clone(), password);
        *identity.current.lock().unwrap_or_else(|p| p.into_inner()) = Some(user);
        identity
    }
}

impl IdentityProvider for InMemoryIdentity {
    async fn current_user(&self) -> ClanCalResult<Option<User>> {
        Ok(self.current.lock().unwrap_or_else(|p| p.into_inner()).clone())
    }

    async fn sign_in(&self, email: &str, password: &str) -> ClanCalResult<Session> {
        let user = {
            let accounts = self.accounts.lock().unwrap_or_else(|p| p.into_inner());
            match accounts.get(email) {
                Some((user, expected)) if expected == password => user.clone(),
                _ => {
                    return Err(ClanCalError::Backend {
                        status: 400,
                        message: "Invalid login credentials".into(),
                    });
                }
            }
        };

        *self.current.lock().unwrap_or_else(|p| p.into_inner()) = Some(user.clone());
        Ok(Session {
            access_token: format!("token-{}", user.id),
            refresh_token: None,
            expires_at: None,
            user,
        })
    }

    async fn sign_out(&self) -> ClanCalResult<()> {
        *self.current.lock().unwrap_or_else(|p| p.into_inner()) = None;
        Ok(())
    }

    async fn update_password(&self, new_password: &str) -> ClanCalResult<()> {
        let current = self
            .current
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
            .ok_or(ClanCalError::NotAuthenticated)?;

        let mut accounts = self.accounts.lock().unwrap_or_else(|p| p.into_inner());
        let entry = accounts
            .values_mut()
            .find(|(user, _)| user.id == current.id)
            .ok_or(ClanCalError::NotAuthenticated)?;
        entry.1 = new_password.to_string();
        Ok(())
    }
}
