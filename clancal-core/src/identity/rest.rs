//! GoTrue-style REST client for the hosted identity provider.

use chrono::{Duration, Utc};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use url::Url;

use super::{IdentityProvider, Session, User};
use crate::constants::BACKEND_TIMEOUT;
use crate::error::{ClanCalError, ClanCalResult};

pub struct RestIdentity {
    http: reqwest::Client,
    base_url: Url,
    api_key: String,
    access_token: Option<String>,
}

/// The provider spells its error message differently per endpoint.
#[derive(Deserialize)]
struct ErrorResponse {
    error_description: Option<String>,
    msg: Option<String>,
    message: Option<String>,
    error: Option<String>,
}

impl ErrorResponse {
    fn into_message(self) -> Option<String> {
        self.error_description
            .or(self.msg)
            .or(self.message)
            .or(self.error)
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
    user: User,
}

impl From<TokenResponse> for Session {
    fn from(tokens: TokenResponse) -> Self {
        Session {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            expires_at: tokens.expires_in.map(|s| Utc::now() + Duration::seconds(s)),
            user: tokens.user,
        }
    }
}

impl RestIdentity {
    pub fn new(base_url: Url, api_key: impl Into<String>) -> Self {
        RestIdentity {
            http: crate::http::client(BACKEND_TIMEOUT),
            base_url,
            api_key: api_key.into(),
            access_token: None,
        }
    }

    /// Resume a previously stored session.
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    fn request(&self, method: Method, path: &str, token: Option<&str>) -> ClanCalResult<RequestBuilder> {
        let url = self.base_url.join(&format!("auth/v1/{path}"))?;
        let bearer = token.unwrap_or(&self.api_key);
        Ok(self
            .http
            .request(method, url)
            .header("apikey", &self.api_key)
            .bearer_auth(bearer))
    }

    /// Exchange a refresh token for a new session.
    pub async fn refresh(&self, refresh_token: &str) -> ClanCalResult<Session> {
        let resp = self
            .request(Method::POST, "token", None)?
            .query(&[("grant_type", "refresh_token")])
            .json(&serde_json::json!({ "refresh_token": refresh_token }))
            .send()
            .await?;
        let tokens: TokenResponse = check(resp).await?.json().await?;
        tracing::debug!(user = %tokens.user.id, "session refreshed");
        Ok(tokens.into())
    }

    fn token(&self) -> ClanCalResult<&str> {
        self.access_token
            .as_deref()
            .ok_or(ClanCalError::NotAuthenticated)
    }
}

async fn check(resp: Response) -> ClanCalResult<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorResponse>(&body)
        .ok()
        .and_then(ErrorResponse::into_message)
        .unwrap_or_else(|| status.to_string());

    Err(ClanCalError::Backend {
        status: status.as_u16(),
        message,
    })
}

impl IdentityProvider for RestIdentity {
    async fn current_user(&self) -> ClanCalResult<Option<User>> {
        let Some(token) = self.access_token.as_deref() else {
            return Ok(None);
        };

        let resp = self.request(Method::GET, "user", Some(token))?.send().await?;
        if matches!(resp.status(), StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            tracing::debug!("stored session was rejected");
            return Ok(None);
        }
        Ok(Some(check(resp).await?.json().await?))
    }

    async fn sign_in(&self, email: &str, password: &str) -> ClanCalResult<Session> {
        let resp = self
            .request(Method::POST, "token", None)?
            .query(&[("grant_type", "password")])
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;
        let tokens: TokenResponse = check(resp).await?.json().await?;
        tracing::info!(user = %tokens.user.id, "signed in");
        Ok(tokens.into())
    }

    async fn sign_out(&self) -> ClanCalResult<()> {
        let resp = self
            .request(Method::POST, "logout", Some(self.token()?))?
            .send()
            .await?;
        check(resp).await?;
        Ok(())
    }

    async fn update_password(&self, new_password: &str) -> ClanCalResult<()> {
        let resp = self
            .request(Method::PUT, "user", Some(self.token()?))?
            .json(&serde_json::json!({ "password": new_password }))
            .send()
            .await?;
        check(resp).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_message_prefers_description() {
        let body = r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#;
        let parsed: ErrorResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.into_message().as_deref(), Some("Invalid login credentials"));

        let body = r#"{"code":422,"msg":"Password should be at least 6 characters"}"#;
        let parsed: ErrorResponse = serde_json::from_str(body).unwrap();
        assert_eq!(
            parsed.into_message().as_deref(),
            Some("Password should be at least 6 characters")
        );
    }

    #[test]
    fn token_response_becomes_session() {
        let body = r#"{
            "access_token": "jwt",
            "token_type": "bearer",
            "expires_in": 3600,
            "refresh_token": "refresh",
            "user": { "id": "u1", "email": "queen@example.com", "role": "authenticated" }
        }"#;
        let tokens: TokenResponse = serde_json::from_str(body).unwrap();
        let session: Session = tokens.into();
        assert_eq!(session.user.id, "u1");
        assert!(!session.is_expired(Utc::now()));
        assert!(session.is_expired(Utc::now() + Duration::hours(2)));
    }

    #[test]
    fn privileged_calls_need_a_token() {
        let identity = RestIdentity::new(Url::parse("https://project.example.co/").unwrap(), "anon");
        assert!(matches!(identity.token(), Err(ClanCalError::NotAuthenticated)));
        let identity = identity.with_access_token("jwt");
        assert_eq!(identity.token().unwrap(), "jwt");
    }
}
