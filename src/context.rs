//! Wires configuration, the stored session and the backend clients together.

use anyhow::{Context as _, Result};
use chrono::Utc;
use clancal_core::actions::Actions;
use clancal_core::config::ClanCalConfig;
use clancal_core::identity::{RestIdentity, Session};
use clancal_core::notify::DiscordWebhook;
use clancal_core::store::RestEventStore;
use clancal_core::zone::{DisplayZones, TimeZoneMode};

use crate::session;

pub type ClanActions = Actions<RestEventStore, RestIdentity, DiscordWebhook>;

pub struct AppContext {
    pub zones: DisplayZones,
    pub mode: TimeZoneMode,
    pub actions: ClanActions,
}

impl AppContext {
    /// Build the context. `mode` overrides the configured default zone mode.
    pub async fn load(mode: Option<TimeZoneMode>) -> Result<Self> {
        let config = ClanCalConfig::load().context("Failed to load configuration")?;
        let zones = config.zones()?;
        let mode = mode.unwrap_or(config.display.default_mode);

        let base_url = config.backend_url().with_context(not_configured)?;
        let api_key = config.api_key().with_context(not_configured)?.to_string();

        let mut identity = RestIdentity::new(base_url.clone(), api_key.clone());
        let mut store = RestEventStore::new(base_url, api_key);

        if let Some(session) = resume_session(&identity).await? {
            store = store.with_access_token(&session.access_token);
            identity = identity.with_access_token(&session.access_token);
        }

        let actions = Actions::new(store, identity, config.webhook()?);

        Ok(AppContext {
            zones,
            mode,
            actions,
        })
    }
}

fn not_configured() -> String {
    let path = ClanCalConfig::config_path()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|_| "config.toml".to_string());
    format!("The backend is not configured. Set [backend] url and api_key in {path}")
}

/// Load the stored session, refreshing it when it has expired.
async fn resume_session(identity: &RestIdentity) -> Result<Option<Session>> {
    let Some(stored) = session::load()? else {
        return Ok(None);
    };

    if !stored.is_expired(Utc::now()) {
        return Ok(Some(stored));
    }

    let Some(refresh_token) = stored.refresh_token.as_deref() else {
        tracing::warn!("stored session expired");
        return Ok(None);
    };

    match identity.refresh(refresh_token).await {
        Ok(fresh) => {
            session::save(&fresh)?;
            Ok(Some(fresh))
        }
        Err(e) => {
            tracing::warn!(error = %e, "could not refresh session");
            Ok(None)
        }
    }
}
