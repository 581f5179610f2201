//! clancal configuration.
//!
//! Loaded from `~/.config/clancal/config.toml`, then overridden by
//! `CLANCAL_*` environment variables (`CLANCAL_BACKEND__URL`,
//! `CLANCAL_NOTIFICATIONS__WEBHOOK_URL`, ...). `DISCORD_WEBHOOK_URL` is
//! honoured as well.

use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::constants::{DEFAULT_REFERENCE_LABEL, DEFAULT_REFERENCE_ZONE};
use crate::error::{ClanCalError, ClanCalResult};
use crate::notify::{DEFAULT_FOOTER, DiscordWebhook};
use crate::zone::{DisplayZones, TimeZoneMode, detect_local_zone, parse_zone};

const ENV_PREFIX: &str = "CLANCAL";
const WEBHOOK_ENV: &str = "DISCORD_WEBHOOK_URL";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClanCalConfig {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub notifications: NotificationConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

/// The hosted backend (event store and identity provider).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Project URL, e.g. `https://abcd.supabase.co`
    pub url: Option<String>,
    /// Public (anon) API key
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationConfig {
    pub webhook_url: Option<String>,
    #[serde(default = "default_footer")]
    pub footer: String,
    pub avatar_url: Option<String>,
}

fn default_footer() -> String {
    DEFAULT_FOOTER.to_string()
}

impl Default for NotificationConfig {
    fn default() -> Self {
        NotificationConfig {
            webhook_url: None,
            footer: default_footer(),
            avatar_url: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_reference_zone")]
    pub reference_zone: String,
    #[serde(default = "default_reference_label")]
    pub reference_label: String,
    /// Overrides host zone detection
    pub local_zone: Option<String>,
    #[serde(default)]
    pub default_mode: TimeZoneMode,
}

fn default_reference_zone() -> String {
    DEFAULT_REFERENCE_ZONE.to_string()
}

fn default_reference_label() -> String {
    DEFAULT_REFERENCE_LABEL.to_string()
}

impl Default for DisplayConfig {
    fn default() -> Self {
        DisplayConfig {
            reference_zone: default_reference_zone(),
            reference_label: default_reference_label(),
            local_zone: None,
            default_mode: TimeZoneMode::Reference,
        }
    }
}

impl ClanCalConfig {
    pub fn config_dir() -> ClanCalResult<PathBuf> {
        Ok(dirs::config_dir()
            .ok_or_else(|| ClanCalError::Config("Could not determine config directory".into()))?
            .join("clancal"))
    }

    pub fn config_path() -> ClanCalResult<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load from the default location, creating a commented file on first run.
    pub fn load() -> ClanCalResult<Self> {
        let path = Self::config_path()?;
        if !path.exists() {
            Self::create_default_config(&path)?;
        }
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> ClanCalResult<Self> {
        Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .set_override_option("notifications.webhook_url", std::env::var(WEBHOOK_ENV).ok())
            .map_err(|e| ClanCalError::Config(e.to_string()))?
            .build()
            .map_err(|e| ClanCalError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| ClanCalError::Config(e.to_string()))
    }

    /// Write the current config to `path`.
    pub fn save(&self, path: &Path) -> ClanCalResult<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ClanCalError::Config(e.to_string()))?;
        std::fs::write(path, content)
            .map_err(|e| ClanCalError::Config(format!("Could not write config file: {e}")))?;
        Ok(())
    }

    /// Create a config file with every option commented out.
    pub fn create_default_config(path: &Path) -> ClanCalResult<()> {
        let contents = format!(
            "\
# clancal configuration

[backend]
# url = \"https://your-project.supabase.co\"
# api_key = \"public-anon-key\"

[notifications]
# webhook_url = \"https://discord.com/api/webhooks/...\"

[display]
# reference_zone = \"{DEFAULT_REFERENCE_ZONE}\"
# reference_label = \"{DEFAULT_REFERENCE_LABEL}\"
# local_zone = \"Europe/Berlin\"
# default_mode = \"reference\"
"
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ClanCalError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| ClanCalError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }

    /// Backend project URL, normalized to end in `/` so paths join under it.
    pub fn backend_url(&self) -> ClanCalResult<Url> {
        let raw = self.backend.url.as_deref().ok_or_else(|| {
            ClanCalError::Config("backend.url is not set".into())
        })?;
        let mut url = Url::parse(raw)?;
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        Ok(url)
    }

    pub fn api_key(&self) -> ClanCalResult<&str> {
        self.backend
            .api_key
            .as_deref()
            .ok_or_else(|| ClanCalError::Config("backend.api_key is not set".into()))
    }

    pub fn zones(&self) -> ClanCalResult<DisplayZones> {
        let reference = parse_zone(&self.display.reference_zone)?;
        let local = match &self.display.local_zone {
            Some(name) => Some(parse_zone(name)?),
            None => detect_local_zone(),
        };
        Ok(DisplayZones::new(
            reference,
            self.display.reference_label.clone(),
            local,
        ))
    }

    /// Webhook sink; delivery is disabled when no URL is configured.
    pub fn webhook(&self) -> ClanCalResult<DiscordWebhook> {
        let url = self
            .notifications
            .webhook_url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .map(Url::parse)
            .transpose()?;
        Ok(DiscordWebhook::new(url, self.zones()?)
            .with_footer(self.notifications.footer.clone())
            .with_avatar_url(self.notifications.avatar_url.clone()))
    }
}
