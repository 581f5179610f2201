//! Display time zones.
//!
//! Every instant is shown either in the community's reference zone or in the
//! viewer's own zone. `DisplayZones` resolves a [`TimeZoneMode`] to a concrete
//! `chrono_tz::Tz` and a short label.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_REFERENCE_LABEL, FALLBACK_LOCAL_LABEL};
use crate::error::{ClanCalError, ClanCalResult};

/// Which civil calendar instants are interpreted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeZoneMode {
    /// The fixed community zone
    #[default]
    #[serde(alias = "slt")]
    Reference,
    /// The viewer's own zone
    Local,
}

impl TimeZoneMode {
    pub fn toggled(self) -> Self {
        match self {
            TimeZoneMode::Reference => TimeZoneMode::Local,
            TimeZoneMode::Local => TimeZoneMode::Reference,
        }
    }
}

impl fmt::Display for TimeZoneMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeZoneMode::Reference => f.write_str("reference"),
            TimeZoneMode::Local => f.write_str("local"),
        }
    }
}

impl FromStr for TimeZoneMode {
    type Err = ClanCalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "reference" | "slt" => Ok(TimeZoneMode::Reference),
            "local" => Ok(TimeZoneMode::Local),
            other => Err(ClanCalError::Validation(format!(
                "Unknown time zone mode '{other}'. Expected 'reference' or 'local'"
            ))),
        }
    }
}

/// The pair of zones a viewer can switch between.
#[derive(Debug, Clone)]
pub struct DisplayZones {
    reference: Tz,
    reference_label: String,
    /// `None` when the viewer's zone could not be detected
    local: Option<Tz>,
}

impl DisplayZones {
    pub fn new(reference: Tz, reference_label: impl Into<String>, local: Option<Tz>) -> Self {
        DisplayZones {
            reference,
            reference_label: reference_label.into(),
            local,
        }
    }

    /// Reference zone plus whatever zone the host reports.
    pub fn detect(reference: Tz, reference_label: impl Into<String>) -> Self {
        Self::new(reference, reference_label, detect_local_zone())
    }

    pub fn reference(&self) -> Tz {
        self.reference
    }

    pub fn local(&self) -> Option<Tz> {
        self.local
    }

    /// The zone used for `mode`. An undetectable local zone reads as UTC.
    pub fn zone(&self, mode: TimeZoneMode) -> Tz {
        match mode {
            TimeZoneMode::Reference => self.reference,
            TimeZoneMode::Local => self.local.unwrap_or(Tz::UTC),
        }
    }

    /// Civil date of `instant` as seen in the zone for `mode`.
    pub fn civil_date(&self, instant: DateTime<Utc>, mode: TimeZoneMode) -> NaiveDate {
        instant.with_timezone(&self.zone(mode)).date_naive()
    }

    /// Short zone label: the reference label, or the last segment of the
    /// local IANA name with underscores turned into spaces.
    pub fn label(&self, mode: TimeZoneMode) -> String {
        match mode {
            TimeZoneMode::Reference => self.reference_label.clone(),
            TimeZoneMode::Local => self
                .local
                .map(|tz| short_zone_name(tz.name()))
                .unwrap_or_else(|| FALLBACK_LOCAL_LABEL.to_string()),
        }
    }
}

impl Default for DisplayZones {
    fn default() -> Self {
        Self::detect(chrono_tz::America::Los_Angeles, DEFAULT_REFERENCE_LABEL)
    }
}

/// Ask the host for its IANA zone name.
pub fn detect_local_zone() -> Option<Tz> {
    match iana_time_zone::get_timezone() {
        Ok(name) => match name.parse::<Tz>() {
            Ok(tz) => Some(tz),
            Err(_) => {
                tracing::warn!(zone = %name, "host time zone is not a known IANA zone");
                None
            }
        },
        Err(e) => {
            tracing::warn!(error = %e, "could not detect host time zone");
            None
        }
    }
}

/// Parse an IANA zone name such as `America/Los_Angeles`.
pub fn parse_zone(name: &str) -> ClanCalResult<Tz> {
    name.parse::<Tz>()
        .map_err(|_| ClanCalError::Timezone(name.to_string()))
}

fn short_zone_name(name: &str) -> String {
    let last = name.rsplit('/').next().unwrap_or(name);
    if last.is_empty() {
        return FALLBACK_LOCAL_LABEL.to_string();
    }
    last.replace('_', " ")
}
