//! Defaults shared across the crate.

use std::time::Duration as StdDuration;

use chrono::Duration;

/// The community's canonical event zone.
pub const DEFAULT_REFERENCE_ZONE: &str = "America/Los_Angeles";

/// Short label shown next to reference-zone times.
pub const DEFAULT_REFERENCE_LABEL: &str = "SLT";

/// Label used when the viewer's zone can't be detected.
pub const FALLBACK_LOCAL_LABEL: &str = "Local";

/// Events that started less than this long ago still count as upcoming.
pub fn upcoming_grace() -> Duration {
    Duration::hours(1)
}

/// Username shown when an event's author has no profile.
pub const UNKNOWN_AUTHOR: &str = "Unknown";

/// Minimum length accepted for a new password.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Upper bound on any request to the hosted backend.
pub const BACKEND_TIMEOUT: StdDuration = StdDuration::from_secs(10);

/// Upper bound on a webhook delivery. The change it reports is already saved.
pub const WEBHOOK_TIMEOUT: StdDuration = StdDuration::from_secs(5);
