pub mod auth;
pub mod delete;
pub mod edit;
pub mod list;
pub mod month;
pub mod new;
pub mod status;

use anyhow::Result;
use clancal_core::identity::User;
use clancal_core::store::EventStore;
use clancal_core::{Event, Profile};
use owo_colors::OwoColorize;

use crate::context::AppContext;
use crate::utils::tui::with_spinner;

/// Fetch one event, failing with a readable message when it's gone.
pub async fn fetch_event(ctx: &AppContext, id: &str) -> Result<Event> {
    with_spinner("Loading event...", ctx.actions.store().get(id))
        .await?
        .ok_or_else(|| anyhow::anyhow!("Event '{id}' not found"))
}

/// The signed-in user and their profile. Errors when signed out.
pub async fn require_member(ctx: &AppContext) -> Result<(User, Option<Profile>)> {
    let Some(user) = ctx.actions.current_user().await? else {
        anyhow::bail!("Not signed in.\n\nSign in with:\n  clancal login");
    };
    let profile = ctx.actions.current_profile().await?;
    Ok((user, profile))
}

/// Refuse up front what the store would reject anyway. Without a profile the
/// store decides.
pub fn check_permission(
    profile: Option<&Profile>,
    event: &Event,
    allowed: fn(&Event, &Profile) -> bool,
    message: &str,
) -> Result<()> {
    match profile {
        Some(profile) if !allowed(event, profile) => anyhow::bail!("{message}"),
        _ => Ok(()),
    }
}

pub fn print_done(message: &str) {
    println!("{}", format!("  {message}").green());
}
