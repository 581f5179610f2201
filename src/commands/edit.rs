use anyhow::Result;
use clancal_core::timefmt::time_label;
use clancal_core::{Event, EventCategory, EventPatch};
use clap::Args;
use dialoguer::Input;

use crate::commands::new::{optional_text, parse_start, pick};
use crate::commands::{check_permission, fetch_event, print_done, require_member};
use crate::context::AppContext;
use crate::utils::tui::{is_interactive, with_spinner};

/// Wall-clock format used to pre-fill the start prompt.
const START_INPUT_FORMAT: &str = "%Y-%m-%d %H:%M";

#[derive(Args, Debug)]
pub struct EditArgs {
    /// Event id
    pub id: String,

    #[arg(short, long)]
    pub title: Option<String>,

    /// New start time, read in the active zone
    #[arg(short, long)]
    pub start: Option<String>,

    #[arg(short, long)]
    pub category: Option<EventCategory>,

    /// New location; an empty string clears it
    #[arg(short, long)]
    pub location: Option<String>,

    /// New description; an empty string clears it
    #[arg(short, long)]
    pub description: Option<String>,
}

impl EditArgs {
    fn has_changes(&self) -> bool {
        self.title.is_some()
            || self.start.is_some()
            || self.category.is_some()
            || self.location.is_some()
            || self.description.is_some()
    }
}

pub async fn run(ctx: &AppContext, args: EditArgs) -> Result<()> {
    let (_, profile) = require_member(ctx).await?;
    let existing = fetch_event(ctx, &args.id).await?;
    check_permission(
        profile.as_ref(),
        &existing,
        Event::can_edit,
        "Only the creator can edit this event.",
    )?;

    let patch = if args.has_changes() {
        let zone = ctx.zones.zone(ctx.mode);
        EventPatch {
            title: args.title,
            start_time: args.start.map(|s| parse_start(&s, zone)).transpose()?,
            category: args.category,
            location: args.location,
            description: args.description,
            status: None,
        }
    } else if is_interactive() {
        prompt_patch(ctx, &existing)?
    } else {
        anyhow::bail!("Nothing to update.");
    };

    let patch = changed_only(patch, &existing);
    let updated = with_spinner("Saving event...", ctx.actions.update(&existing.id, patch)).await?;

    print_done(&format!("Updated: {}", updated.title));
    Ok(())
}

/// Ask for each field, pre-filled with its current value.
fn prompt_patch(ctx: &AppContext, existing: &Event) -> Result<EventPatch> {
    let zone = ctx.zones.zone(ctx.mode);
    let label = time_label(ctx.mode, &ctx.zones);

    let title: String = Input::new()
        .with_prompt("  Title")
        .default(existing.title.clone())
        .interact_text()?;

    let current_start = existing
        .start_time
        .with_timezone(&zone)
        .format(START_INPUT_FORMAT)
        .to_string();
    let start_input: String = Input::new()
        .with_prompt(format!("  When? ({label})"))
        .default(current_start.clone())
        .interact_text()?;
    let start_time = if start_input.trim() == current_start {
        None
    } else {
        Some(parse_start(&start_input, zone)?)
    };

    let category = pick("  Category", &EventCategory::ALL, existing.category)?;

    let location = Input::<String>::new()
        .with_prompt("  Where?")
        .default(existing.location.clone().unwrap_or_default())
        .allow_empty(true)
        .interact_text()?;
    let description = optional_text(None, true, "  Description (skip to keep)")?;

    Ok(EventPatch {
        title: Some(title),
        start_time,
        category: Some(category),
        location: Some(location),
        description,
        status: None,
    })
}

/// Drop fields that would not change `existing`.
fn changed_only(mut patch: EventPatch, existing: &Event) -> EventPatch {
    if patch.title.as_deref() == Some(existing.title.as_str()) {
        patch.title = None;
    }
    if patch.start_time == Some(existing.start_time) {
        patch.start_time = None;
    }
    if patch.category == Some(existing.category) {
        patch.category = None;
    }
    if same_text(patch.location.as_deref(), existing.location.as_deref()) {
        patch.location = None;
    }
    if same_text(patch.description.as_deref(), existing.description.as_deref()) {
        patch.description = None;
    }
    patch
}

/// An empty edit matches an absent value.
fn same_text(new: Option<&str>, current: Option<&str>) -> bool {
    match new {
        Some(new) => new.trim() == current.unwrap_or("").trim(),
        None => false,
    }
}
