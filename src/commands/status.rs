use anyhow::Result;
use clancal_core::{Event, EventStatus};
use owo_colors::OwoColorize;

use crate::commands::new::pick;
use crate::commands::{check_permission, fetch_event, print_done, require_member};
use crate::context::AppContext;
use crate::render::Render;
use crate::utils::tui::{is_interactive, with_spinner};

pub async fn run(ctx: &AppContext, id: &str, status: Option<EventStatus>) -> Result<()> {
    let (_, profile) = require_member(ctx).await?;
    let existing = fetch_event(ctx, id).await?;
    check_permission(
        profile.as_ref(),
        &existing,
        Event::can_change_status,
        "Only the creator or an admin can change this event's status.",
    )?;

    let status = match status {
        Some(s) => s,
        None if is_interactive() => pick("  Status", &EventStatus::ALL, existing.status)?,
        None => anyhow::bail!("Choose a status: {}", status_names()),
    };

    if status == existing.status {
        println!("{}", format!("  Already {status}").dimmed());
        return Ok(());
    }

    let updated = with_spinner(
        "Updating status...",
        ctx.actions.update_status(&existing.id, status),
    )
    .await?;

    print_done(&format!("{}: {}", updated.title, updated.status));
    println!("  {} → {}", existing.status.render(), updated.status.render());
    Ok(())
}

fn status_names() -> String {
    EventStatus::ALL
        .iter()
        .map(|s| s.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
