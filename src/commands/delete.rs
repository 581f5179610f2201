use anyhow::Result;
use clancal_core::Event;
use dialoguer::Confirm;
use owo_colors::OwoColorize;

use crate::commands::{check_permission, fetch_event, print_done, require_member};
use crate::context::AppContext;
use crate::render::render_card;
use crate::utils::tui::{is_interactive, with_spinner};

pub async fn run(ctx: &AppContext, id: &str, yes: bool) -> Result<()> {
    let (_, profile) = require_member(ctx).await?;
    let existing = fetch_event(ctx, id).await?;
    check_permission(
        profile.as_ref(),
        &existing,
        Event::can_delete,
        "Only the creator or an admin can delete this event.",
    )?;

    if !yes {
        if !is_interactive() {
            anyhow::bail!("Refusing to delete without confirmation. Pass --yes to skip the prompt.");
        }
        println!("{}", render_card(&existing, ctx.mode, &ctx.zones));
        let confirmed = Confirm::new()
            .with_prompt("  Delete this event?")
            .default(false)
            .interact()?;
        if !confirmed {
            println!("{}", "  Kept".dimmed());
            return Ok(());
        }
    }

    with_spinner("Deleting event...", ctx.actions.delete(&existing.id)).await?;
    print_done(&format!("Deleted: {}", existing.title));
    Ok(())
}
