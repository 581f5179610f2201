use anyhow::Result;
use chrono::Utc;
use clancal_core::filter::{EventFilter, group_by_recency};
use clancal_core::timefmt::time_label;
use clancal_core::{Event, EventCategory, EventStatus};
use clap::Args;
use owo_colors::OwoColorize;

use crate::context::AppContext;
use crate::render::{pluralize, render_card};
use crate::utils::tui::with_spinner;

#[derive(Args, Debug, Default)]
pub struct FilterArgs {
    /// Only this category
    #[arg(short, long)]
    pub category: Option<EventCategory>,

    /// Only this status
    #[arg(long)]
    pub status: Option<EventStatus>,

    /// Title contains this text
    #[arg(short = 'q', long)]
    pub search: Option<String>,
}

impl From<FilterArgs> for EventFilter {
    fn from(args: FilterArgs) -> Self {
        EventFilter {
            category: args.category,
            status: args.status,
            search: args.search,
        }
    }
}

pub async fn run(ctx: &AppContext, filter: FilterArgs, past: bool) -> Result<()> {
    let events = with_spinner("Loading events...", ctx.actions.list()).await?;
    let events = EventFilter::from(filter).apply(&events);
    let groups = group_by_recency(&events, Utc::now());

    println!(
        "{}",
        format!("Times shown in {}", time_label(ctx.mode, &ctx.zones)).dimmed()
    );
    println!();

    print_section(ctx, "Upcoming", &groups.upcoming);

    if past {
        println!();
        print_section(ctx, "Past", &groups.past);
    } else if !groups.past.is_empty() {
        let count = groups.past.len();
        println!();
        println!(
            "{}",
            format!("{count} past {} hidden, use --past to show", pluralize("event", count)).dimmed()
        );
    }

    Ok(())
}

fn print_section(ctx: &AppContext, heading: &str, events: &[&Event]) {
    println!("{} {}", heading.bold(), format!("({})", events.len()).dimmed());

    if events.is_empty() {
        println!("{}", "   No events found".dimmed());
        return;
    }

    for (i, event) in events.iter().enumerate() {
        if i > 0 {
            println!();
        }
        println!("{}", render_card(event, ctx.mode, &ctx.zones));
    }
}
