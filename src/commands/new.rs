use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use clancal_core::timefmt::{format_instant, parse_instant, time_label};
use clancal_core::{EventCategory, EventStatus, NewEvent};
use clap::Args;
use dialoguer::{Input, Select};
use owo_colors::OwoColorize;

use crate::commands::{print_done, require_member};
use crate::context::AppContext;
use crate::utils::tui::{is_interactive, with_spinner};

#[derive(Args, Debug)]
pub struct NewArgs {
    pub title: Option<String>,

    /// Start time, e.g. "sat 8pm", "march 20 19:30" or an RFC 3339 instant
    #[arg(short, long)]
    pub start: Option<String>,

    #[arg(short, long)]
    pub category: Option<EventCategory>,

    #[arg(long)]
    pub status: Option<EventStatus>,

    /// Teleport link or other location
    #[arg(short, long)]
    pub location: Option<String>,

    #[arg(short, long)]
    pub description: Option<String>,
}

pub async fn run(ctx: &AppContext, args: NewArgs) -> Result<()> {
    require_member(ctx).await?;

    let interactive = (args.title.is_none() || args.start.is_none()) && is_interactive();
    if !interactive && (args.title.is_none() || args.start.is_none()) {
        anyhow::bail!("Title and start time are required.");
    }

    let zone = ctx.zones.zone(ctx.mode);
    let label = time_label(ctx.mode, &ctx.zones);

    // --- Title ---
    let title = match args.title {
        Some(t) => t,
        None => Input::<String>::new()
            .with_prompt("  Title")
            .interact_text()?,
    };

    // --- Start ---
    let start_time = match args.start {
        Some(s) => parse_start(&s, zone)?,
        None => prompt_with_retry(&format!("  When? ({label})"), |input| parse_start(input, zone))?,
    };

    // --- Category / status ---
    let category = match args.category {
        Some(c) => c,
        None if interactive => pick("  Category", &EventCategory::ALL, EventCategory::Ceremony)?,
        None => EventCategory::Ceremony,
    };

    let status = match args.status {
        Some(s) => s,
        None if interactive => pick("  Status", &EventStatus::ALL, EventStatus::Scheduled)?,
        None => EventStatus::Scheduled,
    };

    // --- Location / description ---
    let location = optional_text(args.location, interactive, "  Where? (skip)")?;
    let description = optional_text(args.description, interactive, "  Description (skip)")?;

    let mut fields = NewEvent::new(title, start_time);
    fields.category = category;
    fields.status = status;
    fields.location = location;
    fields.description = description;

    let event = with_spinner("Creating event...", ctx.actions.create(fields)).await?;

    if interactive {
        println!();
    }
    print_done(&format!("Created: {}", event.title));
    println!(
        "  {}",
        format!("{} {label}", format_instant(event.start_time, ctx.mode, &ctx.zones)).dimmed()
    );

    Ok(())
}

/// Use `given` if present, otherwise ask when interactive. Blank means none.
pub fn optional_text(given: Option<String>, interactive: bool, prompt: &str) -> Result<Option<String>> {
    let text = match given {
        Some(text) => text,
        None if interactive => Input::new()
            .with_prompt(prompt)
            .default(String::new())
            .show_default(false)
            .interact_text()?,
        None => String::new(),
    };
    let text = text.trim();
    Ok(if text.is_empty() { None } else { Some(text.to_string()) })
}

/// Select one of `options`, starting on `default`.
pub fn pick<T: Copy + PartialEq + std::fmt::Display>(prompt: &str, options: &[T], default: T) -> Result<T> {
    let items: Vec<String> = options.iter().map(ToString::to_string).collect();
    let start = options.iter().position(|o| *o == default).unwrap_or(0);
    let selection = Select::new()
        .with_prompt(prompt)
        .items(&items)
        .default(start)
        .interact()?;
    Ok(options[selection])
}

/// Prompt the user with retry on parse errors.
pub fn prompt_with_retry<F>(prompt: &str, parse: F) -> Result<DateTime<Utc>>
where
    F: Fn(&str) -> Result<DateTime<Utc>>,
{
    loop {
        let input: String = Input::new().with_prompt(prompt).interact_text()?;
        match parse(&input) {
            Ok(result) => return Ok(result),
            Err(e) => {
                eprintln!("  {}", e.to_string().red());
            }
        }
    }
}

/// Expand common abbreviations that fuzzydate doesn't handle.
fn expand_abbreviations(input: &str) -> String {
    let abbrevs = [
        ("mon", "monday"),
        ("tue", "tuesday"),
        ("tues", "tuesday"),
        ("wed", "wednesday"),
        ("thu", "thursday"),
        ("thur", "thursday"),
        ("thurs", "thursday"),
        ("fri", "friday"),
        ("sat", "saturday"),
        ("sun", "sunday"),
        ("jan", "january"),
        ("feb", "february"),
        ("mar", "march"),
        ("apr", "april"),
        ("jun", "june"),
        ("jul", "july"),
        ("aug", "august"),
        ("sep", "september"),
        ("sept", "september"),
        ("oct", "october"),
        ("nov", "november"),
        ("dec", "december"),
    ];

    let lower = input.to_lowercase();
    lower
        .split_whitespace()
        .map(|word| {
            abbrevs
                .iter()
                .find(|(abbr, _)| *abbr == word)
                .map(|(_, full)| *full)
                .unwrap_or(word)
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parse a start time typed by a person, read as wall-clock time in `zone`.
///
/// RFC 3339 instants are taken as-is. Anything else goes through fuzzydate and
/// must name a time of day, since events start at a specific moment.
pub fn parse_start(input: &str, zone: Tz) -> Result<DateTime<Utc>> {
    if let Some(instant) = parse_instant(input) {
        return Ok(instant);
    }

    if !has_time_component(input) {
        anyhow::bail!("Add a time of day to \"{}\", e.g. \"sat 8pm\"", input.trim());
    }

    let expanded = expand_abbreviations(input);
    let naive = fuzzydate::parse(&expanded)
        .map_err(|_| anyhow::anyhow!("Could not parse date/time: \"{}\"", input))?;

    localize(naive, zone)
}

/// Resolve a wall-clock time in `zone`. Ambiguous times take the earlier
/// offset; times skipped by a DST jump are rejected.
fn localize(naive: NaiveDateTime, zone: Tz) -> Result<DateTime<Utc>> {
    zone.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| {
            format!(
                "{} does not exist in {} (clocks skip it)",
                naive.format("%b %-d, %-I:%M %p"),
                zone.name()
            )
        })
}

/// Check if the user's input string contains time-related tokens.
fn has_time_component(input: &str) -> bool {
    let lower = input.to_lowercase();

    if lower.contains("noon") || lower.contains("midnight") {
        return true;
    }

    // am/pm patterns like "6pm", "6 pm", "11am"
    let bytes = lower.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        if (b == b'a' || b == b'p') && i + 1 < bytes.len() && bytes[i + 1] == b'm' {
            if i > 0 && bytes[i - 1].is_ascii_digit() {
                return true;
            }
            if i > 1 && bytes[i - 1] == b' ' && bytes[i - 2].is_ascii_digit() {
                return true;
            }
        }
    }

    // HH:MM
    for (i, &b) in bytes.iter().enumerate() {
        if b == b':' {
            let has_digit_before = i > 0 && bytes[i - 1].is_ascii_digit();
            let has_digit_after = i + 1 < bytes.len() && bytes[i + 1].is_ascii_digit();
            if has_digit_before && has_digit_after {
                return true;
            }
        }
    }

    // "at" followed by a digit, e.g. "at 3", "friday at 15"
    let starts_with_digit = |rest: &str| rest.starts_with(|c: char| c.is_ascii_digit());
    lower.strip_prefix("at ").is_some_and(starts_with_digit)
        || lower
            .match_indices(" at ")
            .any(|(pos, _)| starts_with_digit(&lower[pos + 4..]))
}
