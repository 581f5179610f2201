//! Terminal rendering for clancal types.
//!
//! Extension traits and helpers that turn core types into colored text
//! using owo_colors.

use chrono::{DateTime, Datelike, Utc};
use clancal_core::calendar::{CalendarView, DayCell, MonthGrid, Tooltip, WEEKDAY_LABELS};
use clancal_core::clock::Clock;
use clancal_core::timefmt::{format_instant, time_label};
use clancal_core::zone::{DisplayZones, TimeZoneMode};
use clancal_core::{Event, EventCategory, EventStatus, Profile};
use owo_colors::OwoColorize;

/// Extension trait for TUI rendering with colors.
pub trait Render {
    fn render(&self) -> String;
}

impl Render for EventCategory {
    fn render(&self) -> String {
        paint_category(*self, &format!("{} {}", self.icon(), self.as_str()))
    }
}

impl Render for EventStatus {
    fn render(&self) -> String {
        let label = format!("[{}]", self.as_str());
        match self {
            EventStatus::ToDo => label.cyan().to_string(),
            EventStatus::Scheduled => label.green().to_string(),
            EventStatus::Delayed => label.yellow().to_string(),
            EventStatus::Completed => label.dimmed().to_string(),
        }
    }
}

impl Render for Profile {
    fn render(&self) -> String {
        let admin = if self.is_admin { " · admin" } else { "" };
        format!(
            "{} {}",
            self.username.bold(),
            format!("({}{admin})", self.role).dimmed()
        )
    }
}

fn paint_category(category: EventCategory, text: &str) -> String {
    match category {
        EventCategory::Education => text.magenta().to_string(),
        EventCategory::Combat => text.red().to_string(),
        EventCategory::Ceremony => text.yellow().to_string(),
    }
}

/// Simple pluralization helper
pub fn pluralize(word: &str, count: usize) -> String {
    if count == 1 {
        word.to_string()
    } else {
        format!("{word}s")
    }
}

/// Width of one day column, in terminal cells.
const CELL_WIDTH: usize = 6;

/// Event dots drawn per day before collapsing into `+`.
const MAX_DOTS: usize = 2;

/// Time-of-day in the active zone, e.g. `8:00 PM`.
fn clock_time(instant: DateTime<Utc>, mode: TimeZoneMode, zones: &DisplayZones) -> String {
    instant
        .with_timezone(&zones.zone(mode))
        .format("%-I:%M %p")
        .to_string()
}

fn render_cell(cell: &DayCell<'_, '_>) -> String {
    let Some(day) = cell.day else {
        return " ".repeat(CELL_WIDTH);
    };

    let number = format!("{day:>3}");
    let number = if cell.is_selected {
        number.reversed().to_string()
    } else if cell.is_today {
        number.bold().underline().to_string()
    } else if cell.is_hovered {
        number.italic().to_string()
    } else if cell.events.is_empty() {
        number.dimmed().to_string()
    } else {
        number
    };

    let mut marks = String::new();
    let mut width = 0;
    for event in cell.events.iter().take(MAX_DOTS) {
        marks.push_str(&paint_category(event.category, "•"));
        width += 1;
    }
    if cell.events.len() > MAX_DOTS {
        marks.push('+');
        width += 1;
    }

    format!("{number}{marks}{}", " ".repeat(CELL_WIDTH - 3 - width))
}

fn render_tooltip(tooltip: &Tooltip<'_, '_>, mode: TimeZoneMode, zones: &DisplayZones) -> Vec<String> {
    let column = tooltip.cell_index % WEEKDAY_LABELS.len();
    let indent = " ".repeat(column * CELL_WIDTH + 1);
    let arrow = if tooltip.above { "▼" } else { "▲" };

    let mut lines = Vec::with_capacity(tooltip.events.len() + 1);
    let count = tooltip.events.len();
    let header = format!(
        "{indent}{arrow} {} {}",
        format!("Day {}", tooltip.day).bold(),
        format!("· {count} {}", pluralize("event", count)).dimmed()
    );

    let body = tooltip.events.iter().map(|event| {
        format!(
            "{indent}  {} {} {}",
            paint_category(event.category, event.category.icon()),
            clock_time(event.start_time, mode, zones).dimmed(),
            event.title
        )
    });

    if tooltip.above {
        lines.extend(body);
        lines.push(header);
    } else {
        lines.push(header);
        lines.extend(body);
    }
    lines
}

/// The month grid with its header, weekday row and any open tooltip.
///
/// Tooltips are drawn next to the hovered week: below it, or above it when
/// the week is one of the last two rows.
pub fn render_month<C: Clock>(view: &CalendarView<'_, C>) -> String {
    let mode = view.mode();
    let zones = view.zones();

    let mut lines = vec![format!(
        "{} {}",
        view.month().to_string().bold(),
        format!("({} time)", time_label(mode, zones)).dimmed()
    )];

    let weekdays: String = WEEKDAY_LABELS
        .iter()
        .map(|label| format!("{label:>4}  "))
        .collect();
    lines.push(weekdays.trim_end().dimmed().to_string());

    let tooltip = view.tooltip();
    let tooltip_row = tooltip.as_ref().map(|t| MonthGrid::row_of(t.cell_index));
    let tooltip_lines = tooltip
        .as_ref()
        .map(|t| render_tooltip(t, mode, zones))
        .unwrap_or_default();

    let cells = view.cells();
    for (row, week) in cells.chunks(WEEKDAY_LABELS.len()).enumerate() {
        let above = tooltip.as_ref().is_some_and(|t| t.above);
        if tooltip_row == Some(row) && above {
            lines.extend(tooltip_lines.iter().cloned());
        }

        let line: String = week.iter().map(render_cell).collect();
        lines.push(line.trim_end().to_string());

        if tooltip_row == Some(row) && !above {
            lines.extend(tooltip_lines.iter().cloned());
        }
    }

    let total = view.buckets().event_count();
    lines.push(
        format!("{total} {} this month", pluralize("event", total))
            .dimmed()
            .to_string(),
    );

    lines.join("\n")
}

/// Detail panel for the selected day, if one is selected.
pub fn render_day_panel<C: Clock>(view: &CalendarView<'_, C>) -> Option<String> {
    let day = view.selected()?;
    let month = view.month();
    let date = month.first_day().with_day(day)?;

    let mut lines = vec![date.format("%A, %B %-d").to_string().bold().to_string()];
    for event in view.selected_events() {
        lines.push(String::new());
        lines.push(render_card(event, view.mode(), view.zones()));
    }
    Some(lines.join("\n"))
}

/// One event card, indented by three spaces.
pub fn render_card(event: &Event, mode: TimeZoneMode, zones: &DisplayZones) -> String {
    let mut lines = vec![format!(
        "   {} {} {}",
        paint_category(event.category, event.category.icon()),
        event.title.bold(),
        event.status.render()
    )];

    lines.push(format!(
        "      🕐 {} {}",
        format_instant(event.start_time, mode, zones),
        time_label(mode, zones).dimmed()
    ));

    if let Some(location) = event.location.as_deref().filter(|l| !l.is_empty()) {
        lines.push(format!("      📍 {location}"));
    }

    let author = event.author_username.as_deref().unwrap_or("Unknown");
    match event.author_role {
        Some(role) => lines.push(format!("      👤 {author} {}", format!("({role})").dimmed())),
        None => lines.push(format!("      👤 {author}")),
    }

    if let Some(description) = event.description.as_deref().filter(|d| !d.is_empty()) {
        for line in description.lines() {
            lines.push(format!("      {}", line.dimmed()));
        }
    }

    lines.push(format!("      {}", format!("id: {}", event.id).dimmed()));
    lines.join("\n")
}
