use anyhow::Result;
use clancal_core::calendar::{CalendarView, MonthStep, YearMonth};
use clancal_core::clock::{Clock, SystemClock};
use clancal_core::filter::EventFilter;
use clancal_core::timefmt::time_label;
use dialoguer::{Input, Select};
use owo_colors::OwoColorize;

use crate::commands::list::FilterArgs;
use crate::context::AppContext;
use crate::render::{render_day_panel, render_month};
use crate::utils::tui::{is_interactive, with_spinner};

/// Menu entries of the interactive month view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuEntry {
    Prev,
    Next,
    Select,
    Peek,
    ToggleZone,
    Quit,
}

const MENU: [MenuEntry; 6] = [
    MenuEntry::Prev,
    MenuEntry::Next,
    MenuEntry::Select,
    MenuEntry::Peek,
    MenuEntry::ToggleZone,
    MenuEntry::Quit,
];

/// A resolved user action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MonthAction {
    Step(MonthStep),
    Select(u32),
    Peek(u32),
    ToggleZone,
    Quit,
}

#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Notice(String),
    Quit,
}

pub async fn run(
    ctx: &AppContext,
    month: Option<YearMonth>,
    filter: FilterArgs,
    once: bool,
) -> Result<()> {
    let events = with_spinner("Loading events...", ctx.actions.list()).await?;
    let events = EventFilter::from(filter).apply(&events);

    let mut view = CalendarView::new(&events, &ctx.zones, SystemClock, ctx.mode);
    if let Some(month) = month {
        view.show_month(month);
    }

    if once || !is_interactive() {
        println!("{}", render_month(&view));
        return Ok(());
    }

    loop {
        println!("{}", render_month(&view));
        if let Some(panel) = render_day_panel(&view) {
            println!();
            println!("{panel}");
        }
        println!();

        let action = prompt_action(&view)?;
        match apply(&mut view, action) {
            Flow::Continue => {}
            Flow::Notice(message) => eprintln!("  {}", message.red()),
            Flow::Quit => break,
        }
        println!();
    }

    Ok(())
}

fn menu_label<C: Clock>(entry: MenuEntry, view: &CalendarView<'_, C>) -> String {
    match entry {
        MenuEntry::Prev => format!("◀ {}", view.month().step(MonthStep::Prev)),
        MenuEntry::Next => format!("{} ▶", view.month().step(MonthStep::Next)),
        MenuEntry::Select => "Open a day".to_string(),
        MenuEntry::Peek => "Peek at a day".to_string(),
        MenuEntry::ToggleZone => format!(
            "Show {} time",
            time_label(view.mode().toggled(), view.zones())
        ),
        MenuEntry::Quit => "Quit".to_string(),
    }
}

fn prompt_action<C: Clock>(view: &CalendarView<'_, C>) -> Result<MonthAction> {
    let items: Vec<String> = MENU.iter().map(|e| menu_label(*e, view)).collect();
    let choice = Select::new()
        .items(&items)
        .default(1)
        .interact()?;

    Ok(match MENU[choice] {
        MenuEntry::Prev => MonthAction::Step(MonthStep::Prev),
        MenuEntry::Next => MonthAction::Step(MonthStep::Next),
        MenuEntry::Select => MonthAction::Select(prompt_day(view.month())?),
        MenuEntry::Peek => MonthAction::Peek(prompt_day(view.month())?),
        MenuEntry::ToggleZone => MonthAction::ToggleZone,
        MenuEntry::Quit => MonthAction::Quit,
    })
}

fn prompt_day(month: YearMonth) -> Result<u32> {
    let last = month.days_in_month();
    let day = Input::<u32>::new()
        .with_prompt(format!("  Day (1-{last})"))
        .validate_with(|day: &u32| -> Result<(), String> {
            if (1..=last).contains(day) {
                Ok(())
            } else {
                Err(format!("{} has {last} days", month.name()))
            }
        })
        .interact_text()?;
    Ok(day)
}

/// Apply one action to the view. A peek lasts until the next action.
fn apply<C: Clock>(view: &mut CalendarView<'_, C>, action: MonthAction) -> Flow {
    view.clear_hover();

    match action {
        MonthAction::Step(step) => view.shift_month(step),
        MonthAction::Select(day) => {
            if !view.select_day(day) {
                return Flow::Notice(format!("No events on {} {day}", view.month().name()));
            }
        }
        MonthAction::Peek(day) => {
            if !view.buckets().has_events(day) {
                return Flow::Notice(format!("No events on {} {day}", view.month().name()));
            }
            view.hover_day(day);
        }
        MonthAction::ToggleZone => view.set_mode(view.mode().toggled()),
        MonthAction::Quit => return Flow::Quit,
    }

    Flow::Continue
}
