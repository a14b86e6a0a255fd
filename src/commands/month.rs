use anyhow::Result;
use chrono::{Datelike, Utc};
use owo_colors::OwoColorize;

use kith_core::month_grid::{parse_month, MonthGrid};
use kith_core::recurrence::expand_events;

use crate::commands::open_store;

static WEEKDAY_HEADER: &str = " Su  Mo  Tu  We  Th  Fr  Sa";

static MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

pub fn run(month: Option<&str>, token: &str) -> Result<()> {
    let store = open_store()?;
    let user = store.session_user(token)?;

    let (year, month) = match month {
        Some(raw) => parse_month(raw)?,
        None => {
            let today = Utc::now().date_naive();
            (today.year(), today.month())
        }
    };

    let grid = MonthGrid::new(year, month)?;
    let events = store.events_visible_to(&user.id)?;
    let occurrences = expand_events(&events, &grid.days());

    println!(
        "{} {}\n",
        MONTH_NAMES[(month - 1) as usize].bold(),
        year.bold()
    );
    println!("{}", WEEKDAY_HEADER.dimmed());

    for week in grid.weeks() {
        let mut row = String::new();
        for cell in week {
            match cell {
                Some(date) if occurrences.contains_key(date) => {
                    let day = format!("{:>2}", date.day());
                    row.push_str(&format!(" {}{}", day.green().bold(), "*".green()));
                }
                Some(date) => row.push_str(&format!(" {:>2} ", date.day())),
                None => row.push_str("    "),
            }
        }
        println!("{}", row);
    }

    let mut listed = false;
    for (date, events) in &occurrences {
        for event in events {
            if !listed {
                println!();
                listed = true;
            }
            let time = event
                .start_time
                .map(|t| t.format("%H:%M").to_string())
                .unwrap_or_else(|| "all day".to_string());
            println!(
                "  {}  {} {}",
                date.format("%b %d"),
                event.title.green(),
                time.dimmed()
            );
        }
    }

    if occurrences.is_empty() {
        println!("\nNo events this month.");
    }

    Ok(())
}
